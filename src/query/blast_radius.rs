//! Blast radius query.

use std::collections::HashSet;

use petgraph::Direction;
use serde::Serialize;

use super::Corpus;
use crate::graph::Graph;
use crate::types::SymbolId;

const MAX_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BlastRadius {
    pub reachable_symbol_count: usize,
    pub distinct_file_count: usize,
}

/// Reverse BFS from every symbol in `changed` to depth <= 10, excluding the
/// changed set itself from the result.
pub fn run(corpus: &Corpus, graph: &Graph, changed: &[SymbolId]) -> BlastRadius {
    let changed_set: HashSet<SymbolId> = changed.iter().copied().collect();
    let mut reached: HashSet<SymbolId> = HashSet::new();

    for &start in changed {
        for (symbol_id, _depth) in graph.bfs(start, Direction::Incoming, MAX_DEPTH) {
            if !changed_set.contains(&symbol_id) {
                reached.insert(symbol_id);
            }
        }
    }

    let distinct_files: HashSet<_> = reached
        .iter()
        .filter_map(|id| corpus.symbols.get(id).map(|s| s.file_id))
        .collect();

    BlastRadius { reachable_symbol_count: reached.len(), distinct_file_count: distinct_files.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_blast_radius_excludes_changed_set() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(2), EdgeKind::Call, 1);

        let corpus = super::super::tests_support::empty_corpus();
        let radius = run(&corpus, &graph, &[sid(2)]);
        assert_eq!(radius.reachable_symbol_count, 2);
    }
}
