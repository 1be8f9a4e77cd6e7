//! Affected tests query.

use std::collections::HashSet;

use petgraph::Direction;

use super::Corpus;
use crate::graph::Graph;
use crate::types::{FileId, SymbolId};

const MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffectedTests {
    pub test_symbol_ids: Vec<SymbolId>,
    pub colocated_test_files: Vec<FileId>,
}

/// Reverse BFS from every changed symbol to depth <= 8, intersected with
/// symbols living in test files, unioned with colocated test files (test
/// files sharing a directory with any changed file).
pub fn run(corpus: &Corpus, graph: &Graph, changed: &[SymbolId]) -> AffectedTests {
    let mut reached: HashSet<SymbolId> = HashSet::new();
    for &start in changed {
        for (symbol_id, _depth) in graph.bfs(start, Direction::Incoming, MAX_DEPTH) {
            reached.insert(symbol_id);
        }
    }

    let test_symbol_ids: Vec<SymbolId> = reached
        .into_iter()
        .filter(|id| corpus.symbols.get(id).map(|s| corpus.is_test_file(s.file_id)).unwrap_or(false))
        .collect();

    let changed_dirs: HashSet<&str> = changed
        .iter()
        .filter_map(|id| corpus.symbols.get(id))
        .filter_map(|s| corpus.file_path(s.file_id))
        .map(dir_of)
        .collect();

    let colocated_test_files: Vec<FileId> = corpus
        .files
        .values()
        .filter(|f| f.file_role == crate::types::FileRole::Test && changed_dirs.contains(dir_of(&f.path)))
        .map(|f| f.id)
        .collect();

    AffectedTests { test_symbol_ids, colocated_test_files }
}

fn dir_of(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::File;
    use crate::types::{EdgeKind, FileRole};
    use std::collections::HashMap;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_colocated_test_file_included_even_without_edge() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.files.insert(
            FileId::new(1).unwrap(),
            File { id: FileId::new(1).unwrap(), path: "src/a.rs".into(), language: None, line_count: 1, file_role: FileRole::Source, content_hash: None },
        );
        corpus.files.insert(
            FileId::new(2).unwrap(),
            File { id: FileId::new(2).unwrap(), path: "src/a_test.rs".into(), language: None, line_count: 1, file_role: FileRole::Test, content_hash: None },
        );
        let mut sym_files: HashMap<SymbolId, FileId> = HashMap::new();
        sym_files.insert(sid(1), FileId::new(1).unwrap());
        for (id, file_id) in sym_files {
            corpus.symbols.insert(
                id,
                crate::model::Symbol {
                    id,
                    file_id,
                    name: "x".into(),
                    qualified_name: "x".into(),
                    kind: crate::types::SymbolKind::Function,
                    signature: None,
                    span: crate::types::LineSpan::new(1, 1),
                    docstring: None,
                    visibility: crate::types::Visibility::Public,
                    is_exported: true,
                    parent_name: None,
                    default_value: None,
                },
            );
        }

        let graph = Graph::build([sid(1)], &[]);
        let result = run(&corpus, &graph, &[sid(1)]);
        assert_eq!(result.colocated_test_files, vec![FileId::new(2).unwrap()]);
    }

    #[test]
    fn test_reverse_reachable_test_symbol_included() {
        let mut graph = Graph::new();
        graph.add_edge(sid(2), sid(1), EdgeKind::Call, 1);

        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.files.insert(
            FileId::new(1).unwrap(),
            File { id: FileId::new(1).unwrap(), path: "src/a_test.rs".into(), language: None, line_count: 1, file_role: FileRole::Test, content_hash: None },
        );
        corpus.symbols.insert(
            sid(2),
            crate::model::Symbol {
                id: sid(2),
                file_id: FileId::new(1).unwrap(),
                name: "test_it".into(),
                qualified_name: "test_it".into(),
                kind: crate::types::SymbolKind::Function,
                signature: None,
                span: crate::types::LineSpan::new(1, 1),
                docstring: None,
                visibility: crate::types::Visibility::Public,
                is_exported: true,
                parent_name: None,
                default_value: None,
            },
        );

        let result = run(&corpus, &graph, &[sid(1)]);
        assert_eq!(result.test_symbol_ids, vec![sid(2)]);
    }
}
