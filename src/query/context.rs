//! Semantic context query: for one symbol, its callers,
//! callees, affected tests, and same-kind same-directory siblings; for
//! several symbols, the union of callers/callees filtered to those shared
//! by at least two of them.

use std::collections::HashMap;

use super::{affected_tests, Corpus};
use crate::graph::Graph;
use crate::types::{EdgeKind, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub symbol_id: SymbolId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default)]
pub struct SemanticContext {
    pub callers: Vec<Neighbor>,
    pub callees: Vec<Neighbor>,
    pub tests: Vec<SymbolId>,
    pub siblings: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    pub shared_callers: Vec<(SymbolId, usize)>,
    pub shared_callees: Vec<(SymbolId, usize)>,
}

/// De-duplicate edges per neighbor, keeping the highest-priority edge kind
/// (lowest `EdgeKind::priority()`) when multiple edges connect the same pair.
fn dedupe_by_priority(edges: impl Iterator<Item = (SymbolId, EdgeKind)>) -> Vec<Neighbor> {
    let mut best: HashMap<SymbolId, EdgeKind> = HashMap::new();
    for (neighbor, kind) in edges {
        best.entry(neighbor)
            .and_modify(|existing| {
                if kind.priority() < existing.priority() {
                    *existing = kind;
                }
            })
            .or_insert(kind);
    }
    let mut out: Vec<Neighbor> = best.into_iter().map(|(symbol_id, kind)| Neighbor { symbol_id, kind }).collect();
    out.sort_by_key(|n| n.symbol_id.value());
    out
}

pub fn run(corpus: &Corpus, graph: &Graph, symbol_id: SymbolId, sibling_limit: usize) -> SemanticContext {
    let callers = dedupe_by_priority(
        corpus.incoming_edges(symbol_id).iter().map(|e| (e.source_id, e.kind)),
    );
    let callees = dedupe_by_priority(
        corpus.outgoing_edges(symbol_id).iter().map(|e| (e.target_id, e.kind)),
    );

    let tests = affected_tests::run(corpus, graph, &[symbol_id]).test_symbol_ids;

    let siblings = match corpus.symbols.get(&symbol_id) {
        Some(symbol) => {
            let Some(dir) = corpus.file_path(symbol.file_id).map(dir_of) else { return SemanticContext { callers, callees, tests, siblings: Vec::new() } };
            let mut found: Vec<SymbolId> = corpus
                .symbols
                .values()
                .filter(|s| s.id != symbol_id && s.kind == symbol.kind)
                .filter(|s| corpus.file_path(s.file_id).map(dir_of) == Some(dir))
                .map(|s| s.id)
                .collect();
            found.sort_by_key(|id| id.value());
            found.truncate(sibling_limit);
            found
        }
        None => Vec::new(),
    };

    SemanticContext { callers, callees, tests, siblings }
}

/// Union callers/callees across `symbol_ids`, keeping only those referenced
/// by at least 2 of the queried symbols, sorted by share count descending.
pub fn run_shared(corpus: &Corpus, symbol_ids: &[SymbolId]) -> SharedContext {
    let mut caller_counts: HashMap<SymbolId, usize> = HashMap::new();
    let mut callee_counts: HashMap<SymbolId, usize> = HashMap::new();

    for &symbol_id in symbol_ids {
        let callers: std::collections::HashSet<SymbolId> =
            corpus.incoming_edges(symbol_id).iter().map(|e| e.source_id).collect();
        for caller in callers {
            *caller_counts.entry(caller).or_insert(0) += 1;
        }
        let callees: std::collections::HashSet<SymbolId> =
            corpus.outgoing_edges(symbol_id).iter().map(|e| e.target_id).collect();
        for callee in callees {
            *callee_counts.entry(callee).or_insert(0) += 1;
        }
    }

    let mut shared_callers: Vec<(SymbolId, usize)> =
        caller_counts.into_iter().filter(|&(_, count)| count >= 2).collect();
    shared_callers.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.value().cmp(&b.0.value())));

    let mut shared_callees: Vec<(SymbolId, usize)> =
        callee_counts.into_iter().filter(|&(_, count)| count >= 2).collect();
    shared_callees.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.value().cmp(&b.0.value())));

    SharedContext { shared_callers, shared_callees }
}

fn dir_of(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}
