//! Dead code query.

use std::collections::{HashMap, HashSet};

use super::Corpus;
use crate::types::{EdgeKind, SymbolId, SymbolKind};

const EXCLUDED_NAMES: &[&str] = &["__init__", "__main__", "main", "setup", "teardown"];

#[derive(Debug, Clone, PartialEq)]
pub struct DeadCodeCandidate {
    pub symbol_id: SymbolId,
    pub confidence: u8,
    pub decay_score: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DeadCodeResult {
    pub candidates: Vec<DeadCodeCandidate>,
    pub dead_clusters: Vec<Vec<SymbolId>>,
}

pub struct Options {
    pub include_all: bool,
    /// `(symbol_id, age_days)` pairs for decay-score computation; omitted
    /// symbols get `decay_score = None`.
    pub age_days: HashMap<SymbolId, f64>,
}

impl Default for Options {
    fn default() -> Self {
        Self { include_all: false, age_days: HashMap::new() }
    }
}

fn is_excluded_name(name: &str) -> bool {
    EXCLUDED_NAMES.contains(&name) || name.starts_with('_') || name.starts_with("test_") || name.starts_with("Test")
}

pub fn run(corpus: &Corpus, options: &Options) -> DeadCodeResult {
    let mut candidates = Vec::new();

    for (&symbol_id, symbol) in &corpus.symbols {
        if !symbol.is_exported {
            continue;
        }
        if !matches!(symbol.kind, SymbolKind::Function | SymbolKind::Class | SymbolKind::Method) {
            continue;
        }

        if !options.include_all {
            if corpus.is_test_file(symbol.file_id) {
                continue;
            }
            if is_excluded_name(&symbol.name) {
                continue;
            }
        }

        let incoming = corpus.incoming_edges(symbol_id);
        if !incoming.is_empty() && incoming.iter().any(|e| e.kind != EdgeKind::Import) {
            continue;
        }

        let shares_name = corpus
            .by_name
            .get(&symbol.name.to_ascii_lowercase())
            .map(|ids| ids.len() > 1)
            .unwrap_or(false);

        let confidence: u8 = if incoming.is_empty() && !shares_name {
            100
        } else if incoming.is_empty() && shares_name {
            70
        } else if !incoming.is_empty() && incoming.iter().all(|e| e.kind == EdgeKind::Import) {
            80
        } else {
            60
        };

        let decay_score = options.age_days.get(&symbol_id).map(|&age_days| {
            (age_days / 365.0) * symbol.span.len() as f64 * confidence as f64 / 100.0
        });

        candidates.push(DeadCodeCandidate { symbol_id, confidence, decay_score });
    }

    let dead_ids: HashSet<SymbolId> = candidates.iter().map(|c| c.symbol_id).collect();
    let dead_clusters = connected_components(corpus, &dead_ids);

    DeadCodeResult { candidates, dead_clusters }
}

/// Connected components of the undirected sub-graph induced on dead
/// candidates, keeping components of size >= 2.
fn connected_components(corpus: &Corpus, dead_ids: &HashSet<SymbolId>) -> Vec<Vec<SymbolId>> {
    let mut adjacency: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
    for edge in &corpus.edges {
        if dead_ids.contains(&edge.source_id) && dead_ids.contains(&edge.target_id) {
            adjacency.entry(edge.source_id).or_default().push(edge.target_id);
            adjacency.entry(edge.target_id).or_default().push(edge.source_id);
        }
    }

    let mut visited = HashSet::new();
    let mut components = Vec::new();

    for &id in dead_ids {
        if visited.contains(&id) {
            continue;
        }
        let mut stack = vec![id];
        let mut component = Vec::new();
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            component.push(node);
            for &neighbor in adjacency.get(&node).unwrap_or(&Vec::new()) {
                if !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        if component.len() >= 2 {
            components.push(component);
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, File, Symbol};
    use crate::types::{EdgeId, FileId, FileRole, LineSpan, Visibility};

    fn file(id: u64, path: &str, role: FileRole) -> File {
        File { id: FileId::new(id).unwrap(), path: path.into(), language: None, line_count: 10, file_role: role, content_hash: None }
    }

    fn symbol(id: u64, file_id: u64, name: &str, kind: SymbolKind, exported: bool) -> Symbol {
        Symbol {
            id: SymbolId::new(id).unwrap(),
            file_id: FileId::new(file_id).unwrap(),
            name: name.into(),
            qualified_name: format!("crate::{name}"),
            kind,
            signature: None,
            span: LineSpan::new(1, 10),
            docstring: None,
            visibility: Visibility::Public,
            is_exported: exported,
            parent_name: None,
            default_value: None,
        }
    }

    fn empty_corpus() -> Corpus {
        Corpus {
            files: HashMap::new(),
            symbols: HashMap::new(),
            edges: Vec::new(),
            graph_metrics: HashMap::new(),
            symbol_metrics: HashMap::new(),
            git_cochange: Vec::new(),
            incoming: HashMap::new(),
            outgoing: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    #[test]
    fn test_unreferenced_unique_name_has_confidence_100() {
        let mut corpus = empty_corpus();
        corpus.files.insert(FileId::new(1).unwrap(), file(1, "src/lib.rs", FileRole::Source));
        let sym = symbol(1, 1, "unused_fn", SymbolKind::Function, true);
        corpus.by_name.insert("unused_fn".into(), vec![sym.id]);
        corpus.symbols.insert(sym.id, sym);

        let result = run(&corpus, &Options::default());
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].confidence, 100);
    }

    #[test]
    fn test_shared_name_drops_confidence_to_70() {
        let mut corpus = empty_corpus();
        corpus.files.insert(FileId::new(1).unwrap(), file(1, "src/lib.rs", FileRole::Source));
        corpus.files.insert(FileId::new(2).unwrap(), file(2, "src/other.rs", FileRole::Source));
        let sym1 = symbol(1, 1, "run", SymbolKind::Function, true);
        let sym2 = symbol(2, 2, "run", SymbolKind::Function, true);
        corpus.by_name.insert("run".into(), vec![sym1.id, sym2.id]);
        corpus.symbols.insert(sym1.id, sym1);
        corpus.symbols.insert(sym2.id, sym2);

        let result = run(&corpus, &Options::default());
        assert!(result.candidates.iter().all(|c| c.confidence == 70));
    }

    #[test]
    fn test_import_only_incoming_has_confidence_80() {
        let mut corpus = empty_corpus();
        corpus.files.insert(FileId::new(1).unwrap(), file(1, "src/lib.rs", FileRole::Source));
        corpus.files.insert(FileId::new(2).unwrap(), file(2, "src/other.rs", FileRole::Source));
        let caller = symbol(2, 2, "caller", SymbolKind::Function, true);
        let target = symbol(1, 1, "helper", SymbolKind::Function, true);
        corpus.by_name.insert("helper".into(), vec![target.id]);
        corpus.by_name.insert("caller".into(), vec![caller.id]);
        let edge = Edge { id: EdgeId::new(1).unwrap(), source_id: caller.id, target_id: target.id, kind: EdgeKind::Import, line: 1 };
        corpus.incoming.insert(target.id, vec![edge]);
        corpus.edges.push(edge);
        corpus.symbols.insert(target.id, target);
        corpus.symbols.insert(caller.id, caller);

        let result = run(&corpus, &Options::default());
        let helper = result.candidates.iter().find(|c| c.symbol_id == SymbolId::new(1).unwrap()).unwrap();
        assert_eq!(helper.confidence, 80);
    }

    #[test]
    fn test_called_symbol_excluded() {
        let mut corpus = empty_corpus();
        corpus.files.insert(FileId::new(1).unwrap(), file(1, "src/lib.rs", FileRole::Source));
        let target = symbol(1, 1, "helper", SymbolKind::Function, true);
        let edge = Edge { id: EdgeId::new(1).unwrap(), source_id: target.id, target_id: target.id, kind: EdgeKind::Call, line: 1 };
        corpus.incoming.insert(target.id, vec![edge]);
        corpus.symbols.insert(target.id, target);

        let result = run(&corpus, &Options::default());
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_underscore_prefixed_name_excluded_by_default() {
        let mut corpus = empty_corpus();
        corpus.files.insert(FileId::new(1).unwrap(), file(1, "src/lib.rs", FileRole::Source));
        let sym = symbol(1, 1, "_private_helper", SymbolKind::Function, true);
        corpus.symbols.insert(sym.id, sym);

        let result = run(&corpus, &Options::default());
        assert!(result.candidates.is_empty());
    }
}
