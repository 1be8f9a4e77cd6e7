//! Breaking changes query.

use super::Corpus;
use crate::types::{FileId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Breaking,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breaking => "BREAKING",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }

    fn from_consumer_count(count: usize) -> Self {
        if count >= 10 {
            Self::Breaking
        } else if count >= 4 {
            Self::Warning
        } else {
            Self::Info
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakingChange {
    pub symbol_id: SymbolId,
    pub consumer_count: usize,
    pub severity: Severity,
}

/// Exported symbols in `changed_files` whose `target_id` appears as the
/// target of at least one edge.
pub fn run(corpus: &Corpus, changed_files: &[FileId]) -> Vec<BreakingChange> {
    let changed: std::collections::HashSet<FileId> = changed_files.iter().copied().collect();

    let mut results: Vec<BreakingChange> = corpus
        .symbols
        .values()
        .filter(|s| s.is_exported && changed.contains(&s.file_id))
        .filter_map(|s| {
            let consumer_count = corpus.incoming_edges(s.id).len();
            if consumer_count == 0 {
                return None;
            }
            Some(BreakingChange {
                symbol_id: s.id,
                consumer_count,
                severity: Severity::from_consumer_count(consumer_count),
            })
        })
        .collect();

    results.sort_by(|a, b| b.consumer_count.cmp(&a.consumer_count).then(a.symbol_id.value().cmp(&b.symbol_id.value())));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, File, Symbol};
    use crate::types::{EdgeId, EdgeKind, FileRole, LineSpan, SymbolKind, Visibility};

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }
    fn fid(n: u64) -> FileId {
        FileId::new(n).unwrap()
    }

    fn symbol(id: u64, file_id: u64, exported: bool) -> Symbol {
        Symbol {
            id: sid(id),
            file_id: fid(file_id),
            name: "foo".into(),
            qualified_name: "crate::foo".into(),
            kind: SymbolKind::Function,
            signature: None,
            span: LineSpan::new(1, 1),
            docstring: None,
            visibility: Visibility::Public,
            is_exported: exported,
            parent_name: None,
            default_value: None,
        }
    }

    #[test]
    fn test_unreferenced_exported_symbol_not_breaking() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.files.insert(fid(1), File { id: fid(1), path: "src/a.rs".into(), language: None, line_count: 1, file_role: FileRole::Source, content_hash: None });
        corpus.symbols.insert(sid(1), symbol(1, 1, true));
        let result = run(&corpus, &[fid(1)]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_ten_consumers_is_breaking_severity() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.files.insert(fid(1), File { id: fid(1), path: "src/a.rs".into(), language: None, line_count: 1, file_role: FileRole::Source, content_hash: None });
        corpus.symbols.insert(sid(1), symbol(1, 1, true));
        let edges: Vec<Edge> = (0..10)
            .map(|i| Edge { id: EdgeId::new(i + 2).unwrap(), source_id: sid(i + 100), target_id: sid(1), kind: EdgeKind::Call, line: 1 })
            .collect();
        corpus.incoming.insert(sid(1), edges.clone());
        corpus.edges.extend(edges);

        let result = run(&corpus, &[fid(1)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].severity, Severity::Breaking);
    }
}
