//! Coverage gaps query.

use super::Corpus;
use crate::types::{SymbolId, SymbolKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageGap {
    pub symbol_id: SymbolId,
    pub score: f64,
}

/// Over all exported `function/class/method/interface` symbols not in test
/// files, compute `score` and report those with zero test-caller count,
/// ordered descending by score.
pub fn run(corpus: &Corpus, test_caller_counts: &std::collections::HashMap<SymbolId, usize>) -> Vec<CoverageGap> {
    let mut gaps: Vec<CoverageGap> = corpus
        .symbols
        .values()
        .filter(|s| {
            s.is_exported
                && matches!(s.kind, SymbolKind::Function | SymbolKind::Class | SymbolKind::Method | SymbolKind::Interface)
                && !corpus.is_test_file(s.file_id)
        })
        .filter(|s| test_caller_counts.get(&s.id).copied().unwrap_or(0) == 0)
        .map(|s| {
            let pagerank = corpus.graph_metrics.get(&s.id).map(|m| m.pagerank).unwrap_or(0.0);
            let in_degree = corpus.graph_metrics.get(&s.id).map(|m| m.in_degree).unwrap_or(0).max(1) as f64;
            let complexity = corpus
                .symbol_metrics
                .get(&s.id)
                .map(|m| m.cognitive_complexity)
                .unwrap_or(0)
                .max(1) as f64;
            let raw = pagerank * 10_000.0 * complexity * in_degree * 0.001;
            let score = (raw * 1000.0).round() / 1000.0;
            CoverageGap { symbol_id: s.id, score }
        })
        .collect();

    gaps.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphMetrics, Symbol};
    use crate::types::{FileId, LineSpan, Visibility};
    use std::collections::HashMap;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    fn symbol(id: u64) -> Symbol {
        Symbol {
            id: sid(id),
            file_id: FileId::new(1).unwrap(),
            name: "foo".into(),
            qualified_name: "crate::foo".into(),
            kind: SymbolKind::Function,
            signature: None,
            span: LineSpan::new(1, 1),
            docstring: None,
            visibility: Visibility::Public,
            is_exported: true,
            parent_name: None,
            default_value: None,
        }
    }

    #[test]
    fn test_zero_callers_is_a_gap() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.symbols.insert(sid(1), symbol(1));
        corpus.graph_metrics.insert(sid(1), GraphMetrics { symbol_id: sid(1), pagerank: 0.01, in_degree: 3, out_degree: 0, betweenness: 0.0 });
        let result = run(&corpus, &HashMap::new());
        assert_eq!(result.len(), 1);
        assert!(result[0].score > 0.0);
    }

    #[test]
    fn test_nonzero_callers_excluded() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.symbols.insert(sid(1), symbol(1));
        let mut counts = HashMap::new();
        counts.insert(sid(1), 2usize);
        let result = run(&corpus, &counts);
        assert!(result.is_empty());
    }
}
