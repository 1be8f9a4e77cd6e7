//! PR risk query: a composite score over blast radius,
//! breaking changes, untested exports, and worst-case complexity among a
//! changed set.

use super::{blast_radius, breaking_changes, Corpus};
use crate::graph::Graph;
use crate::types::{FileId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Critical,
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    fn from_score(score: f64) -> Self {
        if score > 0.7 {
            Self::Critical
        } else if score > 0.5 {
            Self::High
        } else if score > 0.25 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrRisk {
    pub score: f64,
    pub level: Level,
    pub blast_radius: usize,
    pub breaking_change_count: usize,
    pub untested_export_count: usize,
    pub max_complexity: u32,
    pub file_count: usize,
}

/// `0.3*min(1,blast/50) + 0.25*min(1,breaking/10) + 0.2*min(1,untested/10)
/// + 0.15*min(1,complex/5) + (0.1 if files>10 else files/100)`.
pub fn run(corpus: &Corpus, graph: &Graph, changed_symbols: &[SymbolId], changed_files: &[FileId]) -> PrRisk {
    let radius = blast_radius::run(corpus, graph, changed_symbols);
    let breaking = breaking_changes::run(corpus, changed_files);

    let changed_file_set: std::collections::HashSet<FileId> = changed_files.iter().copied().collect();
    let untested_export_count = corpus
        .symbols
        .values()
        .filter(|s| s.is_exported && changed_file_set.contains(&s.file_id))
        .filter(|s| !corpus.is_test_file(s.file_id))
        .filter(|s| corpus.incoming_edges(s.id).iter().all(|e| !corpus.is_test_file(corpus.symbols.get(&e.source_id).map(|caller| caller.file_id).unwrap_or(s.file_id))))
        .count();

    let max_complexity = changed_symbols
        .iter()
        .filter_map(|id| corpus.symbol_metrics.get(id))
        .map(|m| m.cognitive_complexity)
        .max()
        .unwrap_or(0);

    let file_count = changed_files.len();
    let file_term = if file_count > 10 { 0.1 } else { file_count as f64 / 100.0 };

    let score = 0.3 * (radius.reachable_symbol_count as f64 / 50.0).min(1.0)
        + 0.25 * (breaking.len() as f64 / 10.0).min(1.0)
        + 0.2 * (untested_export_count as f64 / 10.0).min(1.0)
        + 0.15 * (max_complexity as f64 / 5.0).min(1.0)
        + file_term;

    PrRisk {
        score,
        level: Level::from_score(score),
        blast_radius: radius.reachable_symbol_count,
        breaking_change_count: breaking.len(),
        untested_export_count,
        max_complexity,
        file_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_change_is_low_risk() {
        let corpus = super::super::tests_support::empty_corpus();
        let graph = Graph::new();
        let risk = run(&corpus, &graph, &[], &[]);
        assert_eq!(risk.score, 0.0);
        assert_eq!(risk.level, Level::Low);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(Level::from_score(0.9), Level::Critical);
        assert_eq!(Level::from_score(0.6), Level::High);
        assert_eq!(Level::from_score(0.3), Level::Medium);
        assert_eq!(Level::from_score(0.1), Level::Low);
    }

    #[test]
    fn test_file_term_caps_above_ten_files() {
        let corpus = super::super::tests_support::empty_corpus();
        let graph = Graph::new();
        let files: Vec<FileId> = (1..=15).map(|n| FileId::new(n).unwrap()).collect();
        let risk = run(&corpus, &graph, &[], &files);
        assert_eq!(risk.file_count, 15);
        assert!((risk.score - 0.1).abs() < 1e-9);
    }
}
