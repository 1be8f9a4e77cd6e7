//! HealthEngine: a composite 0-100 score by multiplicative
//! decay, plus cycle/god-component/bottleneck findings with severity
//! classification and cycle-break suggestions.
//!
//! Read-only over a `Corpus`, exactly like `QueryEngine`: it
//! recomputes layers/SCCs from a freshly built `Graph` rather than reading
//! persisted tables that don't exist for them (only `graph_metrics` and
//! `clusters` are persisted ; layers and layer violations are
//! derived values, same as blast radius's BFS).

use std::collections::HashMap;

use crate::analytics::{layers, scc};
use crate::classifier::is_utility_path;
use crate::graph::Graph;
use crate::query::Corpus;
use crate::types::SymbolId;

const GOD_CRITICAL_DEGREE: u32 = 50;
const GOD_WARNING_DEGREE: u32 = 30;
const UTILITY_THRESHOLD_MULTIPLIER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CycleFinding {
    pub members: Vec<SymbolId>,
    pub severity: Severity,
    pub suggestion: Option<scc::WeakestEdge>,
}

#[derive(Debug, Clone, Copy)]
pub struct GodComponentFinding {
    pub symbol_id: SymbolId,
    pub degree: u32,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy)]
pub struct BottleneckFinding {
    pub symbol_id: SymbolId,
    pub betweenness: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub score: f64,
    pub tangle_ratio: f64,
    pub cycles: Vec<CycleFinding>,
    pub god_components: Vec<GodComponentFinding>,
    pub bottlenecks: Vec<BottleneckFinding>,
    pub layer_violation_count: usize,
}

/// `avg_file_health` is the mean of `FileStats.health_score` across the
/// corpus, on a 0-100 scale; pass `None` when no file-stats rows exist yet
/// (e.g. no git history ingested). Absence is treated as neutral (10/10),
/// not zero, so an otherwise-clean codebase with no churn history still
/// clears the "no findings -> >=80" bound.
pub fn run(corpus: &Corpus, graph: &Graph, avg_file_health: Option<f64>) -> HealthReport {
    let pagerank: HashMap<SymbolId, f64> = corpus.graph_metrics.iter().map(|(id, m)| (*id, m.pagerank)).collect();

    let sccs = scc::find_sccs(graph);
    let mut tangled_symbols = 0usize;
    let mut cycles = Vec::new();
    for members in sccs {
        if members.len() < 2 {
            continue;
        }
        tangled_symbols += members.len();

        let dirs: std::collections::HashSet<&str> = members
            .iter()
            .filter_map(|id| corpus.symbols.get(id))
            .filter_map(|s| corpus.file_path(s.file_id))
            .map(dir_of)
            .collect();
        let files: std::collections::HashSet<_> =
            members.iter().filter_map(|id| corpus.symbols.get(id)).map(|s| s.file_id).collect();

        let severity = if dirs.len() <= 1 {
            Severity::Info
        } else if files.len() > 3 {
            Severity::Critical
        } else {
            Severity::Warning
        };

        let suggestion = if members.len() >= 3 { scc::weakest_edge(graph, &members, &pagerank) } else { None };
        cycles.push(CycleFinding { members, severity, suggestion });
    }

    let total_symbols = corpus.symbols.len().max(1);
    let tangle_ratio = (tangled_symbols as f64 / total_symbols as f64) * 100.0;

    let mut god_components = Vec::new();
    for (symbol_id, metrics) in &corpus.graph_metrics {
        let degree = metrics.in_degree + metrics.out_degree;
        let utility = corpus.symbols.get(symbol_id).and_then(|s| corpus.file_path(s.file_id)).map(is_utility_path).unwrap_or(false);
        let (critical, warning) = if utility {
            (GOD_CRITICAL_DEGREE * UTILITY_THRESHOLD_MULTIPLIER, GOD_WARNING_DEGREE * UTILITY_THRESHOLD_MULTIPLIER)
        } else {
            (GOD_CRITICAL_DEGREE, GOD_WARNING_DEGREE)
        };

        let severity = if degree > critical {
            Some(Severity::Critical)
        } else if degree > warning {
            Some(Severity::Warning)
        } else {
            None
        };
        if let Some(severity) = severity {
            god_components.push(GodComponentFinding { symbol_id: *symbol_id, degree, severity });
        }
    }

    let mut betweennesses: Vec<f64> = corpus.graph_metrics.values().map(|m| m.betweenness).collect();
    betweennesses.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p90 = percentile(&betweennesses, 0.90);
    let p70 = percentile(&betweennesses, 0.70);

    let mut bottlenecks = Vec::new();
    for (symbol_id, metrics) in &corpus.graph_metrics {
        if metrics.betweenness < p70 {
            continue;
        }
        let utility = corpus.symbols.get(symbol_id).and_then(|s| corpus.file_path(s.file_id)).map(is_utility_path).unwrap_or(false);
        let critical_bound = if utility { p90 * 1.5 } else { p90 };
        let severity = if metrics.betweenness >= critical_bound {
            Severity::Critical
        } else {
            Severity::Warning
        };
        bottlenecks.push(BottleneckFinding { symbol_id: *symbol_id, betweenness: metrics.betweenness, severity });
    }

    let layer_assignment = layers::compute(graph);
    let layer_violation_count = layers::violations(graph, &layer_assignment).len();

    let critical_god = god_components.iter().filter(|g| g.severity == Severity::Critical).count() as f64;
    let gods = god_components.len() as f64;
    let god_signal = critical_god * 3.0 + gods * 0.5;

    let critical_bn = bottlenecks.iter().filter(|b| b.severity == Severity::Critical).count() as f64;
    let bns = bottlenecks.len() as f64;
    let bn_signal = critical_bn * 2.0 + bns * 0.3;

    let avg_file_health_factor = (avg_file_health.unwrap_or(100.0) / 10.0).clamp(0.0, 1.0);

    let eps = 1e-9;
    let ln_sum = 0.30 * factor_exp(tangle_ratio, 10.0).max(eps).ln()
        + 0.20 * factor_exp(god_signal, 5.0).max(eps).ln()
        + 0.15 * factor_exp(bn_signal, 4.0).max(eps).ln()
        + 0.15 * factor_exp(layer_violation_count as f64, 5.0).max(eps).ln()
        + 0.20 * avg_file_health_factor.max(eps).ln();

    let score = (100.0 * ln_sum.exp()).clamp(0.0, 100.0);

    HealthReport { score, tangle_ratio, cycles, god_components, bottlenecks, layer_violation_count }
}

fn factor_exp(signal: f64, scale: f64) -> f64 {
    (-signal / scale).exp()
}

fn percentile(sorted_ascending: &[f64], p: f64) -> f64 {
    if sorted_ascending.is_empty() {
        return 0.0;
    }
    let idx = (((sorted_ascending.len() - 1) as f64) * p).round() as usize;
    sorted_ascending[idx.min(sorted_ascending.len() - 1)]
}

fn dir_of(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphMetrics;
    use crate::types::EdgeKind;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_empty_corpus_scores_at_least_eighty() {
        let corpus = crate::query::tests_support::empty_corpus();
        let graph = Graph::new();
        let report = run(&corpus, &graph, None);
        assert!(report.score >= 80.0, "expected >= 80, got {}", report.score);
        assert!(report.cycles.is_empty());
        assert!(report.god_components.is_empty());
    }

    #[test]
    fn test_score_is_bounded_zero_to_hundred() {
        let mut corpus = crate::query::tests_support::empty_corpus();
        for i in 1..=20u64 {
            corpus.graph_metrics.insert(
                sid(i),
                GraphMetrics { symbol_id: sid(i), pagerank: 0.01, in_degree: 40, out_degree: 40, betweenness: 0.9 },
            );
        }
        let graph = Graph::new();
        let report = run(&corpus, &graph, Some(0.0));
        assert!(report.score >= 0.0 && report.score <= 100.0);
    }

    #[test]
    fn test_three_cycle_is_warning_when_single_directory_but_many_files() {
        let mut graph = Graph::new();
        graph.add_edge(sid(1), sid(2), EdgeKind::Call, 1);
        graph.add_edge(sid(2), sid(3), EdgeKind::Call, 1);
        graph.add_edge(sid(3), sid(1), EdgeKind::Call, 1);

        let corpus = crate::query::tests_support::empty_corpus();
        let report = run(&corpus, &graph, None);
        let cycle = report.cycles.iter().find(|c| c.members.len() == 3).unwrap();
        assert_eq!(cycle.severity, Severity::Info);
        assert!(cycle.suggestion.is_some());
    }

    #[test]
    fn test_god_component_requires_exceeding_warning_threshold() {
        let mut corpus = crate::query::tests_support::empty_corpus();
        corpus.graph_metrics.insert(sid(1), GraphMetrics { symbol_id: sid(1), pagerank: 0.0, in_degree: 20, out_degree: 20, betweenness: 0.0 });
        let graph = Graph::new();
        let report = run(&corpus, &graph, None);
        assert_eq!(report.god_components.len(), 1);
        assert_eq!(report.god_components[0].severity, Severity::Warning);
    }
}
