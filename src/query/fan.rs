//! Fan-in / fan-out query.

use super::Corpus;
use crate::types::SymbolId;

const GOD_OUT_DEGREE_THRESHOLD: u32 = 15;
const HIGH_IMPACT_IN_DEGREE_THRESHOLD: u32 = 20;
const HUB_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    GodObject,
    HighImpact,
    Hub,
    None,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GodObject => "god-object",
            Self::HighImpact => "high-impact",
            Self::Hub => "hub",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanEntry {
    pub symbol_id: SymbolId,
    pub in_degree: u32,
    pub out_degree: u32,
    pub risk: RiskLabel,
}

#[derive(Debug, Clone, Copy)]
pub enum ThresholdOn {
    InDegree,
    OutDegree,
    Sum,
}

fn risk_label(in_degree: u32, out_degree: u32) -> RiskLabel {
    let is_hub = in_degree > HUB_THRESHOLD && out_degree > HUB_THRESHOLD;
    if is_hub {
        RiskLabel::Hub
    } else if out_degree > GOD_OUT_DEGREE_THRESHOLD {
        RiskLabel::GodObject
    } else if in_degree > HIGH_IMPACT_IN_DEGREE_THRESHOLD {
        RiskLabel::HighImpact
    } else {
        RiskLabel::None
    }
}

/// Ordered read of `GraphMetrics` filtered by a threshold on in-degree,
/// out-degree, or their sum.
pub fn run(corpus: &Corpus, threshold_on: ThresholdOn, threshold: u32) -> Vec<FanEntry> {
    let mut entries: Vec<FanEntry> = corpus
        .graph_metrics
        .values()
        .filter(|m| {
            let value = match threshold_on {
                ThresholdOn::InDegree => m.in_degree,
                ThresholdOn::OutDegree => m.out_degree,
                ThresholdOn::Sum => m.in_degree + m.out_degree,
            };
            value >= threshold
        })
        .map(|m| FanEntry {
            symbol_id: m.symbol_id,
            in_degree: m.in_degree,
            out_degree: m.out_degree,
            risk: risk_label(m.in_degree, m.out_degree),
        })
        .collect();

    entries.sort_by(|a, b| {
        (b.in_degree + b.out_degree)
            .cmp(&(a.in_degree + a.out_degree))
            .then(a.symbol_id.value().cmp(&b.symbol_id.value()))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphMetrics;

    fn sid(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn test_god_object_label() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.graph_metrics.insert(sid(1), GraphMetrics { symbol_id: sid(1), pagerank: 0.0, in_degree: 1, out_degree: 20, betweenness: 0.0 });
        let result = run(&corpus, ThresholdOn::OutDegree, 10);
        assert_eq!(result[0].risk, RiskLabel::GodObject);
    }

    #[test]
    fn test_hub_label_requires_both_directions() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.graph_metrics.insert(sid(1), GraphMetrics { symbol_id: sid(1), pagerank: 0.0, in_degree: 11, out_degree: 11, betweenness: 0.0 });
        let result = run(&corpus, ThresholdOn::Sum, 1);
        assert_eq!(result[0].risk, RiskLabel::Hub);
    }
}
