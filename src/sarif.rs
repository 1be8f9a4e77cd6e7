//! SARIF 2.1.0 export: turns dead-code candidates, cognitive
//! complexity outliers, and health findings into a single static-analysis
//! results log with stable rule ids (`ROAM-DEAD-100`, `ROAM-CC-CRITICAL`,
//! `ROAM-HEALTH-GOD`, ...).
//!
//! Hand-rolled against `serde_json` rather than a `sarif` crate: `serde_json`
//! already handles every other structured payload here (the envelope, the
//! config file), and the SARIF 2.1.0 object model is small enough that a
//! dedicated dependency for its types isn't worth the addition.

use serde::Serialize;

use crate::health::{HealthReport, Severity as HealthSeverity};
use crate::query::dead_code::DeadCodeResult;
use crate::query::Corpus;
use crate::types::SymbolId;

const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/Schemata/sarif-schema-2.1.0.json";
const SARIF_VERSION: &str = "2.1.0";
const TOOL_NAME: &str = "roam";

const COGNITIVE_COMPLEXITY_CRITICAL: u32 = 25;
const COGNITIVE_COMPLEXITY_WARNING: u32 = 15;

#[derive(Debug, Serialize)]
pub struct SarifLog {
    pub version: &'static str,
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub runs: Vec<Run>,
}

#[derive(Debug, Serialize)]
pub struct Run {
    pub tool: Tool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
pub struct Tool {
    pub driver: Driver,
}

#[derive(Debug, Serialize)]
pub struct Driver {
    pub name: &'static str,
    pub version: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Serialize)]
pub struct Rule {
    pub id: &'static str,
    #[serde(rename = "shortDescription")]
    pub short_description: Text,
}

#[derive(Debug, Serialize)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: &'static str,
    pub level: &'static str,
    pub message: Text,
    pub locations: Vec<Location>,
    pub properties: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct Location {
    #[serde(rename = "physicalLocation")]
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Serialize)]
pub struct PhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: ArtifactLocation,
    pub region: Region,
}

#[derive(Debug, Serialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct Region {
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "endLine")]
    pub end_line: u32,
}

/// Full static rule catalog, listed in the driver regardless of whether any
/// result triggers it — the usual SARIF convention (a consumer diffing two
/// runs needs the full catalog, not just the hits).
const RULE_CATALOG: &[(&str, &str)] = &[
    ("ROAM-DEAD-100", "Exported symbol with no incoming references and no name collisions"),
    ("ROAM-DEAD-80", "Exported symbol reachable only via unresolved import edges"),
    ("ROAM-DEAD-70", "Exported symbol with no incoming references but a shared name"),
    ("ROAM-DEAD-60", "Exported symbol with low-confidence dead-code signal"),
    ("ROAM-CC-CRITICAL", "Cognitive complexity exceeds the critical threshold"),
    ("ROAM-CC-WARNING", "Cognitive complexity exceeds the warning threshold"),
    ("ROAM-HEALTH-CYCLE", "Strongly connected component (dependency cycle) detected"),
    ("ROAM-HEALTH-GOD", "God-component: symbol degree exceeds the god threshold"),
    ("ROAM-HEALTH-BOTTLENECK", "Betweenness-centrality bottleneck detected"),
];

fn rules() -> Vec<Rule> {
    RULE_CATALOG.iter().map(|(id, desc)| Rule { id, short_description: Text { text: desc.to_string() } }).collect()
}

fn location_for(corpus: &Corpus, symbol_id: SymbolId) -> Option<Location> {
    let symbol = corpus.symbols.get(&symbol_id)?;
    let path = corpus.file_path(symbol.file_id)?.to_string();
    Some(Location {
        physical_location: PhysicalLocation {
            artifact_location: ArtifactLocation { uri: path },
            region: Region { start_line: symbol.span.start, end_line: symbol.span.end },
        },
    })
}

fn dead_code_rule_id(confidence: u8) -> &'static str {
    match confidence {
        100 => "ROAM-DEAD-100",
        80 => "ROAM-DEAD-80",
        70 => "ROAM-DEAD-70",
        _ => "ROAM-DEAD-60",
    }
}

fn dead_code_level(confidence: u8) -> &'static str {
    if confidence >= 90 {
        "error"
    } else if confidence >= 70 {
        "warning"
    } else {
        "note"
    }
}

fn health_level(severity: HealthSeverity) -> &'static str {
    match severity {
        HealthSeverity::Critical => "error",
        HealthSeverity::Warning => "warning",
        HealthSeverity::Info => "note",
    }
}

fn dead_code_results(corpus: &Corpus, dead_code: &DeadCodeResult) -> Vec<SarifResult> {
    dead_code
        .candidates
        .iter()
        .filter_map(|candidate| {
            let symbol = corpus.symbols.get(&candidate.symbol_id)?;
            let location = location_for(corpus, candidate.symbol_id)?;
            Some(SarifResult {
                rule_id: dead_code_rule_id(candidate.confidence),
                level: dead_code_level(candidate.confidence),
                message: Text { text: format!("'{}' appears unreachable (confidence {}%)", symbol.qualified_name, candidate.confidence) },
                locations: vec![location],
                properties: serde_json::json!({
                    "confidence": candidate.confidence,
                    "decayScore": candidate.decay_score,
                }),
            })
        })
        .collect()
}

fn complexity_results(corpus: &Corpus) -> Vec<SarifResult> {
    corpus
        .symbol_metrics
        .iter()
        .filter_map(|(symbol_id, metrics)| {
            let (rule_id, level) = if metrics.cognitive_complexity >= COGNITIVE_COMPLEXITY_CRITICAL {
                ("ROAM-CC-CRITICAL", "error")
            } else if metrics.cognitive_complexity >= COGNITIVE_COMPLEXITY_WARNING {
                ("ROAM-CC-WARNING", "warning")
            } else {
                return None;
            };
            let symbol = corpus.symbols.get(symbol_id)?;
            let location = location_for(corpus, *symbol_id)?;
            Some(SarifResult {
                rule_id,
                level,
                message: Text {
                    text: format!("'{}' has cognitive complexity {}", symbol.qualified_name, metrics.cognitive_complexity),
                },
                locations: vec![location],
                properties: serde_json::json!({ "cognitiveComplexity": metrics.cognitive_complexity }),
            })
        })
        .collect()
}

fn health_results(corpus: &Corpus, health: &HealthReport) -> Vec<SarifResult> {
    let mut results = Vec::new();

    for cycle in &health.cycles {
        let Some(&first) = cycle.members.first() else { continue };
        let Some(location) = location_for(corpus, first) else { continue };
        results.push(SarifResult {
            rule_id: "ROAM-HEALTH-CYCLE",
            level: health_level(cycle.severity),
            message: Text { text: format!("Dependency cycle among {} symbols", cycle.members.len()) },
            locations: vec![location],
            properties: serde_json::json!({ "memberCount": cycle.members.len() }),
        });
    }

    for god in &health.god_components {
        let Some(location) = location_for(corpus, god.symbol_id) else { continue };
        let Some(symbol) = corpus.symbols.get(&god.symbol_id) else { continue };
        results.push(SarifResult {
            rule_id: "ROAM-HEALTH-GOD",
            level: health_level(god.severity),
            message: Text { text: format!("'{}' has degree {}", symbol.qualified_name, god.degree) },
            locations: vec![location],
            properties: serde_json::json!({ "degree": god.degree }),
        });
    }

    for bottleneck in &health.bottlenecks {
        let Some(location) = location_for(corpus, bottleneck.symbol_id) else { continue };
        let Some(symbol) = corpus.symbols.get(&bottleneck.symbol_id) else { continue };
        results.push(SarifResult {
            rule_id: "ROAM-HEALTH-BOTTLENECK",
            level: health_level(bottleneck.severity),
            message: Text { text: format!("'{}' is a betweenness-centrality bottleneck", symbol.qualified_name) },
            locations: vec![location],
            properties: serde_json::json!({ "betweenness": bottleneck.betweenness }),
        });
    }

    results
}

/// Build the full SARIF log from the three finding sources.
pub fn build(corpus: &Corpus, dead_code: &DeadCodeResult, health: &HealthReport, tool_version: &str) -> SarifLog {
    let mut results = dead_code_results(corpus, dead_code);
    results.extend(complexity_results(corpus));
    results.extend(health_results(corpus, health));

    SarifLog {
        version: SARIF_VERSION,
        schema: SARIF_SCHEMA,
        runs: vec![Run { tool: Tool { driver: Driver { name: TOOL_NAME, version: tool_version.to_string(), rules: rules() } }, results }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, Symbol};
    use crate::query::dead_code::DeadCodeCandidate;
    use crate::types::{FileId, FileRole, LineSpan, SymbolKind, Visibility};

    fn empty_corpus() -> Corpus {
        crate::query::tests_support::empty_corpus()
    }

    #[test]
    fn test_rule_catalog_is_always_present() {
        let corpus = empty_corpus();
        let dead_code = DeadCodeResult::default();
        let health = crate::health::run(&corpus, &crate::graph::Graph::new(), None);
        let log = build(&corpus, &dead_code, &health, "0.1.0");
        assert_eq!(log.runs[0].tool.driver.rules.len(), RULE_CATALOG.len());
        assert!(log.runs[0].results.is_empty());
    }

    #[test]
    fn test_dead_code_candidate_maps_to_correct_rule_and_level() {
        let mut corpus = empty_corpus();
        let file_id = FileId::new(1).unwrap();
        corpus.files.insert(file_id, File { id: file_id, path: "src/lib.rs".into(), language: None, line_count: 10, file_role: FileRole::Source, content_hash: None });
        let sym_id = SymbolId::new(1).unwrap();
        corpus.symbols.insert(
            sym_id,
            Symbol {
                id: sym_id,
                file_id,
                name: "unused".into(),
                qualified_name: "crate::unused".into(),
                kind: SymbolKind::Function,
                signature: None,
                span: LineSpan::new(3, 7),
                docstring: None,
                visibility: Visibility::Public,
                is_exported: true,
                parent_name: None,
                default_value: None,
            },
        );

        let dead_code = DeadCodeResult { candidates: vec![DeadCodeCandidate { symbol_id: sym_id, confidence: 100, decay_score: None }], dead_clusters: vec![] };
        let health = crate::health::run(&corpus, &crate::graph::Graph::new(), None);
        let log = build(&corpus, &dead_code, &health, "0.1.0");

        let result = log.runs[0].results.iter().find(|r| r.rule_id == "ROAM-DEAD-100").unwrap();
        assert_eq!(result.level, "error");
        assert_eq!(result.locations[0].physical_location.artifact_location.uri, "src/lib.rs");
        assert_eq!(result.locations[0].physical_location.region.start_line, 3);
    }

    #[test]
    fn test_serializes_with_stable_schema_fields() {
        let corpus = empty_corpus();
        let dead_code = DeadCodeResult::default();
        let health = crate::health::run(&corpus, &crate::graph::Graph::new(), None);
        let log = build(&corpus, &dead_code, &health, "0.1.0");
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"version\":\"2.1.0\""));
        assert!(json.contains("\"$schema\""));
    }
}
