//! Read-only query commands: dead-code, blast-radius, affected-tests,
//! coupling, pr-risk, breaking-changes, coverage-gaps, fan, grep, context
//!. Each opens the store, loads a `Corpus`, runs one query
//! module, and renders an `Envelope<T>`.

use crate::cli::output::{emit, open_store, resolve_file, resolve_symbol, table};
use crate::io::{EntityType, Envelope, ExitCode, ResultCode};
use crate::query::{
    affected_tests, blast_radius, breaking_changes, context, coupling, coverage_gaps, dead_code, fan, grep, pr_risk,
    QueryEngine,
};
use crate::types::SymbolId;
use crate::Settings;

macro_rules! load_corpus_or_bail {
    ($settings:expr) => {{
        let store = match open_store($settings) {
            Ok(store) => store,
            Err(e) => {
                let envelope: Envelope<()> = crate::cli::output::storage_error_envelope(&e);
                return emit(true, envelope, |_| {});
            }
        };
        let engine = QueryEngine::new(store);
        match engine.load() {
            Ok(corpus) => corpus,
            Err(e) => {
                let envelope: Envelope<()> = Envelope::error(ResultCode::InternalError, e.to_string());
                return emit(true, envelope, |_| {});
            }
        }
    }};
}

fn resolve_symbols_or_empty(
    corpus: &crate::query::Corpus,
    names: &[String],
) -> Result<Vec<SymbolId>, String> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        match resolve_symbol(corpus, name) {
            Some(id) => ids.push(id),
            None => return Err(format!("symbol '{name}' not found in index")),
        }
    }
    Ok(ids)
}

pub fn run_dead_code(include_all: bool, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let result = dead_code::run(&corpus, &dead_code::Options { include_all, age_days: Default::default() });

    if result.candidates.is_empty() {
        let envelope: Envelope<()> = Envelope::not_found("No dead code candidates found")
            .with_hint("Try --include-all to include test files and conventionally-excluded names");
        return emit(json, envelope, |_| {});
    }

    let rows: Vec<_> = result
        .candidates
        .iter()
        .filter_map(|c| corpus.symbols.get(&c.symbol_id).map(|s| (s, c.confidence)))
        .collect();

    let envelope = Envelope::success(rows.iter().map(|(s, conf)| (s.qualified_name.clone(), *conf)).collect::<Vec<_>>())
        .with_entity_type(EntityType::DeadCodeCandidate)
        .with_count(rows.len());

    emit(json, envelope, |data| {
        let mut t = table(vec!["Symbol", "Confidence"]);
        for (name, confidence) in data {
            t.add_row(vec![name.clone(), format!("{confidence}%")]);
        }
        println!("{t}");
    })
}

pub fn run_blast_radius(symbols: Vec<String>, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let changed = match resolve_symbols_or_empty(&corpus, &symbols) {
        Ok(ids) => ids,
        Err(note) => return emit(json, Envelope::<()>::not_found(note), |_| {}),
    };
    let graph = crate::query::build_graph(&corpus);
    let radius = blast_radius::run(&corpus, &graph, &changed);

    let envelope = Envelope::success(radius).with_entity_type(EntityType::BlastRadius);
    emit(json, envelope, |data| {
        let mut t = table(vec!["Reachable symbols", "Distinct files"]);
        t.add_row(vec![data.reachable_symbol_count.to_string(), data.distinct_file_count.to_string()]);
        println!("{t}");
    })
}

pub fn run_affected_tests(symbols: Vec<String>, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let changed = match resolve_symbols_or_empty(&corpus, &symbols) {
        Ok(ids) => ids,
        Err(note) => return emit(json, Envelope::<()>::not_found(note), |_| {}),
    };
    let graph = crate::query::build_graph(&corpus);
    let affected = affected_tests::run(&corpus, &graph, &changed);

    if affected.test_symbol_ids.is_empty() && affected.colocated_test_files.is_empty() {
        let envelope: Envelope<()> = Envelope::not_found("No affected tests found for the given change set");
        return emit(json, envelope, |_| {});
    }

    let names: Vec<String> = affected
        .test_symbol_ids
        .iter()
        .filter_map(|id| corpus.symbols.get(id))
        .map(|s| s.qualified_name.clone())
        .collect();
    let envelope = Envelope::success(names).with_entity_type(EntityType::AffectedTests);
    emit(json, envelope, |data| {
        let mut t = table(vec!["Test symbol"]);
        for name in data {
            t.add_row(vec![name.clone()]);
        }
        println!("{t}");
    })
}

pub fn run_coupling(path: String, min_strength: Option<String>, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let Some(file_id) = resolve_file(&corpus, &path) else {
        return emit(json, Envelope::<()>::not_found(format!("file '{path}' not found in index")), |_| {});
    };
    let min = min_strength.and_then(|s| match s.as_str() {
        "high" => Some(coupling::Strength::High),
        "medium" => Some(coupling::Strength::Medium),
        "loose" => Some(coupling::Strength::Loose),
        _ => None,
    });
    let results = coupling::run(&corpus, file_id, min);

    if results.is_empty() {
        return emit(json, Envelope::<()>::not_found("No coupled files found"), |_| {});
    }

    let rows: Vec<(String, u32, &'static str)> = results
        .iter()
        .filter_map(|c| corpus.file_path(c.other_file_id).map(|p| (p.to_string(), c.cochange_count, c.strength.as_str())))
        .collect();
    let envelope = Envelope::success(rows.clone()).with_entity_type(EntityType::CoupledFile).with_count(rows.len());
    emit(json, envelope, |data| {
        let mut t = table(vec!["File", "Co-changes", "Strength"]);
        for (path, count, strength) in data {
            t.add_row(vec![path.clone(), count.to_string(), strength.to_string()]);
        }
        println!("{t}");
    })
}

pub fn run_pr_risk(symbols: Vec<String>, files: Vec<String>, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let changed_symbols = match resolve_symbols_or_empty(&corpus, &symbols) {
        Ok(ids) => ids,
        Err(note) => return emit(json, Envelope::<()>::not_found(note), |_| {}),
    };
    let changed_files: Vec<_> = files.iter().filter_map(|p| resolve_file(&corpus, p)).collect();
    let graph = crate::query::build_graph(&corpus);
    let risk = pr_risk::run(&corpus, &graph, &changed_symbols, &changed_files);

    let envelope = Envelope::success((risk.score, risk.level.as_str(), risk.blast_radius, risk.breaking_change_count))
        .with_entity_type(EntityType::PrRisk);
    emit(json, envelope, |(score, level, radius, breaking)| {
        let mut t = table(vec!["Score", "Level", "Blast radius", "Breaking changes"]);
        t.add_row(vec![format!("{score:.3}"), level.to_string(), radius.to_string(), breaking.to_string()]);
        println!("{t}");
    })
}

pub fn run_breaking_changes(files: Vec<String>, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let changed_files: Vec<_> = files.iter().filter_map(|p| resolve_file(&corpus, p)).collect();
    let results = breaking_changes::run(&corpus, &changed_files);

    if results.is_empty() {
        return emit(json, Envelope::<()>::not_found("No breaking changes found in the given files"), |_| {});
    }

    let rows: Vec<(String, usize, &'static str)> = results
        .iter()
        .filter_map(|b| corpus.symbols.get(&b.symbol_id).map(|s| (s.qualified_name.clone(), b.consumer_count, b.severity.as_str())))
        .collect();
    let envelope = Envelope::success(rows.clone()).with_entity_type(EntityType::BreakingChange).with_count(rows.len());
    emit(json, envelope, |data| {
        let mut t = table(vec!["Symbol", "Consumers", "Severity"]);
        for (name, count, severity) in data {
            t.add_row(vec![name.clone(), count.to_string(), severity.to_string()]);
        }
        println!("{t}");
    })
}

pub fn run_coverage_gaps(json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);

    // Direct test-caller counts: edges whose source lives in a test file.
    let mut test_caller_counts = std::collections::HashMap::new();
    for symbol in corpus.symbols.values() {
        if !corpus.is_test_file(symbol.file_id) {
            continue;
        }
        for edge in corpus.outgoing_edges(symbol.id) {
            *test_caller_counts.entry(edge.target_id).or_insert(0usize) += 1;
        }
    }

    let gaps = coverage_gaps::run(&corpus, &test_caller_counts);
    if gaps.is_empty() {
        return emit(json, Envelope::<()>::not_found("No coverage gaps found"), |_| {});
    }

    let rows: Vec<(String, f64)> = gaps
        .iter()
        .filter_map(|g| corpus.symbols.get(&g.symbol_id).map(|s| (s.qualified_name.clone(), g.score)))
        .collect();
    let envelope = Envelope::success(rows.clone()).with_entity_type(EntityType::CoverageGap).with_count(rows.len());
    emit(json, envelope, |data| {
        let mut t = table(vec!["Symbol", "Score"]);
        for (name, score) in data {
            t.add_row(vec![name.clone(), format!("{score:.3}")]);
        }
        println!("{t}");
    })
}

pub fn run_fan(on: fan::ThresholdOn, threshold: u32, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let entries = fan::run(&corpus, on, threshold);
    if entries.is_empty() {
        return emit(json, Envelope::<()>::not_found("No symbols crossed the given fan threshold"), |_| {});
    }

    let rows: Vec<(String, u32, u32, &'static str)> = entries
        .iter()
        .filter_map(|e| corpus.symbols.get(&e.symbol_id).map(|s| (s.qualified_name.clone(), e.in_degree, e.out_degree, e.risk.as_str())))
        .collect();
    let envelope = Envelope::success(rows.clone()).with_entity_type(EntityType::FanFinding).with_count(rows.len());
    emit(json, envelope, |data| {
        let mut t = table(vec!["Symbol", "In-degree", "Out-degree", "Risk"]);
        for (name, indeg, outdeg, risk) in data {
            t.add_row(vec![name.clone(), indeg.to_string(), outdeg.to_string(), risk.to_string()]);
        }
        println!("{t}");
    })
}

pub fn run_grep(pattern: String, kind: Option<String>, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let filters = grep::Filters {
        kind: kind.as_deref().and_then(crate::types::SymbolKind::from_str_loose),
        file_id: None,
    };
    let hits = grep::run(&corpus, &pattern, &filters);
    if hits.is_empty() {
        return emit(json, Envelope::<()>::not_found(format!("No symbols matched '{pattern}'")), |_| {});
    }

    let names: Vec<String> = hits.iter().filter_map(|h| corpus.symbols.get(&h.symbol_id)).map(|s| s.qualified_name.clone()).collect();
    let envelope = Envelope::success(names.clone()).with_entity_type(EntityType::GrepHit).with_count(names.len());
    emit(json, envelope, |data| {
        let mut t = table(vec!["Symbol"]);
        for name in data {
            t.add_row(vec![name.clone()]);
        }
        println!("{t}");
    })
}

pub fn run_context(symbol: String, sibling_limit: usize, json: bool, settings: &Settings) -> ExitCode {
    let corpus = load_corpus_or_bail!(settings);
    let Some(symbol_id) = resolve_symbol(&corpus, &symbol) else {
        return emit(json, Envelope::<()>::not_found(format!("symbol '{symbol}' not found in index")), |_| {});
    };
    let graph = crate::query::build_graph(&corpus);
    let ctx = context::run(&corpus, &graph, symbol_id, sibling_limit);

    let name_of = |id: &SymbolId| corpus.symbols.get(id).map(|s| s.qualified_name.clone()).unwrap_or_default();
    let callers: Vec<String> = ctx.callers.iter().map(|n| name_of(&n.symbol_id)).collect();
    let callees: Vec<String> = ctx.callees.iter().map(|n| name_of(&n.symbol_id)).collect();
    let tests: Vec<String> = ctx.tests.iter().map(name_of).collect();
    let siblings: Vec<String> = ctx.siblings.iter().map(name_of).collect();

    let envelope =
        Envelope::success((callers, callees, tests, siblings)).with_entity_type(EntityType::SemanticContext);
    emit(json, envelope, |(callers, callees, tests, siblings)| {
        let mut t = table(vec!["Relation", "Symbols"]);
        t.add_row(vec!["Callers".to_string(), callers.join(", ")]);
        t.add_row(vec!["Callees".to_string(), callees.join(", ")]);
        t.add_row(vec!["Tests".to_string(), tests.join(", ")]);
        t.add_row(vec!["Siblings".to_string(), siblings.join(", ")]);
        println!("{t}");
    })
}
