//! Health command.

use crate::cli::output::{emit, open_store, table};
use crate::io::{EntityType, Envelope, ExitCode, ResultCode};
use crate::query::QueryEngine;
use crate::Settings;

pub fn run_health(json: bool, settings: &Settings) -> ExitCode {
    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => return emit(json, crate::cli::output::storage_error_envelope(&e), |_| {}),
    };
    let engine = QueryEngine::new(store);
    let corpus = match engine.load() {
        Ok(corpus) => corpus,
        Err(e) => return emit(json, Envelope::<()>::error(ResultCode::InternalError, e.to_string()), |_| {}),
    };

    let graph = crate::query::build_graph(&corpus);
    let report = crate::health::run(&corpus, &graph, None);

    let envelope = Envelope::success((
        report.score,
        report.tangle_ratio,
        report.cycles.len(),
        report.god_components.len(),
        report.bottlenecks.len(),
        report.layer_violation_count,
    ))
    .with_entity_type(EntityType::HealthReport);

    emit(json, envelope, |(score, tangle, cycles, god, bottlenecks, layer_violations)| {
        let mut t = table(vec!["Metric", "Value"]);
        t.add_row(vec!["Health score".to_string(), format!("{score:.1}/100")]);
        t.add_row(vec!["Tangle ratio".to_string(), format!("{tangle:.3}")]);
        t.add_row(vec!["Cycles".to_string(), cycles.to_string()]);
        t.add_row(vec!["God components".to_string(), god.to_string()]);
        t.add_row(vec!["Bottlenecks".to_string(), bottlenecks.to_string()]);
        t.add_row(vec!["Layer violations".to_string(), layer_violations.to_string()]);
        println!("{t}");
    })
}
