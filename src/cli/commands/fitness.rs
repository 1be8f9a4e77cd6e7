//! Fitness commands: gate evaluation, snapshot recording, and trend/anomaly
//! analysis over the snapshot history.

use crate::cli::output::{emit, open_store, table};
use crate::fitness::{self, MetricDirection};
use crate::io::{EntityType, Envelope, ExitCode, ResultCode};
use crate::query::QueryEngine;
use crate::Settings;

fn load_metrics(settings: &Settings) -> Result<(crate::query::Corpus, fitness::FitnessMetrics), Envelope<()>> {
    let store = open_store(settings).map_err(|e| crate::cli::output::storage_error_envelope(&e))?;
    let engine = QueryEngine::new(store);
    let corpus = engine.load().map_err(|e| Envelope::error(ResultCode::InternalError, e.to_string()))?;
    let graph = crate::query::build_graph(&corpus);
    let metrics = fitness::aggregate(&corpus, &graph);
    Ok((corpus, metrics))
}

pub fn run_fitness(preset: String, json: bool, settings: &Settings) -> ExitCode {
    let (_, metrics) = match load_metrics(settings) {
        Ok(pair) => pair,
        Err(envelope) => return emit(json, envelope, |_| {}),
    };
    let gate = fitness::evaluate(&metrics, &preset);

    let rows: Vec<(String, f64, &'static str, f64, bool)> = gate
        .checks
        .iter()
        .map(|c| (c.name.to_string(), c.actual, c.op.as_str(), c.threshold, c.pass))
        .collect();

    let envelope = Envelope::success((gate.passed, rows.clone()))
        .with_entity_type(EntityType::FitnessGate)
        .with_query(preset);
    emit(json, envelope, |(passed, rows)| {
        let mut t = table(vec!["Check", "Actual", "Op", "Threshold", "Pass"]);
        for (name, actual, op, threshold, pass) in rows {
            t.add_row(vec![name.clone(), format!("{actual:.3}"), op.to_string(), format!("{threshold:.3}"), pass.to_string()]);
        }
        println!("{t}");
        println!("Gate {}", if *passed { "PASSED" } else { "FAILED" });
    })
}

pub fn run_snapshot(json: bool, settings: &Settings) -> ExitCode {
    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => return emit(json, crate::cli::output::storage_error_envelope(&e), |_| {}),
    };
    let engine = QueryEngine::new(store.clone());
    let corpus = match engine.load() {
        Ok(corpus) => corpus,
        Err(e) => return emit(json, Envelope::<()>::error(ResultCode::InternalError, e.to_string()), |_| {}),
    };
    let graph = crate::query::build_graph(&corpus);
    let metrics = fitness::aggregate(&corpus, &graph);

    let metrics_json = serde_json::to_value(metrics_as_map(&metrics)).unwrap_or_default();
    let taken_at = crate::utils::get_utc_timestamp() as i64;
    let snapshot_id = match fitness::record_snapshot(&store, taken_at, &metrics_json) {
        Ok(id) => id,
        Err(e) => return emit(json, Envelope::<()>::error(ResultCode::InternalError, e.to_string()), |_| {}),
    };

    let envelope = Envelope::success(snapshot_id).with_entity_type(EntityType::Snapshot);
    emit(json, envelope, |id| println!("Recorded snapshot #{id}"))
}

fn metrics_as_map(metrics: &fitness::FitnessMetrics) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    map.insert("file_count".into(), metrics.file_count.into());
    map.insert("symbol_count".into(), metrics.symbol_count.into());
    map.insert("test_ratio".into(), metrics.test_ratio.into());
    map.insert("dead_code_percent".into(), metrics.dead_code_percent.into());
    map.insert("cycle_count".into(), metrics.cycle_count.into());
    map.insert("tangle_ratio".into(), metrics.tangle_ratio.into());
    map.insert("god_count".into(), metrics.god_count.into());
    map.insert("coupling_density".into(), metrics.coupling_density.into());
    map.insert("avg_complexity".into(), metrics.avg_complexity.into());
    map
}

/// Metrics where a rising value is an improvement rather than a regression
/// ( direction filter); everything else defaults to `UpIsBad`.
fn direction_for(metric: &str) -> MetricDirection {
    match metric {
        "test_ratio" => MetricDirection::UpIsGood,
        _ => MetricDirection::UpIsBad,
    }
}

pub fn run_trend(metric: String, json: bool, settings: &Settings) -> ExitCode {
    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => return emit(json, crate::cli::output::storage_error_envelope(&e), |_| {}),
    };
    let snapshots = match fitness::load_snapshots(&store) {
        Ok(snapshots) => snapshots,
        Err(e) => return emit(json, Envelope::<()>::error(ResultCode::InternalError, e.to_string()), |_| {}),
    };

    let series: Vec<f64> = snapshots
        .iter()
        .filter_map(|s| s.metrics.get(&metric).and_then(|v| v.as_f64()))
        .collect();

    if series.is_empty() {
        return emit(json, Envelope::<()>::not_found(format!("No snapshots recorded with metric '{metric}'")), |_| {});
    }

    let trend = fitness::mann_kendall(&series);
    let anomaly = fitness::detect_anomaly(&series, direction_for(&metric), settings.fitness.anomaly_threshold);
    let spark = fitness::sparkline(&series);

    let trend_label = match trend.trend {
        fitness::Trend::Increasing => "increasing",
        fitness::Trend::Decreasing => "decreasing",
        fitness::Trend::Flat => "flat",
    };
    let anomaly_label = anomaly.map(|a| (a.severity.as_str(), a.z_score, a.rule));

    let envelope = Envelope::success((trend_label, trend.tau, trend.p_value, spark.clone(), anomaly_label))
        .with_entity_type(EntityType::Trend)
        .with_query(metric);
    emit(json, envelope, |(trend_label, tau, p_value, spark, anomaly)| {
        let mut t = table(vec!["Trend", "Tau", "p-value", "Sparkline"]);
        t.add_row(vec![trend_label.to_string(), format!("{tau:.3}"), format!("{p_value:.3}"), spark.clone()]);
        println!("{t}");
        match anomaly {
            Some((severity, z, rule)) => println!("Anomaly: {severity} (z={z:.2}, rule={rule})"),
            None => println!("No anomaly detected"),
        }
    })
}
