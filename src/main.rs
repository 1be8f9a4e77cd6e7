//! CLI entry point: parse arguments, load configuration, dispatch to the
//! matching `cli::commands` function, and translate its `ExitCode` into the
//! process exit status.

use clap::Parser;

use roam_core::cli::args::{Cli, Commands, FanThresholdArg};
use roam_core::cli::commands::{fitness, health, index, init, query, sarif};
use roam_core::query::fan::ThresholdOn;
use roam_core::Settings;

fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    roam_core::logging::init_with_config(&settings.logging);

    let exit_code = match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        Commands::Index { paths, force: _ } => index::run_index(paths, &settings),
        Commands::DeadCode { include_all, json } => query::run_dead_code(include_all, json, &settings),
        Commands::BlastRadius { symbols, json } => query::run_blast_radius(symbols, json, &settings),
        Commands::AffectedTests { symbols, json } => query::run_affected_tests(symbols, json, &settings),
        Commands::Coupling { path, min_strength, json } => {
            query::run_coupling(path, min_strength, json, &settings)
        }
        Commands::PrRisk { symbols, files, json } => query::run_pr_risk(symbols, files, json, &settings),
        Commands::BreakingChanges { files, json } => query::run_breaking_changes(files, json, &settings),
        Commands::CoverageGaps { json } => query::run_coverage_gaps(json, &settings),
        Commands::Fan { on, threshold, json } => {
            let on = match on {
                FanThresholdArg::InDegree => ThresholdOn::InDegree,
                FanThresholdArg::OutDegree => ThresholdOn::OutDegree,
                FanThresholdArg::Sum => ThresholdOn::Sum,
            };
            query::run_fan(on, threshold, json, &settings)
        }
        Commands::Grep { pattern, kind, json } => query::run_grep(pattern, kind, json, &settings),
        Commands::Context { symbol, sibling_limit, json } => {
            query::run_context(symbol, sibling_limit, json, &settings)
        }
        Commands::Health { json } => health::run_health(json, &settings),
        Commands::Fitness { preset, json } => fitness::run_fitness(preset, json, &settings),
        Commands::Snapshot { json } => fitness::run_snapshot(json, &settings),
        Commands::Trend { metric, json } => fitness::run_trend(metric, json, &settings),
        Commands::Sarif { output } => sarif::run_sarif(output, &settings),
    };

    std::process::exit(exit_code.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
