//! SARIF export command: renders dead-code, complexity, and
//! health findings as a single SARIF 2.1.0 log, written to stdout or to a
//! file path.

use std::io::Write;

use crate::cli::output::open_store;
use crate::io::ExitCode;
use crate::query::{build_graph, dead_code, QueryEngine};
use crate::Settings;

pub fn run_sarif(output: Option<std::path::PathBuf>, settings: &Settings) -> ExitCode {
    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::Error;
        }
    };
    let engine = QueryEngine::new(store);
    let corpus = match engine.load() {
        Ok(corpus) => corpus,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::Error;
        }
    };

    let dead = dead_code::run(&corpus, &dead_code::Options::default());
    let graph = build_graph(&corpus);
    let health = crate::health::run(&corpus, &graph, None);
    let log = crate::sarif::build(&corpus, &dead, &health, env!("CARGO_PKG_VERSION"));

    let rendered = match serde_json::to_string_pretty(&log) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: failed to render SARIF: {e}");
            return ExitCode::Error;
        }
    };

    match output {
        Some(path) => match std::fs::File::create(&path).and_then(|mut f| f.write_all(rendered.as_bytes())) {
            Ok(()) => {
                println!("SARIF log written to: {}", path.display());
                ExitCode::Success
            }
            Err(e) => {
                eprintln!("error: could not write {}: {e}", path.display());
                ExitCode::Error
            }
        },
        None => {
            println!("{rendered}");
            ExitCode::Success
        }
    }
}
