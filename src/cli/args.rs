//! CLI argument parsing using clap.
//!
//! Contains the `Cli` struct and every `Commands` variant. Each subcommand
//! carries its own `--json` flag so a caller can ask for the `Envelope<T>`
//! JSON form instead of a rendered table.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Static code-intelligence engine over a multi-language codebase.
#[derive(Parser)]
#[command(name = "roam")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Static code-intelligence engine: symbol graph, cross-reference resolution, and analytical queries")]
pub struct Cli {
    /// Path to a custom settings.toml file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up the .roam directory with default configuration.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(short, long)]
        force: bool,
    },

    /// Display the active configuration.
    Config,

    /// Build or refresh the index over one or more paths.
    Index {
        /// Paths to files or directories to index.
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,

        /// Re-index every matched file even if its content hash is unchanged.
        #[arg(short, long)]
        force: bool,
    },

    /// List exported symbols with no reachable caller.
    DeadCode {
        /// Include test files and conventionally-excluded names.
        #[arg(long)]
        include_all: bool,

        #[arg(long)]
        json: bool,
    },

    /// Reverse-reachability impact of a changed symbol set.
    BlastRadius {
        /// Fully-qualified names of the changed symbols.
        #[arg(value_name = "SYMBOL", required = true)]
        symbols: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Tests reachable from a changed symbol set.
    AffectedTests {
        #[arg(value_name = "SYMBOL", required = true)]
        symbols: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Files that historically change together with a given file.
    Coupling {
        /// Path of the file to report coupling for.
        path: String,

        /// Minimum co-change strength to include (high, medium, loose).
        #[arg(long)]
        min_strength: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Composite risk score for a pending change.
    PrRisk {
        #[arg(long = "symbol", value_name = "SYMBOL")]
        symbols: Vec<String>,

        #[arg(long = "file", value_name = "PATH")]
        files: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Exported symbols in changed files that already have consumers.
    BreakingChanges {
        #[arg(value_name = "PATH", required = true)]
        files: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Exported, non-test symbols with zero test callers.
    CoverageGaps {
        #[arg(long)]
        json: bool,
    },

    /// Symbols whose fan-in/fan-out crosses a risk threshold.
    Fan {
        /// Which degree the threshold applies to.
        #[arg(long, value_enum, default_value = "sum")]
        on: FanThresholdArg,

        #[arg(long, default_value_t = 10)]
        threshold: u32,

        #[arg(long)]
        json: bool,
    },

    /// Case-insensitive substring search over symbol name/signature.
    Grep {
        pattern: String,

        #[arg(long)]
        kind: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Callers, callees, tests, and siblings of one symbol.
    Context {
        symbol: String,

        #[arg(long, default_value_t = 5)]
        sibling_limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Composite repository health score and structural findings.
    Health {
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the fitness gate against a named threshold preset.
    Fitness {
        #[arg(long, default_value = "default")]
        preset: String,

        #[arg(long)]
        json: bool,
    },

    /// Record a fitness snapshot for the current index state.
    Snapshot {
        #[arg(long)]
        json: bool,
    },

    /// Trend/anomaly analysis over the recorded snapshot history.
    Trend {
        /// Metric name as it appears in a snapshot's JSON (e.g. `dead_code_percent`).
        metric: String,

        #[arg(long)]
        json: bool,
    },

    /// Export dead-code, complexity, and health findings as SARIF 2.1.0.
    Sarif {
        /// Write the SARIF log to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum FanThresholdArg {
    InDegree,
    OutDegree,
    Sum,
}
