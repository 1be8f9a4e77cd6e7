//! Error types for the code-intelligence engine.
//!
//! Structured error types using `thiserror`, split by concern: a store error,
//! an indexing error, and a query error. Most query-facing failures are
//! *not* represented as `Err` values at all — they become structured empty
//! results with a `note`; these types exist for the genuine data-integrity
//! and I/O boundary the core must surface.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the Store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("index not initialized at '{path}'; run indexing first")]
    MissingIndex { path: PathBuf },

    #[error("index store at '{path}' is corrupted or zero-length")]
    CorruptStore { path: PathBuf },

    #[error("schema migration failed: {reason}")]
    SchemaMismatch { reason: String },

    #[error("sqlite error during {operation}: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to acquire pooled connection: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingIndex { .. } => vec!["Run 'roam index <path>' to build the index"],
            Self::CorruptStore { .. } => {
                vec!["Run 'roam index --force <path>' to rebuild the index from scratch"]
            }
            Self::SchemaMismatch { .. } => {
                vec!["The store predates a required migration; re-index with --force"]
            }
            _ => vec![],
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from ingestion, resolution, and analytics passes.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("file '{path}' not found in index")]
    FileNotFound { path: String },

    #[error("symbol '{name}' not found in index")]
    SymbolNotFound { name: String },
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Errors surfaced by `QueryEngine`/`FitnessEngine`/`HealthEngine` entry
/// points. These are rarely returned as `Err`; most query-input
/// problems are represented in-band via `QueryOutcome::Empty { note }`
/// instead. This type exists for the boundary cases that genuinely can't
/// produce a result at all (index missing, store unopenable).
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error(transparent)]
    Figment(#[from] figment::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
