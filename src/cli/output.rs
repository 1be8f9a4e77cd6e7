//! Shared CLI plumbing: opening the store, loading a `Corpus`, resolving a
//! name/path argument to an id, and rendering an `Envelope<T>` as either
//! pretty JSON or a `comfy-table`.

use std::sync::Arc;

use comfy_table::{presets::UTF8_FULL, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::error::StorageError;
use crate::io::{Envelope, ExitCode, ResultCode};
use crate::query::Corpus;
use crate::store::Store;
use crate::types::{FileId, SymbolId};
use crate::Settings;

/// Open the store at `settings.store_path`, mapping a missing file to a
/// `MissingIndex` error the caller can render with recovery suggestions.
pub fn open_store(settings: &Settings) -> Result<Arc<Store>, StorageError> {
    if !settings.store_path.exists() {
        return Err(StorageError::MissingIndex { path: settings.store_path.clone() });
    }
    Ok(Arc::new(Store::open(&settings.store_path)?))
}

/// Resolve a CLI `SYMBOL` argument: exact qualified-name match first, then
/// the unique case-insensitive simple-name match, matching the Resolver's
/// own name-matching priority.
pub fn resolve_symbol(corpus: &Corpus, needle: &str) -> Option<SymbolId> {
    if let Some(symbol) = corpus.symbols.values().find(|s| s.qualified_name == needle) {
        return Some(symbol.id);
    }
    let candidates = corpus.by_name.get(&needle.to_ascii_lowercase())?;
    candidates.first().copied()
}

/// Resolve a CLI `PATH` argument to a `FileId` by exact path match.
pub fn resolve_file(corpus: &Corpus, path: &str) -> Option<FileId> {
    corpus.files.values().find(|f| f.path == path).map(|f| f.id)
}

/// Print `envelope` as pretty JSON (if `json`) or `render_table(data)`
/// otherwise, and return the `ExitCode` matching `envelope.exit_code`.
pub fn emit<T, F>(json: bool, envelope: Envelope<T>, render_table: F) -> ExitCode
where
    T: Serialize,
    F: FnOnce(&T),
{
    let exit = ExitCode::from(envelope.exit_code);
    if json {
        match envelope.to_json() {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("failed to serialize output: {e}"),
        }
    } else {
        match &envelope.data {
            Some(data) if envelope.exit_code == 0 => render_table(data),
            _ => print_plain_message(&envelope),
        }
    }
    exit
}

fn print_plain_message<T>(envelope: &Envelope<T>) {
    match envelope.code {
        ResultCode::Ok => println!("{}", envelope.message),
        ResultCode::NotFound => println!("{}", envelope.message.yellow()),
        _ => eprintln!("{}: {}", "error".red().bold(), envelope.message),
    }
    if let Some(hint) = &envelope.hint {
        eprintln!("{} {}", "hint:".cyan(), hint);
    }
    if let Some(error) = &envelope.error {
        for suggestion in &error.suggestions {
            eprintln!("  - {suggestion}");
        }
    }
}

/// Build an empty `comfy-table` with the `UTF8_FULL` preset and a given
/// header row.
pub fn table(headers: Vec<&str>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL).set_header(headers);
    t
}

pub fn storage_error_envelope(err: &StorageError) -> Envelope<()> {
    let code = match err {
        StorageError::MissingIndex { .. } => ResultCode::MissingIndex,
        StorageError::CorruptStore { .. } => ResultCode::CorruptStore,
        _ => ResultCode::InternalError,
    };
    Envelope::error(code, err.to_string()).with_error_details(crate::io::ErrorDetails {
        suggestions: err.recovery_suggestions().into_iter().map(String::from).collect(),
        context: None,
    })
}
