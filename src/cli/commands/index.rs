//! Index command: walk the given paths, register every file with a
//! `NullExtractor` (real language frontends are out of scope for this
//! core), and drive the full ingestion pipeline.

#[cfg(feature = "git")]
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::analytics::CancellationToken;
use crate::extractor::{ExtractorOutput, NullExtractor, SymbolExtractor};
#[cfg(feature = "git")]
use crate::git;
use crate::ingestion::{FileInput, IngestionPipeline};
use crate::io::ExitCode;
use crate::store::Store;
use crate::Settings;

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn collect_files(paths: &[std::path::PathBuf]) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for root in paths {
        if root.is_file() {
            out.push(root.clone());
            continue;
        }
        let walker = ignore::WalkBuilder::new(root).hidden(false).build();
        for entry in walker.flatten() {
            if entry.file_type().is_some_and(|t| t.is_file()) {
                out.push(entry.into_path());
            }
        }
    }
    out
}

pub fn run_index(paths: Vec<std::path::PathBuf>, settings: &Settings) -> ExitCode {
    let store = match Store::open(&settings.store_path) {
        Ok(store) => std::sync::Arc::new(store),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::Error;
        }
    };

    let extractor = NullExtractor;
    let files = collect_files(&paths);
    let mut inputs = Vec::with_capacity(files.len());
    for path in &files {
        let Ok(content) = std::fs::read_to_string(path) else { continue };
        let rel = path.to_string_lossy().replace('\\', "/");
        let output: ExtractorOutput = extractor.extract(&rel, &content);
        inputs.push(FileInput {
            path: rel,
            language: None,
            content_hash: Some(hash_content(&content)),
            output,
        });
    }

    let pipeline = IngestionPipeline::new(store.clone());
    let token = CancellationToken::new();
    let summary = match pipeline.index(&inputs, &token) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::Error;
        }
    };

    println!(
        "Indexed {} files, {} symbols, {} edges resolved, {} file-level edges",
        summary.files_ingested, summary.symbols_ingested, summary.edges_resolved, summary.file_edges
    );

    ingest_git_history(&store, &inputs);

    ExitCode::Success
}

/// Best-effort: a missing or unavailable git repository yields an empty
/// history, not a hard failure.
#[cfg_attr(not(feature = "git"), allow(unused_variables))]
fn ingest_git_history(store: &std::sync::Arc<Store>, inputs: &[FileInput]) {
    let _ = inputs;
    #[cfg(feature = "git")]
    {
        let repo_root = Path::new(".");
        if let Ok(git_source) = git::Git2ChangedFileSource::open(repo_root) {
            if let Ok(history) = git_source.commit_history(500) {
                let file_ids_by_path: std::collections::HashMap<String, crate::types::FileId> = {
                    let conn = match store.reader() {
                        Ok(conn) => conn,
                        Err(_) => return,
                    };
                    let mut stmt = match conn.prepare("SELECT id, path FROM files") {
                        Ok(stmt) => stmt,
                        Err(_) => return,
                    };
                    let rows = stmt.query_map([], |row| {
                        Ok((row.get::<_, String>(1)?, row.get::<_, crate::types::FileId>(0)?))
                    });
                    match rows {
                        Ok(rows) => rows.filter_map(Result::ok).collect(),
                        Err(_) => return,
                    }
                };
                let _ = git::ingest_history(store, &file_ids_by_path, &history);
            }
        }
    }
    let _ = inputs;
}
