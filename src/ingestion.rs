//! Ingestion: accepts per-file extractor output and
//! persists it into the Store, then drives resolution and metrics over the
//! whole indexed set.
//!
//! Two-phase by construction: every file's symbols are ingested before resolution starts;
//! edges are persisted before graph analytics runs; clusters are written
//! after metrics. `IngestionPipeline::index` is the one entry point that
//! enforces this ordering; the phase methods are exposed individually for
//! callers (tests, a future incremental re-index) that need to interleave
//! their own work between phases.

use std::collections::HashMap;

use rusqlite::params;

use crate::analytics::{self, CancellationToken};
use crate::classifier::classify_file_role;
use crate::error::{IndexError, IndexResult};
use crate::extractor::{ExtractorOutput, Reference};
use crate::graph::Graph;
use crate::metrics::{self, HalsteadCounts};
use crate::model::{Cluster, Edge, GraphMetrics, Symbol};
use crate::resolver::{self, Resolver, ResolverInput};
use crate::store::{SharedStore, Store};
use crate::types::{EdgeId, EdgeKind, FileId, SymbolId};

/// One file's worth of extractor output, as handed to the pipeline by the
/// caller (the `roam` CLI's `index` command, or an embedder driving its own
/// language frontends).
pub struct FileInput {
    pub path: String,
    pub language: Option<String>,
    pub content_hash: Option<String>,
    pub output: ExtractorOutput,
}

/// Result of a full `index` run, surfaced to the CLI for a summary line.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexSummary {
    pub files_ingested: usize,
    pub symbols_ingested: usize,
    pub edges_resolved: usize,
    pub file_edges: usize,
}

pub struct IngestionPipeline {
    store: SharedStore,
}

impl IngestionPipeline {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Run the full pipeline over `files`: ingest, resolve, compute metrics,
    /// run graph analytics. Ordering matches .
    pub fn index(&self, files: &[FileInput], token: &CancellationToken) -> IndexResult<IndexSummary> {
        let file_ids = self.ingest_files(files)?;
        let symbols_ingested = self.count_symbols(&file_ids)?;
        let edges_resolved = self.resolve_references(files, &file_ids)?;
        let file_edges = self.aggregate_file_edges()?;
        self.compute_metrics(files, &file_ids)?;
        self.run_analytics(token)?;

        Ok(IndexSummary {
            files_ingested: file_ids.len(),
            symbols_ingested,
            edges_resolved,
            file_edges,
        })
    }

    /// Phase 1: replace each file's row (and, via `ON DELETE CASCADE`, its
    /// old symbols/edges/metrics) and insert its new symbols. One transaction
    /// per file.
    pub fn ingest_files(&self, files: &[FileInput]) -> IndexResult<HashMap<String, FileId>> {
        let mut file_ids = HashMap::with_capacity(files.len());
        for file in files {
            let file_id = self.ingest_one_file(file)?;
            file_ids.insert(file.path.clone(), file_id);
        }
        Ok(file_ids)
    }

    fn ingest_one_file(&self, file: &FileInput) -> IndexResult<FileId> {
        let file_role = classify_file_role(&file.path);
        let line_count = file.output.symbols.iter().map(|s| s.span.end).max().unwrap_or(0);

        let file_id = self.store.with_transaction(|tx| {
            tx.execute("DELETE FROM files WHERE path = ?1", params![file.path]).map_err(|source| {
                crate::error::StorageError::Sqlite { operation: "delete stale file", source }
            })?;

            tx.execute(
                "INSERT INTO files (path, language, line_count, file_role, content_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![file.path, file.language, line_count, file_role, file.content_hash],
            )
            .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert file", source })?;
            let file_id = FileId::new(tx.last_insert_rowid() as u64).expect("autoincrement rowid is nonzero");

            for raw in &file.output.symbols {
                tx.execute(
                    "INSERT INTO symbols (file_id, name, qualified_name, kind, signature, line_start, \
                     line_end, docstring, visibility, is_exported, parent_name, default_value) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        file_id,
                        raw.name,
                        raw.qualified_name,
                        raw.kind,
                        raw.signature,
                        raw.span.start,
                        raw.span.end,
                        raw.docstring,
                        raw.visibility.as_str(),
                        raw.is_exported as i64,
                        raw.parent_name,
                        raw.default_value,
                    ],
                )
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert symbol", source })?;
            }

            Ok(file_id)
        })?;

        Ok(file_id)
    }

    fn count_symbols(&self, file_ids: &HashMap<String, FileId>) -> IndexResult<usize> {
        let conn = self.store.reader()?;
        let ids: Vec<FileId> = file_ids.values().copied().collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = std::iter::repeat("?").take(ids.len()).collect::<Vec<_>>().join(",");
        let sql = format!("SELECT COUNT(*) FROM symbols WHERE file_id IN ({placeholders})");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|source| crate::error::StorageError::Sqlite { operation: "count symbols", source })?;
        let count: i64 = stmt
            .query_row(rusqlite::params_from_iter(ids.iter()), |row| row.get(0))
            .map_err(|source| crate::error::StorageError::Sqlite { operation: "count symbols", source })?;
        Ok(count as usize)
    }

    /// Phase 2: read back every symbol and every `import`-kind reference,
    /// build the indices the Resolver needs, resolve each file's
    /// non-import references, and persist the resulting edges.
    pub fn resolve_references(&self, files: &[FileInput], file_ids: &HashMap<String, FileId>) -> IndexResult<usize> {
        let (symbols, file_paths) = self.load_symbol_indices()?;
        let imports = build_import_map(files);

        let input = ResolverInput { symbols: &symbols, file_paths: &file_paths, imports: &imports };
        let resolver = Resolver::new(&input);

        let mut total_edges = 0usize;
        self.store.with_transaction(|tx| {
            for file in files {
                let Some(&file_id) = file_ids.get(&file.path) else { continue };
                let file_symbols: Vec<SymbolId> = symbols
                    .iter()
                    .filter(|(_, s)| s.file_id == file_id)
                    .map(|(id, _)| *id)
                    .collect();

                let edges = resolver.resolve_file(file_id, &file_symbols, &file.output.references);
                for edge in &edges {
                    tx.execute(
                        "INSERT OR IGNORE INTO edges (source_id, target_id, kind, line) VALUES (?1, ?2, ?3, ?4)",
                        params![edge.source_id, edge.target_id, edge.kind, edge.line],
                    )
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert edge", source })?;
                }
                total_edges += edges.len();
            }
            Ok(())
        })?;

        Ok(total_edges)
    }

    fn load_symbol_indices(&self) -> IndexResult<(HashMap<SymbolId, Symbol>, HashMap<FileId, String>)> {
        let conn = self.store.reader()?;

        let mut file_paths = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT id, path FROM files")
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "load file paths", source })?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, FileId>(0)?, row.get::<_, String>(1)?)))
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "load file paths", source })?;
            for row in rows {
                let (id, path) = row
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "read file path row", source })?;
                file_paths.insert(id, path);
            }
        }

        let mut symbols = HashMap::new();
        {
            let mut stmt = conn
                .prepare(
                    "SELECT id, file_id, name, qualified_name, kind, signature, line_start, line_end, \
                     docstring, visibility, is_exported, parent_name, default_value FROM symbols",
                )
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "load symbols", source })?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Symbol {
                        id: row.get(0)?,
                        file_id: row.get(1)?,
                        name: row.get(2)?,
                        qualified_name: row.get(3)?,
                        kind: row.get(4)?,
                        signature: row.get(5)?,
                        span: crate::types::LineSpan::new(row.get(6)?, row.get(7)?),
                        docstring: row.get(8)?,
                        visibility: row.get::<_, String>(9).map(|v| match v.as_str() {
                            "private" => crate::types::Visibility::Private,
                            "protected" => crate::types::Visibility::Protected,
                            "package" => crate::types::Visibility::Package,
                            _ => crate::types::Visibility::Public,
                        })?,
                        is_exported: row.get::<_, i64>(10)? != 0,
                        parent_name: row.get(11)?,
                        default_value: row.get(12)?,
                    })
                })
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "load symbols", source })?;
            for row in rows {
                let symbol = row
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "read symbol row", source })?;
                symbols.insert(symbol.id, symbol);
            }
        }

        Ok((symbols, file_paths))
    }

    /// Phase 2b: aggregate the just-persisted edges into `file_edges`.
    pub fn aggregate_file_edges(&self) -> IndexResult<usize> {
        let (symbols, _) = self.load_symbol_indices()?;
        let edges = self.load_edges()?;
        let file_edges = resolver::aggregate_file_edges(&edges, &symbols);

        self.store.with_transaction(|tx| {
            tx.execute("DELETE FROM file_edges", [])
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "clear file_edges", source })?;
            for fe in &file_edges {
                tx.execute(
                    "INSERT INTO file_edges (source_file_id, target_file_id, kind, symbol_count) \
                     VALUES (?1, ?2, 'imports', ?3)",
                    params![fe.source_file_id, fe.target_file_id, fe.symbol_count],
                )
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert file_edge", source })?;
            }
            Ok(())
        })?;

        Ok(file_edges.len())
    }

    fn load_edges(&self) -> IndexResult<Vec<Edge>> {
        let conn = self.store.reader()?;
        let mut stmt = conn
            .prepare("SELECT id, source_id, target_id, kind, line FROM edges")
            .map_err(|source| crate::error::StorageError::Sqlite { operation: "load edges", source })?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Edge { id: row.get(0)?, source_id: row.get(1)?, target_id: row.get(2)?, kind: row.get(3)?, line: row.get(4)? })
            })
            .map_err(|source| crate::error::StorageError::Sqlite { operation: "load edges", source })?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row.map_err(|source| crate::error::StorageError::Sqlite { operation: "read edge row", source })?);
        }
        Ok(edges)
    }

    /// Phase 3: per-symbol complexity metrics for function-like symbols,
    /// using each file's own AST node stream.
    pub fn compute_metrics(&self, files: &[FileInput], file_ids: &HashMap<String, FileId>) -> IndexResult<()> {
        self.store.with_transaction(|tx| {
            for file in files {
                let Some(&file_id) = file_ids.get(&file.path) else { continue };
                let mut stmt = tx
                    .prepare("SELECT id FROM symbols WHERE file_id = ?1 ORDER BY line_start")
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "load file symbol ids", source })?;
                let ids: Vec<SymbolId> = stmt
                    .query_map(params![file_id], |row| row.get(0))
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "load file symbol ids", source })?
                    .collect::<Result<_, _>>()
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "read symbol id row", source })?;
                drop(stmt);

                for (idx, raw) in file.output.symbols.iter().enumerate() {
                    if !raw.kind.is_function_like() {
                        continue;
                    }
                    let Some(&symbol_id) = ids.get(idx) else { continue };
                    let nodes = file.output.ast_nodes.get(&idx).map(Vec::as_slice).unwrap_or(&[]);
                    let param_count = count_params(raw.signature.as_deref());
                    let line_count = raw.span.len();
                    let metrics = metrics::compute(symbol_id, nodes, param_count, line_count, HalsteadCounts::default());

                    tx.execute(
                        "INSERT OR REPLACE INTO symbol_metrics (symbol_id, cognitive_complexity, nesting_depth, \
                         param_count, line_count, return_count, bool_op_count, callback_depth, cyclomatic_density, \
                         halstead_volume, halstead_difficulty, halstead_effort, halstead_bugs) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                        params![
                            symbol_id,
                            metrics.cognitive_complexity,
                            metrics.nesting_depth,
                            metrics.param_count,
                            metrics.line_count,
                            metrics.return_count,
                            metrics.bool_op_count,
                            metrics.callback_depth,
                            metrics.cyclomatic_density,
                            metrics.halstead_volume,
                            metrics.halstead_difficulty,
                            metrics.halstead_effort,
                            metrics.halstead_bugs,
                        ],
                    )
                    .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert symbol_metrics", source })?;
                }
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Phase 4: run `GraphAnalytics` over every persisted edge and write
    /// `graph_metrics`/`clusters`.
    pub fn run_analytics(&self, token: &CancellationToken) -> IndexResult<()> {
        let (symbols, _) = self.load_symbol_indices()?;
        let edges = self.load_edges()?;
        let graph = Graph::build(symbols.keys().copied(), &edges);
        let report = analytics::run(&graph, token);

        self.store.with_transaction(|tx| {
            tx.execute("DELETE FROM graph_metrics", [])
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "clear graph_metrics", source })?;
            tx.execute("DELETE FROM clusters", [])
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "clear clusters", source })?;

            for metric in &report.graph_metrics {
                write_graph_metrics(tx, metric)?;
            }
            for cluster in &report.clusters {
                write_cluster(tx, cluster)?;
            }
            Ok(())
        })?;

        Ok(())
    }
}

fn write_graph_metrics(tx: &rusqlite::Transaction<'_>, metric: &GraphMetrics) -> crate::error::StorageResult<()> {
    tx.execute(
        "INSERT INTO graph_metrics (symbol_id, pagerank, in_degree, out_degree, betweenness) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![metric.symbol_id, metric.pagerank, metric.in_degree, metric.out_degree, metric.betweenness],
    )
    .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert graph_metrics", source })?;
    Ok(())
}

fn write_cluster(tx: &rusqlite::Transaction<'_>, cluster: &Cluster) -> crate::error::StorageResult<()> {
    tx.execute(
        "INSERT INTO clusters (symbol_id, cluster_id, cluster_label) VALUES (?1, ?2, ?3)",
        params![cluster.symbol_id, cluster.cluster_id, cluster.cluster_label],
    )
    .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert cluster", source })?;
    Ok(())
}

/// Best-effort parameter count from a declaration signature: counts commas
/// inside the first balanced parenthesis group, plus one if non-empty.
/// Extractors are not required to report `param_count` directly (the
/// extractor contract only mandates `name`/`qualified_name`/`kind`/span/
/// `is_exported`/`parent_name`); this degrades to 0 when no signature is
/// present.
fn count_params(signature: Option<&str>) -> u32 {
    let Some(sig) = signature else { return 0 };
    let Some(open) = sig.find('(') else { return 0 };
    let Some(close) = sig.rfind(')') else { return 0 };
    if close <= open + 1 {
        return 0;
    }
    let inner = &sig[open + 1..close];
    if inner.trim().is_empty() {
        return 0;
    }
    inner.matches(',').count() as u32 + 1
}

/// `(source_file, imported_name) -> import_path`, built from every
/// `kind == Import` reference across all files ( inputs).
fn build_import_map(files: &[FileInput]) -> HashMap<(String, String), String> {
    let mut imports = HashMap::new();
    for file in files {
        for reference in &file.output.references {
            if reference.kind != EdgeKind::Import {
                continue;
            }
            let Some(import_path) = &reference.import_path else { continue };
            let source_file = reference.source_file.clone().unwrap_or_else(|| file.path.clone());
            imports.insert((source_file, reference.target_name.clone()), import_path.clone());
        }
    }
    imports
}
