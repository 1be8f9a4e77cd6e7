//! QueryEngine: the read-only query catalogue over an indexed store.
//! Query-input problems (unknown name, empty changed set) are not `Err`s —
//! they come back as `QueryOutcome::Empty { note }` — so callers always get
//! a renderable result.

pub mod affected_tests;
pub mod blast_radius;
pub mod breaking_changes;
pub mod context;
pub mod coupling;
pub mod coverage_gaps;
pub mod dead_code;
pub mod fan;
pub mod grep;
pub mod pr_risk;

use std::collections::HashMap;

use crate::error::{QueryError, QueryResult};
use crate::model::{Edge, File, GitCochange, GraphMetrics, Symbol, SymbolMetrics};
use crate::store::SharedStore;
use crate::types::{FileId, SymbolId};

/// Either a query's proper result, or a structured empty result carrying a
/// human-readable reason: `QueryInputInvalid` / `GraphOversize` never
/// raise, they degrade to this.
pub enum QueryOutcome<T> {
    Ok(T),
    Empty { note: String },
}

impl<T> QueryOutcome<T> {
    pub fn empty(note: impl Into<String>) -> Self {
        Self::Empty { note: note.into() }
    }
}

/// A point-in-time, read-only snapshot of the store's contents, loaded once
/// per query-engine invocation: nothing here is cached beyond a single
/// call, matching the graph's own owned-by-the-current-invocation rule.
pub struct Corpus {
    pub files: HashMap<FileId, File>,
    pub symbols: HashMap<SymbolId, Symbol>,
    pub edges: Vec<Edge>,
    pub graph_metrics: HashMap<SymbolId, GraphMetrics>,
    pub symbol_metrics: HashMap<SymbolId, SymbolMetrics>,
    pub git_cochange: Vec<GitCochange>,

    /// Reverse index: target_id -> incoming edges.
    pub incoming: HashMap<SymbolId, Vec<Edge>>,
    /// Forward index: source_id -> outgoing edges.
    pub outgoing: HashMap<SymbolId, Vec<Edge>>,
    /// Lowercase-simple-name -> symbol ids sharing that name.
    pub by_name: HashMap<String, Vec<SymbolId>>,
}

impl Corpus {
    pub fn file_path(&self, file_id: FileId) -> Option<&str> {
        self.files.get(&file_id).map(|f| f.path.as_str())
    }

    pub fn is_test_file(&self, file_id: FileId) -> bool {
        self.files.get(&file_id).map(|f| f.file_role == crate::types::FileRole::Test).unwrap_or(false)
    }

    pub fn incoming_edges(&self, symbol_id: SymbolId) -> &[Edge] {
        self.incoming.get(&symbol_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outgoing_edges(&self, symbol_id: SymbolId) -> &[Edge] {
        self.outgoing.get(&symbol_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct QueryEngine {
    store: SharedStore,
}

impl QueryEngine {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Load a fresh `Corpus` from the store's current committed state.
    pub fn load(&self) -> QueryResult<Corpus> {
        let conn = self.store.reader().map_err(|e| QueryError::Storage(e.into()))?;

        let mut files = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT id, path, language, line_count, file_role, content_hash FROM files")
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load files", source }))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(File {
                        id: row.get(0)?,
                        path: row.get(1)?,
                        language: row.get(2)?,
                        line_count: row.get(3)?,
                        file_role: row.get(4)?,
                        content_hash: row.get(5)?,
                    })
                })
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load files", source }))?;
            for row in rows {
                let file = row.map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "read file row", source }))?;
                files.insert(file.id, file);
            }
        }

        let mut symbols = HashMap::new();
        let mut by_name: HashMap<String, Vec<SymbolId>> = HashMap::new();
        {
            let mut stmt = conn
                .prepare(
                    "SELECT id, file_id, name, qualified_name, kind, signature, line_start, line_end, \
                     docstring, visibility, is_exported, parent_name, default_value FROM symbols",
                )
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load symbols", source }))?;
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
                        visibility: row.get::<_, String>(9).map(|v| {
                            match v.as_str() {
                                "private" => crate::types::Visibility::Private,
                                "protected" => crate::types::Visibility::Protected,
                                "package" => crate::types::Visibility::Package,
                                _ => crate::types::Visibility::Public,
                            }
                        })?,
                        is_exported: row.get::<_, i64>(10)? != 0,
                        parent_name: row.get(11)?,
                        default_value: row.get(12)?,
                    })
                })
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load symbols", source }))?;
            for row in rows {
                let symbol = row.map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "read symbol row", source }))?;
                by_name.entry(symbol.name.to_ascii_lowercase()).or_default().push(symbol.id);
                symbols.insert(symbol.id, symbol);
            }
        }

        let mut edges = Vec::new();
        let mut incoming: HashMap<SymbolId, Vec<Edge>> = HashMap::new();
        let mut outgoing: HashMap<SymbolId, Vec<Edge>> = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT id, source_id, target_id, kind, line FROM edges")
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load edges", source }))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Edge {
                        id: row.get(0)?,
                        source_id: row.get(1)?,
                        target_id: row.get(2)?,
                        kind: row.get(3)?,
                        line: row.get(4)?,
                    })
                })
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load edges", source }))?;
            for row in rows {
                let edge = row.map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "read edge row", source }))?;
                incoming.entry(edge.target_id).or_default().push(edge);
                outgoing.entry(edge.source_id).or_default().push(edge);
                edges.push(edge);
            }
        }

        let mut graph_metrics = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT symbol_id, pagerank, in_degree, out_degree, betweenness FROM graph_metrics")
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load graph_metrics", source }))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(GraphMetrics {
                        symbol_id: row.get(0)?,
                        pagerank: row.get(1)?,
                        in_degree: row.get(2)?,
                        out_degree: row.get(3)?,
                        betweenness: row.get(4)?,
                    })
                })
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load graph_metrics", source }))?;
            for row in rows {
                let metrics = row.map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "read graph_metrics row", source }))?;
                graph_metrics.insert(metrics.symbol_id, metrics);
            }
        }

        let mut symbol_metrics = HashMap::new();
        {
            let mut stmt = conn
                .prepare(
                    "SELECT symbol_id, cognitive_complexity, nesting_depth, param_count, line_count, \
                     return_count, bool_op_count, callback_depth, cyclomatic_density, halstead_volume, \
                     halstead_difficulty, halstead_effort, halstead_bugs FROM symbol_metrics",
                )
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load symbol_metrics", source }))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SymbolMetrics {
                        symbol_id: row.get(0)?,
                        cognitive_complexity: row.get(1)?,
                        nesting_depth: row.get(2)?,
                        param_count: row.get(3)?,
                        line_count: row.get(4)?,
                        return_count: row.get(5)?,
                        bool_op_count: row.get(6)?,
                        callback_depth: row.get(7)?,
                        cyclomatic_density: row.get(8)?,
                        halstead_volume: row.get(9)?,
                        halstead_difficulty: row.get(10)?,
                        halstead_effort: row.get(11)?,
                        halstead_bugs: row.get(12)?,
                    })
                })
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load symbol_metrics", source }))?;
            for row in rows {
                let metrics = row.map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "read symbol_metrics row", source }))?;
                symbol_metrics.insert(metrics.symbol_id, metrics);
            }
        }

        let mut git_cochange = Vec::new();
        {
            let mut stmt = conn
                .prepare("SELECT file_id_a, file_id_b, cochange_count FROM git_cochange")
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load git_cochange", source }))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(GitCochange {
                        file_id_a: row.get(0)?,
                        file_id_b: row.get(1)?,
                        cochange_count: row.get(2)?,
                    })
                })
                .map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "load git_cochange", source }))?;
            for row in rows {
                git_cochange.push(row.map_err(|source| QueryError::Storage(crate::error::StorageError::Sqlite { operation: "read git_cochange row", source }))?);
            }
        }

        Ok(Corpus { files, symbols, edges, graph_metrics, symbol_metrics, git_cochange, incoming, outgoing, by_name })
    }
}

/// Build a `Graph` over every symbol in `corpus`, used by queries that need
/// BFS (blast radius, affected tests) rather than flat edge lookups.
pub fn build_graph(corpus: &Corpus) -> crate::graph::Graph {
    crate::graph::Graph::build(corpus.symbols.keys().copied(), &corpus.edges)
}

/// Shared by sibling query modules' unit tests, which otherwise all need to
/// hand-build an empty `Corpus`.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::Corpus;
    use std::collections::HashMap;

    pub fn empty_corpus() -> Corpus {
        Corpus {
            files: HashMap::new(),
            symbols: HashMap::new(),
            edges: Vec::new(),
            graph_metrics: HashMap::new(),
            symbol_metrics: HashMap::new(),
            git_cochange: Vec::new(),
            incoming: HashMap::new(),
            outgoing: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_store_yields_empty_corpus() {
        let store = std::sync::Arc::new(crate::store::Store::open_in_memory().unwrap());
        let engine = QueryEngine::new(store);
        let corpus = engine.load().unwrap();
        assert!(corpus.symbols.is_empty());
        assert!(corpus.edges.is_empty());
    }
}
