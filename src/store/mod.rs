//! The embedded relational store.
//!
//! Single writer, many readers: one pooled connection configured
//! for exclusive writes, a separate pool of read-only connections for
//! queries, all on top of `rusqlite` as an embedded relational store.

pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::{StorageError, StorageResult};

/// Cloud-sync directory markers that force rollback-journal durability:
/// these filesystems frequently lie about fsync/mmap semantics, so WAL's
/// shared-memory file is unsafe there.
const CLOUD_SYNC_MARKERS: &[&str] = ["onedrive", "dropbox", "google drive", "icloud"];

fn looks_like_cloud_sync(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    CLOUD_SYNC_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// The Store. Holds a single exclusive writer connection (behind a mutex, so
/// callers can't interleave writes from multiple threads) and an r2d2 pool of
/// read-only connections.
pub struct Store {
    path: PathBuf,
    writer: Mutex<Connection>,
    readers: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (creating if absent) the store at `path`, apply schema DDL and
    /// pending migrations, and configure pragmas .
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let is_memory = path.as_os_str() == ":memory:";

        // Bare ":memory:" gives every connection its own private database;
        // the pooled readers would never see what the writer commits. A
        // named, shared-cache URI keeps one logical database alive for as
        // long as the writer connection (held for the Store's lifetime) is
        // open, which every reader then attaches to.
        let conn_target = if is_memory {
            format!("file:roam-store-{:p}?mode=memory&cache=shared", &path)
        } else {
            path.to_string_lossy().into_owned()
        };

        if !is_memory {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::FileRead {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let writer = Connection::open(&conn_target).map_err(|source| StorageError::Sqlite {
            operation: "open writer connection",
            source,
        })?;
        configure_connection(&writer, &path, is_memory)?;
        initialize_schema(&writer)?;

        let manager = SqliteConnectionManager::file(&conn_target).with_init(move |conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "query_only", "ON")?;
            Ok(())
        });
        let readers = Pool::builder()
            .max_size(num_cpus::get().max(2) as u32)
            .build(manager)
            .map_err(StorageError::Pool)?;

        Ok(Self { path, writer: Mutex::new(writer), readers })
    }

    /// Open a fresh in-memory store, used by tests and short-lived CLI
    /// invocations that don't need to persist across process exits.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open(":memory:")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with exclusive access to the single writer connection, inside
    /// a transaction. Used by ingestion for one-transaction-per-file (or
    /// per-phase) writes.
    pub fn with_writer<T>(&self, f: impl FnOnce(&Connection) -> StorageResult<T>) -> StorageResult<T> {
        let conn = self.writer.lock();
        f(&conn)
    }

    /// Run `f` with exclusive access to the writer connection wrapped in an
    /// explicit transaction, committing on `Ok` and rolling back on `Err`.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self.writer.lock();
        let tx = conn.transaction().map_err(|source| StorageError::Sqlite {
            operation: "begin transaction",
            source,
        })?;
        let result = f(&tx)?;
        tx.commit().map_err(|source| StorageError::Sqlite {
            operation: "commit transaction",
            source,
        })?;
        Ok(result)
    }

    /// Borrow a pooled read-only connection.
    pub fn reader(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.readers.get().map_err(StorageError::Pool)
    }

    /// Whether the store currently has any indexed content at all.
    pub fn is_empty(&self) -> StorageResult<bool> {
        let conn = self.reader()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .map_err(|source| StorageError::Sqlite { operation: "count files", source })?;
        Ok(count == 0)
    }
}

fn configure_connection(conn: &Connection, path: &Path, is_memory: bool) -> StorageResult<()> {
    if !is_memory {
        let journal_mode = if looks_like_cloud_sync(path) { "DELETE" } else { "WAL" };
        conn.pragma_update(None, "journal_mode", journal_mode)
            .map_err(|source| StorageError::Sqlite { operation: "set journal_mode", source })?;
        if looks_like_cloud_sync(path) {
            conn.pragma_update(None, "locking_mode", "EXCLUSIVE")
                .map_err(|source| StorageError::Sqlite { operation: "set locking_mode", source })?;
        }
    }
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|source| StorageError::Sqlite { operation: "set synchronous", source })?;
    conn.pragma_update(None, "cache_size", -65536i64)
        .map_err(|source| StorageError::Sqlite { operation: "set cache_size", source })?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|source| StorageError::Sqlite { operation: "enable foreign_keys", source })?;
    Ok(())
}

fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(schema::SCHEMA)
        .map_err(|source| StorageError::Sqlite { operation: "initialize schema", source })?;
    for migration in schema::MIGRATIONS {
        match conn.execute_batch(migration) {
            Ok(()) => {}
            Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                if msg.contains("duplicate column name") => {}
            Err(source) => {
                return Err(StorageError::SchemaMismatch { reason: source.to_string() });
            }
        }
    }
    Ok(())
}

/// Default placeholders-per-chunk cap: "nominally 400 per `{ph}`
/// token". Conservative relative to SQLite's actual `SQLITE_MAX_VARIABLE_NUMBER`.
pub const DEFAULT_BATCH_SIZE: usize = 400;

/// Split `ids` into chunks and substitute each chunk's comma-separated `?`
/// placeholders into every `{ph}` occurrence of `sql_template`, invoking
/// `f` once per chunk. Used by bulk ingestion/read paths that would
/// otherwise build one giant `IN (...)` clause.
pub fn batched_in<T, R>(
    sql_template: &str,
    ids: &[T],
    batch_size: usize,
    mut f: impl FnMut(&str, &[T]) -> StorageResult<R>,
) -> StorageResult<Vec<R>>
where
    T: Clone,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::new();
    for chunk in ids.chunks(batch_size) {
        let placeholders = std::iter::repeat("?").take(chunk.len()).collect::<Vec<_>>().join(",");
        let sql = sql_template.replace("{ph}", &placeholders);
        results.push(f(&sql, chunk)?);
    }
    Ok(results)
}

/// Shared, clonable handle used by components that need the store without
/// owning it (QueryEngine, HealthEngine, FitnessEngine are all read-only
/// consumers ).
pub type SharedStore = Arc<Store>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_creates_schema() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_cloud_sync_detection() {
        assert!(looks_like_cloud_sync(Path::new("/Users/x/Dropbox/proj/.roam/index.db")));
        assert!(looks_like_cloud_sync(Path::new("/Users/x/OneDrive/proj/.roam/index.db")));
        assert!(!looks_like_cloud_sync(Path::new("/home/x/proj/.roam/index.db")));
    }

    #[test]
    fn test_batched_in_chunks() {
        let ids: Vec<i64> = (1..=10).collect();
        let chunks = batched_in("DELETE FROM symbols WHERE id IN ({ph})", &ids, 3, |sql, chunk| {
            assert!(sql.contains("?,?,?") || chunk.len() < 3);
            Ok(chunk.len())
        })
        .unwrap();
        assert_eq!(chunks, vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_with_transaction_commits() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_transaction(|tx| {
                tx.execute(
                    "INSERT INTO files (path, line_count, file_role) VALUES (?1, ?2, ?3)",
                    rusqlite::params!["src/lib.rs", 10, "source"],
                )
                .map_err(|source| StorageError::Sqlite { operation: "insert file", source })?;
                Ok(())
            })
            .unwrap();
        assert!(!store.is_empty().unwrap());
    }
}
