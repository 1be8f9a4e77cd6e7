//! Schema DDL and additive migrations.
//!
//! The schema is versioned only implicitly: every change after the initial
//! tables is a single `ALTER TABLE ... ADD COLUMN`, applied in order and
//! tolerant of prior application.

/// Executed once against a fresh or existing database, inside `Store::open`.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id            INTEGER PRIMARY KEY,
    path          TEXT NOT NULL UNIQUE,
    language      TEXT,
    line_count    INTEGER NOT NULL DEFAULT 0,
    file_role     TEXT NOT NULL DEFAULT 'source',
    content_hash  TEXT
);

CREATE TABLE IF NOT EXISTS symbols (
    id              INTEGER PRIMARY KEY,
    file_id         INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    qualified_name  TEXT NOT NULL,
    kind            TEXT NOT NULL,
    signature       TEXT,
    line_start      INTEGER NOT NULL,
    line_end        INTEGER NOT NULL,
    docstring       TEXT,
    visibility      TEXT NOT NULL DEFAULT 'public',
    is_exported     INTEGER NOT NULL DEFAULT 0,
    parent_name     TEXT,
    default_value   TEXT
);

CREATE INDEX IF NOT EXISTS idx_symbols_file_id ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_symbols_qualified_name ON symbols(qualified_name);

CREATE TABLE IF NOT EXISTS edges (
    id          INTEGER PRIMARY KEY,
    source_id   INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    target_id   INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    kind        TEXT NOT NULL,
    line        INTEGER NOT NULL,
    UNIQUE(source_id, target_id, kind)
);

CREATE INDEX IF NOT EXISTS idx_edges_source_id ON edges(source_id);
CREATE INDEX IF NOT EXISTS idx_edges_target_id ON edges(target_id);

CREATE TABLE IF NOT EXISTS file_edges (
    source_file_id  INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    target_file_id  INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    kind            TEXT NOT NULL DEFAULT 'imports',
    symbol_count    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (source_file_id, target_file_id),
    CHECK (source_file_id != target_file_id)
);

CREATE TABLE IF NOT EXISTS graph_metrics (
    symbol_id   INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    pagerank    REAL NOT NULL DEFAULT 0.0,
    in_degree   INTEGER NOT NULL DEFAULT 0,
    out_degree  INTEGER NOT NULL DEFAULT 0,
    betweenness REAL NOT NULL DEFAULT 0.0
);

CREATE TABLE IF NOT EXISTS symbol_metrics (
    symbol_id            INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    cognitive_complexity INTEGER NOT NULL DEFAULT 0,
    nesting_depth        INTEGER NOT NULL DEFAULT 0,
    param_count          INTEGER NOT NULL DEFAULT 0,
    line_count           INTEGER NOT NULL DEFAULT 0,
    return_count         INTEGER NOT NULL DEFAULT 0,
    bool_op_count        INTEGER NOT NULL DEFAULT 0,
    callback_depth       INTEGER NOT NULL DEFAULT 0,
    cyclomatic_density   REAL NOT NULL DEFAULT 0.0,
    halstead_volume      REAL NOT NULL DEFAULT 0.0,
    halstead_difficulty  REAL NOT NULL DEFAULT 0.0,
    halstead_effort      REAL NOT NULL DEFAULT 0.0,
    halstead_bugs        REAL NOT NULL DEFAULT 0.0
);

CREATE TABLE IF NOT EXISTS clusters (
    symbol_id     INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    cluster_id    INTEGER NOT NULL,
    cluster_label TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clusters_cluster_id ON clusters(cluster_id);

CREATE TABLE IF NOT EXISTS file_stats (
    file_id          INTEGER PRIMARY KEY REFERENCES files(id) ON DELETE CASCADE,
    commit_count     INTEGER NOT NULL DEFAULT 0,
    total_churn      INTEGER NOT NULL DEFAULT 0,
    distinct_authors INTEGER NOT NULL DEFAULT 0,
    complexity       REAL NOT NULL DEFAULT 0.0,
    health_score     REAL NOT NULL DEFAULT 0.0,
    cochange_entropy REAL NOT NULL DEFAULT 0.0,
    cognitive_load   REAL NOT NULL DEFAULT 0.0
);

CREATE TABLE IF NOT EXISTS git_cochange (
    file_id_a      INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    file_id_b      INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    cochange_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (file_id_a, file_id_b),
    CHECK (file_id_a < file_id_b)
);

CREATE TABLE IF NOT EXISTS git_commits (
    sha       TEXT PRIMARY KEY,
    author    TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS git_file_changes (
    sha           TEXT NOT NULL REFERENCES git_commits(sha) ON DELETE CASCADE,
    file_id       INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    lines_added   INTEGER NOT NULL DEFAULT 0,
    lines_removed INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (sha, file_id)
);

CREATE TABLE IF NOT EXISTS snapshots (
    id       INTEGER PRIMARY KEY,
    taken_at INTEGER NOT NULL,
    metrics  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snapshots_taken_at ON snapshots(taken_at);
"#;

/// Additive migrations applied in order after `SCHEMA`. Each statement must
/// be idempotent against the "duplicate column name" SQLite error, which the
/// caller (`Store::open`) swallows.
pub const MIGRATIONS: &[&str] = &[
    // Reserved for future columns. Example shape:
    // "ALTER TABLE files ADD COLUMN last_indexed_at INTEGER",
];
