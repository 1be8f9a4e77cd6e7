//! Git collaborator: changed-file enumeration for PR-risk and
//! affected-tests queries, plus ingestion of commit/co-change history into
//! `git_commits`/`git_file_changes`/`git_cochange`.
//!
//! A thin wrapper struct around `git2::Repository` behind a Cargo feature,
//! walking commits/trees rather than shelling out to the `git` binary. A
//! repository that can't be opened is `GitUnavailable`, not an error:
//! callers fall back to an empty changed-file list and skip co-change
//! ingestion entirely.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::IndexResult;
use crate::model::{GitCochange, GitCommit};
use crate::store::Store;
use crate::types::FileId;

/// One commit's metadata plus per-file line-change counts, the raw shape
/// `ingest_history` turns into `git_commits`/`git_file_changes`/
/// `git_cochange` rows.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub sha: String,
    pub author: String,
    pub timestamp: i64,
    pub file_changes: Vec<(PathBuf, u32, u32)>,
}

/// What range of history to enumerate changed paths over.
#[derive(Debug, Clone)]
pub enum ChangeScope {
    /// Uncommitted changes in the working tree against HEAD.
    WorkingTree,
    /// Only the staged (index) changes against HEAD.
    Staged,
    /// Changed paths between two commit-ish refs, e.g. `main..feature`.
    CommitRange { from: String, to: String },
}

/// Pluggable changed-file source. `Git2ChangedFileSource` is the
/// default implementation; tests substitute a fixture source the same way
/// ingestion substitutes a `FixtureExtractor` for `SymbolExtractor`.
pub trait ChangedFileSource {
    fn changed_paths(&self, scope: ChangeScope) -> IndexResult<Vec<PathBuf>>;
}

/// Always reports no changed paths. The fallback used when a repository
/// can't be opened or when the `git` feature is compiled out.
pub struct GitUnavailable;

impl ChangedFileSource for GitUnavailable {
    fn changed_paths(&self, _scope: ChangeScope) -> IndexResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

#[cfg(feature = "git")]
pub struct Git2ChangedFileSource {
    repo: git2::Repository,
    workdir: PathBuf,
}

#[cfg(feature = "git")]
impl Git2ChangedFileSource {
    /// Open the git repository containing `path`. Returns `GitUnavailable`
    /// behavior (via the `open_or_unavailable` helper below) rather than a
    /// hard error when there's no repository there, matching the contract.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, git2::Error> {
        let repo = git2::Repository::discover(path)?;
        let workdir = repo.workdir().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { repo, workdir })
    }

    fn diff_paths(&self, diff: &git2::Diff<'_>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let _ = diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                    paths.push(self.workdir.join(path));
                }
                true
            },
            None,
            None,
            None,
        );
        paths
    }

    /// Per-file added/removed line counts for `diff`, keyed by path relative
    /// to the repo root (not joined with `workdir`, since these feed the
    /// store's file-path lookup directly).
    fn diff_line_counts(&self, diff: &git2::Diff<'_>) -> HashMap<PathBuf, (u32, u32)> {
        let counts = std::cell::RefCell::new(HashMap::<PathBuf, (u32, u32)>::new());
        let _ = diff.foreach(
            &mut |_, _| true,
            None,
            None,
            Some(&mut |delta, _hunk, line| {
                let path = delta.new_file().path().or_else(|| delta.old_file().path());
                if let Some(path) = path {
                    let mut counts = counts.borrow_mut();
                    let entry = counts.entry(path.to_path_buf()).or_insert((0, 0));
                    match line.origin() {
                        '+' => entry.0 += 1,
                        '-' => entry.1 += 1,
                        _ => {}
                    }
                }
                true
            }),
        );
        counts.into_inner()
    }

    /// Walk the commit log (most recent first) and collect, per commit,
    /// author/timestamp plus per-file line-change counts against that
    /// commit's first parent (root commits diff against an empty tree).
    pub fn commit_history(&self, max_commits: usize) -> Result<Vec<CommitRecord>, git2::Error> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;

        let mut history = Vec::new();
        for oid in revwalk.take(max_commits) {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let tree = commit.tree()?;
            let parent_tree = commit.parents().next().and_then(|p| p.tree().ok());
            let diff = self.repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
            let line_counts = self.diff_line_counts(&diff);

            let file_changes = line_counts.into_iter().map(|(path, (added, removed))| (path, added, removed)).collect();
            history.push(CommitRecord {
                sha: oid.to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
                timestamp: commit.time().seconds(),
                file_changes,
            });
        }
        Ok(history)
    }
}

#[cfg(feature = "git")]
impl ChangedFileSource for Git2ChangedFileSource {
    fn changed_paths(&self, scope: ChangeScope) -> IndexResult<Vec<PathBuf>> {
        let diff = match scope {
            ChangeScope::WorkingTree => self.repo.diff_index_to_workdir(None, None),
            ChangeScope::Staged => {
                let head_tree = self.repo.head().and_then(|h| h.peel_to_tree());
                match head_tree {
                    Ok(tree) => self.repo.diff_tree_to_index(Some(&tree), None, None),
                    Err(_) => self.repo.diff_tree_to_index(None, None, None),
                }
            }
            ChangeScope::CommitRange { from, to } => (|| -> Result<git2::Diff<'_>, git2::Error> {
                let from_obj = self.repo.revparse_single(&from)?.peel_to_tree()?;
                let to_obj = self.repo.revparse_single(&to)?.peel_to_tree()?;
                self.repo.diff_tree_to_tree(Some(&from_obj), Some(&to_obj), None)
            })(),
        };

        match diff {
            Ok(diff) => Ok(self.diff_paths(&diff)),
            Err(_) => Ok(Vec::new()),
        }
    }
}

/// Open a `Git2ChangedFileSource` at `path` when the `git` feature is
/// compiled in and a repository is actually present; otherwise fall back to
/// `GitUnavailable` rather than propagating an error.
pub fn open_changed_file_source(path: impl AsRef<Path>) -> Box<dyn ChangedFileSource> {
    #[cfg(feature = "git")]
    {
        match Git2ChangedFileSource::open(path) {
            Ok(source) => Box::new(source),
            Err(_) => Box::new(GitUnavailable),
        }
    }
    #[cfg(not(feature = "git"))]
    {
        let _ = path;
        Box::new(GitUnavailable)
    }
}

/// Ingest commit/co-change history for `file_ids_by_path` (already-indexed
/// files, keyed by their store-relative path) from `history` — the output of
/// `Git2ChangedFileSource::commit_history` — into `git_commits`,
/// `git_file_changes`, and `git_cochange`. A commit touching only
/// files outside the index is still recorded (for blame/authorship history)
/// but contributes no co-change pairs; commits are capped at whatever
/// `max_commits` the caller passed to `commit_history`.
pub fn ingest_history(
    store: &Store,
    file_ids_by_path: &HashMap<String, FileId>,
    history: &[CommitRecord],
) -> crate::error::StorageResult<()> {
    let mut cochange_counts: HashMap<(FileId, FileId), u32> = HashMap::new();

    store.with_transaction(|tx| {
        for commit in history {
            let mut touched: Vec<FileId> = Vec::new();
            for (path, added, removed) in &commit.file_changes {
                let key = path.to_string_lossy().replace('\\', "/");
                let Some(&file_id) = file_ids_by_path.get(&key) else { continue };
                touched.push(file_id);

                tx.execute(
                    "INSERT OR IGNORE INTO git_commits (sha, author, timestamp) VALUES (?1, ?2, ?3)",
                    rusqlite::params![commit.sha, commit.author, commit.timestamp],
                )
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert git commit", source })?;

                tx.execute(
                    "INSERT OR IGNORE INTO git_file_changes (sha, file_id, lines_added, lines_removed) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![commit.sha, file_id, added, removed],
                )
                .map_err(|source| crate::error::StorageError::Sqlite { operation: "insert git file change", source })?;
            }

            for i in 0..touched.len() {
                for j in (i + 1)..touched.len() {
                    let pair = GitCochange::new(touched[i], touched[j], 1);
                    *cochange_counts.entry((pair.file_id_a, pair.file_id_b)).or_insert(0) += 1;
                }
            }
        }

        for ((a, b), count) in &cochange_counts {
            tx.execute(
                "INSERT INTO git_cochange (file_id_a, file_id_b, cochange_count) VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_id_a, file_id_b) DO UPDATE SET cochange_count = cochange_count + excluded.cochange_count",
                rusqlite::params![a, b, count],
            )
            .map_err(|source| crate::error::StorageError::Sqlite { operation: "upsert git cochange", source })?;
        }

        Ok(())
    })
}

/// Load all `GitCommit` rows touching a given file, newest first — used by
/// `coupling`'s file-history-driven queries and by `FileStats` recomputation.
pub fn commits_touching(store: &Store, file_id: FileId) -> crate::error::StorageResult<Vec<GitCommit>> {
    let conn = store.reader()?;
    let mut stmt = conn
        .prepare(
            "SELECT c.sha, c.author, c.timestamp FROM git_commits c
             JOIN git_file_changes fc ON fc.sha = c.sha
             WHERE fc.file_id = ?1
             ORDER BY c.timestamp DESC",
        )
        .map_err(|source| crate::error::StorageError::Sqlite { operation: "prepare commits_touching", source })?;
    let rows = stmt
        .query_map(rusqlite::params![file_id], |row| {
            Ok(GitCommit { sha: row.get(0)?, author: row.get(1)?, timestamp: row.get(2)? })
        })
        .map_err(|source| crate::error::StorageError::Sqlite { operation: "query commits_touching", source })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|source| crate::error::StorageError::Sqlite { operation: "read commit row", source })?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_unavailable_returns_empty() {
        let source = GitUnavailable;
        let result = source.changed_paths(ChangeScope::WorkingTree).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_ingest_history_populates_cochange_for_pairs_touched_together() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_transaction(|tx| {
                tx.execute("INSERT INTO files (id, path, line_count, file_role) VALUES (1, 'a.rs', 1, 'source')", [])
                    .unwrap();
                tx.execute("INSERT INTO files (id, path, line_count, file_role) VALUES (2, 'b.rs', 1, 'source')", [])
                    .unwrap();
                Ok(())
            })
            .unwrap();

        let mut file_ids = HashMap::new();
        file_ids.insert("a.rs".to_string(), FileId::new(1).unwrap());
        file_ids.insert("b.rs".to_string(), FileId::new(2).unwrap());

        let history = vec![CommitRecord {
            sha: "deadbeef".to_string(),
            author: "jane".to_string(),
            timestamp: 1_700_000_000,
            file_changes: vec![(PathBuf::from("a.rs"), 5, 2), (PathBuf::from("b.rs"), 1, 0)],
        }];

        ingest_history(&store, &file_ids, &history).unwrap();

        let conn = store.reader().unwrap();
        let count: u32 = conn
            .query_row("SELECT cochange_count FROM git_cochange WHERE file_id_a = 1 AND file_id_b = 2", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let commits = commits_touching(&store, FileId::new(1).unwrap()).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].sha, "deadbeef");
    }

    #[test]
    fn test_ingest_history_skips_commits_touching_no_indexed_files() {
        let store = Store::open_in_memory().unwrap();
        let file_ids = HashMap::new();
        let history = vec![CommitRecord {
            sha: "deadbeef".to_string(),
            author: "jane".to_string(),
            timestamp: 1_700_000_000,
            file_changes: vec![(PathBuf::from("untracked.rs"), 1, 0)],
        }];
        ingest_history(&store, &file_ids, &history).unwrap();

        let conn = store.reader().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM git_commits", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 0);
    }
}
