//! Entity records persisted in the Store.
//!
//! These are plain data structs: the Store owns how they are read and
//! written, the rest of the engine only ever sees these shapes.

use crate::types::{ClusterId, EdgeId, EdgeKind, FileId, FileRole, LineSpan, SymbolId, SymbolKind, Visibility};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub path: String,
    pub language: Option<String>,
    pub line_count: u32,
    pub file_role: FileRole,
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub file_id: FileId,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub signature: Option<String>,
    pub span: LineSpan,
    pub docstring: Option<String>,
    pub visibility: Visibility,
    pub is_exported: bool,
    pub parent_name: Option<String>,
    pub default_value: Option<String>,
}

impl Symbol {
    /// The segment of `qualified_name` before the last `::` or `.` separator,
    /// used by the Resolver to compute `source_parent`.
    pub fn parent_qualifier(&self) -> Option<&str> {
        let idx = self.qualified_name.rfind("::").map(|i| (i, 2)).or_else(|| {
            self.qualified_name.rfind('.').map(|i| (i, 1))
        });
        idx.map(|(i, _)| &self.qualified_name[..i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source_id: SymbolId,
    pub target_id: SymbolId,
    pub kind: EdgeKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEdge {
    pub source_file_id: FileId,
    pub target_file_id: FileId,
    pub symbol_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub symbol_id: SymbolId,
    pub pagerank: f64,
    pub in_degree: u32,
    pub out_degree: u32,
    pub betweenness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetrics {
    pub symbol_id: SymbolId,
    pub cognitive_complexity: u32,
    pub nesting_depth: u32,
    pub param_count: u32,
    pub line_count: u32,
    pub return_count: u32,
    pub bool_op_count: u32,
    pub callback_depth: u32,
    pub cyclomatic_density: f64,
    pub halstead_volume: f64,
    pub halstead_difficulty: f64,
    pub halstead_effort: f64,
    pub halstead_bugs: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub symbol_id: SymbolId,
    pub cluster_id: ClusterId,
    pub cluster_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    pub file_id: FileId,
    pub commit_count: u32,
    pub total_churn: u32,
    pub distinct_authors: u32,
    pub complexity: f64,
    pub health_score: f64,
    pub cochange_entropy: f64,
    pub cognitive_load: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCochange {
    pub file_id_a: FileId,
    pub file_id_b: FileId,
    pub cochange_count: u32,
}

impl GitCochange {
    /// Invariant: `a < b`. Construct the normalized pair.
    pub fn new(x: FileId, y: FileId, cochange_count: u32) -> Self {
        if x.value() < y.value() {
            Self { file_id_a: x, file_id_b: y, cochange_count }
        } else {
            Self { file_id_a: y, file_id_b: x, cochange_count }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub author: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFileChange {
    pub file_id: FileId,
    pub lines_added: u32,
    pub lines_removed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub taken_at: i64,
    pub metrics: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(qualified_name: &str) -> Symbol {
        Symbol {
            id: SymbolId::new(1).unwrap(),
            file_id: FileId::new(1).unwrap(),
            name: "x".into(),
            qualified_name: qualified_name.into(),
            kind: SymbolKind::Function,
            signature: None,
            span: LineSpan::new(1, 2),
            docstring: None,
            visibility: Visibility::Public,
            is_exported: true,
            parent_name: None,
            default_value: None,
        }
    }

    #[test]
    fn test_parent_qualifier_double_colon() {
        let s = sym("crate::foo::bar");
        assert_eq!(s.parent_qualifier(), Some("crate::foo"));
    }

    #[test]
    fn test_parent_qualifier_dot() {
        let s = sym("module.Class");
        assert_eq!(s.parent_qualifier(), Some("module"));
    }

    #[test]
    fn test_parent_qualifier_none() {
        let s = sym("bar");
        assert_eq!(s.parent_qualifier(), None);
    }

    #[test]
    fn test_git_cochange_normalizes_pair() {
        let a = FileId::new(5).unwrap();
        let b = FileId::new(2).unwrap();
        let cc = GitCochange::new(a, b, 3);
        assert_eq!(cc.file_id_a, b);
        assert_eq!(cc.file_id_b, a);
    }
}
