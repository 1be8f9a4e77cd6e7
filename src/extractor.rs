//! The extractor contract: a per-language frontend hands the core
//! a flat list of symbols, references, and a lightweight AST node stream used
//! only for complexity metrics. The core never parses source itself.

use crate::types::{LineSpan, SymbolKind, Visibility};
use serde::{Deserialize, Serialize};

/// Raw symbol as produced by a language frontend, before the Store assigns
/// it a `SymbolId`. Only `name`, `qualified_name`, `kind`, `span`, and
/// `is_exported`/`parent_name` are relied upon by the core; everything else
/// is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSymbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub span: LineSpan,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub visibility: Visibility,
    pub is_exported: bool,
    pub parent_name: Option<String>,
    pub default_value: Option<String>,
}

/// A reference from one name to another, as seen lexically by the frontend.
/// Resolution to a concrete `SymbolId` target happens later, in the Resolver
///. `target_name` is the only mandatory field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub source_name: Option<String>,
    pub target_name: String,
    pub kind: crate::types::EdgeKind,
    pub line: u32,
    pub import_path: Option<String>,
    pub source_file: Option<String>,
}

/// Coarse classification of an AST node used by per-symbol complexity
/// metrics. The core is language-agnostic: it only needs to know which
/// lexical constructs count as branching, loops, boolean operators,
/// returns, and nested function expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AstNodeKind {
    Branch,
    Loop,
    BoolOp,
    Return,
    NestedFunction,
    Other,
}

/// A single node in the per-symbol AST stream Metrics consumes. `depth` is
/// the lexical nesting depth of this node within its enclosing symbol body,
/// counting from 0 at the symbol's top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: AstNodeKind,
    pub depth: u32,
}

/// Everything a frontend produces for one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractorOutput {
    pub symbols: Vec<RawSymbol>,
    pub references: Vec<Reference>,
    /// AST node stream per symbol, keyed by the symbol's index in `symbols`.
    pub ast_nodes: std::collections::HashMap<usize, Vec<AstNode>>,
    pub language: Option<String>,
}

/// A per-language frontend. The core ships no implementations of this trait;
/// callers (the `roam` CLI, or embedders of `roam-core`) supply one per
/// language they want indexed.
pub trait SymbolExtractor: Send + Sync {
    /// Extract symbols, references, and AST node streams from one file's
    /// source text.
    fn extract(&self, path: &str, source: &str) -> ExtractorOutput;

    /// File extensions this extractor claims, without the leading dot
    /// (e.g. `["rs"]`).
    fn extensions(&self) -> &[&str];
}

/// A frontend that extracts nothing. Lets `roam index` walk and register
/// files (line counts, file-role classification, content hashes) without a
/// real language parser wired in, since real extractors are explicitly out
/// of scope for this core. `tests/` substitutes a
/// `FixtureExtractor` built from literal `RawSymbol`/`Reference` lists where
/// ingestion/resolution behavior actually needs exercising.
#[derive(Debug, Default)]
pub struct NullExtractor;

impl SymbolExtractor for NullExtractor {
    fn extract(&self, _path: &str, _source: &str) -> ExtractorOutput {
        ExtractorOutput::default()
    }

    fn extensions(&self) -> &[&str] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_output_defaults_empty() {
        let out = ExtractorOutput::default();
        assert!(out.symbols.is_empty());
        assert!(out.references.is_empty());
        assert!(out.ast_nodes.is_empty());
    }

    #[test]
    fn test_null_extractor_yields_empty_output() {
        let extractor = NullExtractor;
        let out = extractor.extract("src/lib.rs", "fn main() {}");
        assert!(out.symbols.is_empty());
        assert!(out.references.is_empty());
    }
}
