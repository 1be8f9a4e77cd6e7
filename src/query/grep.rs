//! Grep query: case-insensitive substring search over name,
//! qualified_name, and signature.

use super::Corpus;
use crate::types::{FileId, SymbolId, SymbolKind};

#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub kind: Option<SymbolKind>,
    pub file_id: Option<FileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrepHit {
    pub symbol_id: SymbolId,
}

pub fn run(corpus: &Corpus, pattern: &str, filters: &Filters) -> Vec<GrepHit> {
    let lowered = pattern.to_ascii_lowercase();
    let mut hits: Vec<GrepHit> = corpus
        .symbols
        .values()
        .filter(|s| filters.kind.map(|k| k == s.kind).unwrap_or(true))
        .filter(|s| filters.file_id.map(|f| f == s.file_id).unwrap_or(true))
        .filter(|s| {
            s.name.to_ascii_lowercase().contains(&lowered)
                || s.qualified_name.to_ascii_lowercase().contains(&lowered)
                || s.signature.as_deref().map(|sig| sig.to_ascii_lowercase().contains(&lowered)).unwrap_or(false)
        })
        .map(|s| GrepHit { symbol_id: s.id })
        .collect();

    hits.sort_by_key(|h| h.symbol_id.value());
    hits
}
