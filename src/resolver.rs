//! Resolver: converts the extractor's name-based references into
//! concrete `Symbol -> Symbol` edges.
//!
//! A two-pass, priority-chain disambiguation: local candidate, then
//! same-directory, then first-in-order. There is no `LanguageBehavior`
//! abstraction at this layer, so locality is judged on a same-directory/
//! is_exported axis directly, with explicit import-path normalization
//! rules standing in for a single language-specific import-match call.

use std::collections::{HashMap, HashSet};

use crate::extractor::Reference;
use crate::model::{Edge, FileEdge, Symbol};
use crate::types::{EdgeId, EdgeKind, FileId, SymbolId, SymbolKind};

/// A resolvable candidate, with just the fields the disambiguation chain
/// needs. Built once per `resolve_all` call from the live `Symbol` table.
#[derive(Debug, Clone)]
struct Candidate<'a> {
    symbol: &'a Symbol,
    file_path: &'a str,
}

/// Everything the Resolver needs about the symbol table and import map for
/// one resolution pass. Built by the caller (the ingestion pipeline) from
/// Store reads.
pub struct ResolverInput<'a> {
    /// All symbols, keyed by id.
    pub symbols: &'a HashMap<SymbolId, Symbol>,
    /// File path by id, used for locality/directory comparisons.
    pub file_paths: &'a HashMap<FileId, String>,
    /// `(source_file_path, imported_name) -> import_path`, built from
    /// reference records whose `kind == Import`.
    pub imports: &'a HashMap<(String, String), String>,
}

/// Resolves a batch of references for a single file (or the whole repo, if
/// re-resolving) into deduplicated edges.
pub struct Resolver<'a> {
    input: &'a ResolverInput<'a>,
    by_name: HashMap<&'a str, Vec<SymbolId>>,
    by_qualified_name: HashMap<&'a str, Vec<SymbolId>>,
}

impl<'a> Resolver<'a> {
    pub fn new(input: &'a ResolverInput<'a>) -> Self {
        let mut by_name: HashMap<&str, Vec<SymbolId>> = HashMap::new();
        let mut by_qualified_name: HashMap<&str, Vec<SymbolId>> = HashMap::new();
        for (id, symbol) in input.symbols {
            by_name.entry(symbol.name.as_str()).or_default().push(*id);
            by_qualified_name.entry(symbol.qualified_name.as_str()).or_default().push(*id);
        }
        Self { input, by_name, by_qualified_name }
    }

    /// Resolve every reference in `file_symbols` (symbols belonging to the
    /// file the references came from, sorted by `line_start`) against
    /// `references`. Returns deduplicated edges.
    pub fn resolve_file(
        &self,
        file_id: FileId,
        file_symbols: &[SymbolId],
        references: &[Reference],
    ) -> Vec<Edge> {
        let mut seen: HashSet<(SymbolId, SymbolId, EdgeKind)> = HashSet::new();
        let mut edges = Vec::new();
        let mut next_edge_seq: u64 = 1;

        let source_path = self.input.file_paths.get(&file_id).map(String::as_str).unwrap_or("");

        for reference in references {
            if reference.kind == EdgeKind::Import {
                // Imports feed the import-path map built by the caller; they
                // do not themselves become edges.
                continue;
            }

            let Some(source_id) =
                self.resolve_source(file_symbols, reference.source_name.as_deref(), reference.line)
            else {
                continue;
            };
            let source_symbol = match self.input.symbols.get(&source_id) {
                Some(s) => s,
                None => continue,
            };
            let source_parent = source_symbol.parent_qualifier().unwrap_or("");

            let Some(target_id) = self.resolve_target(
                &reference.target_name,
                reference.kind,
                source_id,
                source_path,
                source_parent,
                reference,
            ) else {
                continue;
            };

            if source_id == target_id {
                continue;
            }

            let key = (source_id, target_id, reference.kind);
            if !seen.insert(key) {
                continue;
            }

            edges.push(Edge {
                id: EdgeId::new(next_edge_seq).expect("edge sequence starts at 1"),
                source_id,
                target_id,
                kind: reference.kind,
                line: reference.line,
            });
            next_edge_seq += 1;
        }

        edges
    }

    /// Step 1: resolve the source symbol for a reference.
    fn resolve_source(
        &self,
        file_symbols: &[SymbolId],
        source_name: Option<&str>,
        line: u32,
    ) -> Option<SymbolId> {
        let by_name: Vec<SymbolId> = match source_name {
            Some(name) => file_symbols
                .iter()
                .copied()
                .filter(|id| self.input.symbols.get(id).map(|s| s.name == name).unwrap_or(false))
                .collect(),
            None => file_symbols.to_vec(),
        };

        if by_name.len() == 1 {
            return Some(by_name[0]);
        }

        let enclosing = |candidates: &[SymbolId]| -> Option<SymbolId> {
            candidates
                .iter()
                .copied()
                .find(|id| self.input.symbols.get(id).map(|s| s.span.contains_line(line)).unwrap_or(false))
        };

        if !by_name.is_empty() {
            if let Some(found) = enclosing(&by_name) {
                return Some(found);
            }
        }

        if let Some(found) = enclosing(file_symbols) {
            return Some(found);
        }

        file_symbols.first().copied()
    }

    /// Steps 3-6: resolve the target symbol by ranked rule, locality
    /// preference, disambiguation chain, and import-path normalization.
    fn resolve_target(
        &self,
        target_name: &str,
        kind: EdgeKind,
        source_id: SymbolId,
        source_path: &str,
        source_parent: &str,
        reference: &Reference,
    ) -> Option<SymbolId> {
        // R1: qualified-name exact match.
        let mut candidates: Vec<SymbolId> =
            self.by_qualified_name.get(target_name).cloned().unwrap_or_default();

        // R2: simple-name match, when R1 is empty or ambiguous.
        if candidates.is_empty() || candidates.len() > 1 {
            let simple = self.by_name.get(target_name).cloned().unwrap_or_default();
            if !simple.is_empty() {
                candidates = simple;
            }
        }

        // R3: case-insensitive fallback.
        if candidates.is_empty() {
            let lowered = target_name.to_ascii_lowercase();
            candidates = self
                .input
                .symbols
                .iter()
                .filter(|(_, s)| s.name.to_ascii_lowercase() == lowered)
                .map(|(id, _)| *id)
                .collect();
        }

        if candidates.is_empty() {
            return None;
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        self.disambiguate(candidates, kind, source_id, source_path, source_parent, reference)
    }

    fn candidate_of<'s>(&'s self, id: SymbolId) -> Option<Candidate<'s>> {
        let symbol = self.input.symbols.get(&id)?;
        let file_path = self.input.file_paths.get(&symbol.file_id)?;
        Some(Candidate { symbol, file_path })
    }

    fn disambiguate(
        &self,
        mut candidates: Vec<SymbolId>,
        kind: EdgeKind,
        source_id: SymbolId,
        source_path: &str,
        source_parent: &str,
        reference: &Reference,
    ) -> Option<SymbolId> {
        let source_dir = dir_of(source_path);

        // Locality preference: same file, else same directory.
        let same_file: Vec<SymbolId> = candidates
            .iter()
            .copied()
            .filter(|&id| self.candidate_of(id).map(|c| c.file_path == source_path).unwrap_or(false))
            .collect();
        if !same_file.is_empty() {
            candidates = same_file;
        } else {
            let same_dir: Vec<SymbolId> = candidates
                .iter()
                .copied()
                .filter(|&id| self.candidate_of(id).map(|c| dir_of(c.file_path) == source_dir).unwrap_or(false))
                .collect();
            if !same_dir.is_empty() {
                candidates = same_dir;
            }
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        // Constructor convention.
        if kind == EdgeKind::Call && starts_with_uppercase(reference.target_name.as_str()) {
            let classes: Vec<SymbolId> = candidates
                .iter()
                .copied()
                .filter(|&id| self.input.symbols.get(&id).map(|s| s.kind == SymbolKind::Class).unwrap_or(false))
                .collect();
            if !classes.is_empty() {
                candidates = classes;
            }
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        // Same file, already applied above via locality; now qualified-name prefix.
        let _ = source_id;
        let prefixed: Vec<SymbolId> = candidates
            .iter()
            .copied()
            .filter(|&id| {
                self.input
                    .symbols
                    .get(&id)
                    .map(|s| !source_parent.is_empty() && s.qualified_name.starts_with(source_parent))
                    .unwrap_or(false)
            })
            .collect();
        if !prefixed.is_empty() {
            candidates = prefixed;
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        // Same-directory, preferring is_exported.
        let same_dir_exported: Vec<SymbolId> = candidates
            .iter()
            .copied()
            .filter(|&id| {
                self.candidate_of(id)
                    .map(|c| dir_of(c.file_path) == source_dir && c.symbol.is_exported)
                    .unwrap_or(false)
            })
            .collect();
        if !same_dir_exported.is_empty() {
            candidates = same_dir_exported;
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        // Import-path match.
        if let Some(import_path) = reference
            .source_file
            .as_deref()
            .and_then(|file| self.input.imports.get(&(file.to_string(), reference.target_name.clone())))
            .or_else(|| self.input.imports.get(&(source_path.to_string(), reference.target_name.clone())))
        {
            let normalized_query = normalize_import_path(import_path);
            let by_import: Vec<SymbolId> = candidates
                .iter()
                .copied()
                .filter(|&id| {
                    self.candidate_of(id)
                        .map(|c| import_path_matches(c.file_path, &normalized_query))
                        .unwrap_or(false)
                })
                .collect();
            if !by_import.is_empty() {
                candidates = by_import;
            }
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        // Final tie-break: smallest id among exported candidates, else smallest
        // id overall. The source material picks the first exported candidate
        // in iteration order, which is non-deterministic across extractor
        // runs; smallest id is stable and documented in DESIGN.md.
        let exported: Vec<SymbolId> = candidates
            .iter()
            .copied()
            .filter(|&id| self.input.symbols.get(&id).map(|s| s.is_exported).unwrap_or(false))
            .collect();
        let pool = if exported.is_empty() { &candidates } else { &exported };
        pool.iter().copied().min_by_key(|id| id.value())
    }
}

fn starts_with_uppercase(s: &str) -> bool {
    s.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn dir_of(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Import-path normalization.
fn normalize_import_path(raw: &str) -> String {
    let mut path = raw.replace('\\', "/");
    if let Some(stripped) = path.strip_prefix("@/") {
        path = format!("src/{stripped}");
    } else if let Some(stripped) = path.strip_prefix("./") {
        path = stripped.to_string();
    }
    for ext in [".rs", ".ts", ".tsx", ".js", ".jsx", ".py", ".go", ".java", ".cls", ".trigger"] {
        if let Some(stripped) = path.strip_suffix(ext) {
            path = stripped.to_string();
            break;
        }
    }
    path
}

fn import_path_matches(candidate_path: &str, normalized_query: &str) -> bool {
    let candidate = normalize_import_path(candidate_path);
    candidate == *normalized_query
        || candidate.ends_with(&format!("/{normalized_query}"))
        || candidate.contains(&format!("/{normalized_query}/"))
}

/// Aggregate resolved edges into `FileEdge[]`:
/// one row per directed file pair, discarding intra-file edges.
pub fn aggregate_file_edges(
    edges: &[Edge],
    symbols: &HashMap<SymbolId, Symbol>,
) -> Vec<FileEdge> {
    let mut counts: HashMap<(FileId, FileId), u32> = HashMap::new();
    for edge in edges {
        let (Some(source), Some(target)) =
            (symbols.get(&edge.source_id), symbols.get(&edge.target_id))
        else {
            continue;
        };
        if source.file_id == target.file_id {
            continue;
        }
        *counts.entry((source.file_id, target.file_id)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((source_file_id, target_file_id), symbol_count)| FileEdge {
            source_file_id,
            target_file_id,
            symbol_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineSpan, Visibility};

    fn symbol(id: u64, file_id: u64, name: &str, qualified: &str, kind: SymbolKind, span: (u32, u32), exported: bool) -> Symbol {
        Symbol {
            id: SymbolId::new(id).unwrap(),
            file_id: FileId::new(file_id).unwrap(),
            name: name.into(),
            qualified_name: qualified.into(),
            kind,
            signature: None,
            span: LineSpan::new(span.0, span.1),
            docstring: None,
            visibility: Visibility::Public,
            is_exported: exported,
            parent_name: None,
            default_value: None,
        }
    }

    #[test]
    fn test_resolve_simple_name_single_candidate() {
        let mut symbols = HashMap::new();
        symbols.insert(SymbolId::new(1).unwrap(), symbol(1, 1, "caller", "crate::a::caller", SymbolKind::Function, (1, 5), true));
        symbols.insert(SymbolId::new(2).unwrap(), symbol(2, 2, "helper", "crate::b::helper", SymbolKind::Function, (1, 3), true));

        let mut file_paths = HashMap::new();
        file_paths.insert(FileId::new(1).unwrap(), "src/a.rs".to_string());
        file_paths.insert(FileId::new(2).unwrap(), "src/b.rs".to_string());

        let imports = HashMap::new();
        let input = ResolverInput { symbols: &symbols, file_paths: &file_paths, imports: &imports };
        let resolver = Resolver::new(&input);

        let references = vec![Reference {
            source_name: Some("caller".into()),
            target_name: "helper".into(),
            kind: EdgeKind::Call,
            line: 2,
            import_path: None,
            source_file: Some("src/a.rs".into()),
        }];

        let edges = resolver.resolve_file(FileId::new(1).unwrap(), &[SymbolId::new(1).unwrap()], &references);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_id, SymbolId::new(1).unwrap());
        assert_eq!(edges[0].target_id, SymbolId::new(2).unwrap());
    }

    #[test]
    fn test_self_edge_suppressed() {
        let mut symbols = HashMap::new();
        symbols.insert(SymbolId::new(1).unwrap(), symbol(1, 1, "recur", "crate::a::recur", SymbolKind::Function, (1, 5), true));
        let mut file_paths = HashMap::new();
        file_paths.insert(FileId::new(1).unwrap(), "src/a.rs".to_string());
        let imports = HashMap::new();
        let input = ResolverInput { symbols: &symbols, file_paths: &file_paths, imports: &imports };
        let resolver = Resolver::new(&input);

        let references = vec![Reference {
            source_name: Some("recur".into()),
            target_name: "recur".into(),
            kind: EdgeKind::Call,
            line: 3,
            import_path: None,
            source_file: Some("src/a.rs".into()),
        }];
        let edges = resolver.resolve_file(FileId::new(1).unwrap(), &[SymbolId::new(1).unwrap()], &references);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_locality_prefers_same_directory() {
        let mut symbols = HashMap::new();
        symbols.insert(SymbolId::new(1).unwrap(), symbol(1, 1, "caller", "crate::x::caller", SymbolKind::Function, (1, 5), true));
        symbols.insert(SymbolId::new(2).unwrap(), symbol(2, 2, "Widget", "crate::x::Widget", SymbolKind::Struct, (1, 3), true));
        symbols.insert(SymbolId::new(3).unwrap(), symbol(3, 3, "Widget", "crate::y::Widget", SymbolKind::Struct, (1, 3), true));

        let mut file_paths = HashMap::new();
        file_paths.insert(FileId::new(1).unwrap(), "src/x/a.rs".to_string());
        file_paths.insert(FileId::new(2).unwrap(), "src/x/b.rs".to_string());
        file_paths.insert(FileId::new(3).unwrap(), "src/y/c.rs".to_string());
        let imports = HashMap::new();
        let input = ResolverInput { symbols: &symbols, file_paths: &file_paths, imports: &imports };
        let resolver = Resolver::new(&input);

        let references = vec![Reference {
            source_name: Some("caller".into()),
            target_name: "Widget".into(),
            kind: EdgeKind::Reference,
            line: 2,
            import_path: None,
            source_file: Some("src/x/a.rs".into()),
        }];
        let edges = resolver.resolve_file(FileId::new(1).unwrap(), &[SymbolId::new(1).unwrap()], &references);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id, SymbolId::new(2).unwrap());
    }

    #[test]
    fn test_aggregate_file_edges_skips_intra_file() {
        let mut symbols = HashMap::new();
        symbols.insert(SymbolId::new(1).unwrap(), symbol(1, 1, "a", "a", SymbolKind::Function, (1, 1), true));
        symbols.insert(SymbolId::new(2).unwrap(), symbol(2, 1, "b", "b", SymbolKind::Function, (2, 2), true));
        symbols.insert(SymbolId::new(3).unwrap(), symbol(3, 2, "c", "c", SymbolKind::Function, (1, 1), true));

        let edges = vec![
            Edge { id: EdgeId::new(1).unwrap(), source_id: SymbolId::new(1).unwrap(), target_id: SymbolId::new(2).unwrap(), kind: EdgeKind::Call, line: 1 },
            Edge { id: EdgeId::new(2).unwrap(), source_id: SymbolId::new(1).unwrap(), target_id: SymbolId::new(3).unwrap(), kind: EdgeKind::Call, line: 1 },
        ];
        let file_edges = aggregate_file_edges(&edges, &symbols);
        assert_eq!(file_edges.len(), 1);
        assert_eq!(file_edges[0].source_file_id, FileId::new(1).unwrap());
        assert_eq!(file_edges[0].target_file_id, FileId::new(2).unwrap());
        assert_eq!(file_edges[0].symbol_count, 1);
    }

    #[test]
    fn test_import_path_normalization() {
        assert_eq!(normalize_import_path("@/utils/helper.ts"), "src/utils/helper");
        assert_eq!(normalize_import_path("./sibling.rs"), "sibling");
        assert_eq!(normalize_import_path("a\\b\\c.py"), "a/b/c");
    }
}
