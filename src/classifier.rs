//! Shared path classification.
//!
//! Pure, stateless heuristics over a repo-relative path string. Consumed by
//! ingestion (to stamp `File::file_role`), dead-code filtering, the
//! affected-tests colocate rule, and HealthEngine severity relaxation.

use crate::types::FileRole;

/// Ordered prefix/suffix heuristics. First match wins; default is `Source`.
pub fn classify_file_role(path: &str) -> FileRole {
    let lower = path.to_ascii_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);

    if has_path_segment(&lower, "tests") || has_path_segment(&lower, "test")
        || has_path_segment(&lower, "__tests__")
        || file_name.contains("_test.")
        || file_name.contains(".test.")
    {
        return FileRole::Test;
    }

    if file_name.contains(".config.")
        || file_name.starts_with(".eslintrc")
        || file_name.starts_with("tsconfig")
    {
        return FileRole::Config;
    }

    if file_name == "dockerfile"
        || file_name == "makefile"
        || file_name == "build.rs"
        || file_name.ends_with(".mk")
    {
        return FileRole::Build;
    }

    if has_path_segment(&lower, "docs") || file_name.ends_with(".md") || file_name.ends_with(".mdx") {
        return FileRole::Docs;
    }

    if has_path_segment(&lower, "generated")
        || file_name.ends_with(".gen.rs")
        || file_name.ends_with(".gen.go")
        || file_name.ends_with(".gen.ts")
        || file_name.ends_with("_pb2.py")
        || file_name.ends_with(".pb.go")
    {
        return FileRole::Generated;
    }

    if has_path_segment(&lower, "vendor")
        || has_path_segment(&lower, "node_modules")
        || has_path_segment(&lower, "third_party")
    {
        return FileRole::Vendored;
    }

    if (has_path_segment(&lower, "data") || has_path_segment(&lower, "fixtures"))
        && (file_name.ends_with(".json") || file_name.ends_with(".csv"))
    {
        return FileRole::Data;
    }

    if has_path_segment(&lower, "examples") {
        return FileRole::Examples;
    }

    if has_path_segment(&lower, "scripts")
        || (has_path_segment(&lower, "bin") && file_name.ends_with(".sh"))
    {
        return FileRole::Scripts;
    }

    if lower.contains(".github/workflows/") || file_name == ".gitlab-ci.yml" {
        return FileRole::Ci;
    }

    FileRole::Source
}

const UTILITY_PREFIXES: &[&str] = &["utils", "lib", "helpers", "shared", "core", "common", "internal"];

/// Paths HealthEngine treats as intentionally-high-fan-in utility code,
/// relaxing the god-object/hub thresholds.
pub fn is_utility_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    UTILITY_PREFIXES.iter().any(|prefix| has_path_segment(&lower, prefix))
}

/// Paths HealthEngine treats as non-production, softening severity generally.
pub fn is_non_production_path(path: &str) -> bool {
    matches!(
        classify_file_role(path),
        FileRole::Test | FileRole::Scripts | FileRole::Examples | FileRole::Docs | FileRole::Ci
    )
}

/// True if `segment` appears as a whole path component of `path`
/// (case-normalized by the caller), e.g. `has_path_segment("src/utils/foo.rs", "utils")`.
fn has_path_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|part| part == segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_test_files() {
        assert_eq!(classify_file_role("src/tests/foo.rs"), FileRole::Test);
        assert_eq!(classify_file_role("src/foo_test.go"), FileRole::Test);
        assert_eq!(classify_file_role("src/foo.test.ts"), FileRole::Test);
        assert_eq!(classify_file_role("src/__tests__/foo.js"), FileRole::Test);
    }

    #[test]
    fn test_classify_build_files() {
        assert_eq!(classify_file_role("Dockerfile"), FileRole::Build);
        assert_eq!(classify_file_role("build.rs"), FileRole::Build);
        assert_eq!(classify_file_role("project/Makefile"), FileRole::Build);
    }

    #[test]
    fn test_classify_generated() {
        assert_eq!(classify_file_role("api/foo_pb2.py"), FileRole::Generated);
        assert_eq!(classify_file_role("generated/foo.rs"), FileRole::Generated);
    }

    #[test]
    fn test_classify_default_source() {
        assert_eq!(classify_file_role("src/resolver.rs"), FileRole::Source);
    }

    #[test]
    fn test_utility_path() {
        assert!(is_utility_path("src/utils/strings.rs"));
        assert!(is_utility_path("internal/cache/lru.rs"));
        assert!(!is_utility_path("src/billing/invoice.rs"));
    }

    #[test]
    fn test_non_production_path() {
        assert!(is_non_production_path("tests/integration.rs"));
        assert!(is_non_production_path("docs/guide.md"));
        assert!(!is_non_production_path("src/main.rs"));
    }
}
