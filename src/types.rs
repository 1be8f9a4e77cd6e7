//! Core identifier and value types shared across every component.
//!
//! Ids are newtypes over `NonZero` integers, widened to 64 bits: the store
//! accumulates ids across many re-indexes over the life of a repository,
//! not just a single in-process run.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(NonZeroU64);

        impl $name {
            pub fn new(value: u64) -> Option<Self> {
                NonZeroU64::new(value).map(Self)
            }

            pub fn value(&self) -> u64 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.get())
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.0.get() as i64))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
                let raw = value.as_i64()?;
                $name::new(raw as u64).ok_or(rusqlite::types::FromSqlError::OutOfRange(raw))
            }
        }
    };
}

id_type!(FileId);
id_type!(SymbolId);
id_type!(EdgeId);
id_type!(ClusterId);

/// A 1-based line span. The core never needs column-level precision since it
/// consumes extractor output, not source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

impl LineSpan {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    Module,
    Constant,
    Variable,
    Field,
    Property,
    Constructor,
    TypeAlias,
    Trigger,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Trait => "trait",
            Self::Module => "module",
            Self::Constant => "constant",
            Self::Variable => "variable",
            Self::Field => "field",
            Self::Property => "property",
            Self::Constructor => "constructor",
            Self::TypeAlias => "type_alias",
            Self::Trigger => "trigger",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        Some(match s {
            "function" => Self::Function,
            "method" => Self::Method,
            "class" => Self::Class,
            "interface" => Self::Interface,
            "struct" => Self::Struct,
            "enum" => Self::Enum,
            "trait" => Self::Trait,
            "module" => Self::Module,
            "constant" => Self::Constant,
            "variable" => Self::Variable,
            "field" => Self::Field,
            "property" => Self::Property,
            "constructor" => Self::Constructor,
            "type_alias" => Self::TypeAlias,
            "trigger" => Self::Trigger,
            _ => return None,
        })
    }

    /// Function-like symbols are the ones Metrics/QueryEngine dead-code
    /// candidates operate on.
    pub fn is_function_like(&self) -> bool {
        matches!(self, Self::Function | Self::Method | Self::Constructor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Package => "package",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Call,
    Import,
    Inherits,
    Implements,
    Uses,
    UsesTrait,
    Template,
    Reference,
    TypeRef,
    SoqlQuery,
    DmlInsert,
    DmlUpdate,
    DmlDelete,
    DmlUpsert,
    DmlMerge,
    DmlUndelete,
    Label,
    SchemaRef,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Import => "import",
            Self::Inherits => "inherits",
            Self::Implements => "implements",
            Self::Uses => "uses",
            Self::UsesTrait => "uses_trait",
            Self::Template => "template",
            Self::Reference => "reference",
            Self::TypeRef => "type_ref",
            Self::SoqlQuery => "soql_query",
            Self::DmlInsert => "dml_insert",
            Self::DmlUpdate => "dml_update",
            Self::DmlDelete => "dml_delete",
            Self::DmlUpsert => "dml_upsert",
            Self::DmlMerge => "dml_merge",
            Self::DmlUndelete => "dml_undelete",
            Self::Label => "label",
            Self::SchemaRef => "schema_ref",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        Some(match s {
            "call" => Self::Call,
            "import" => Self::Import,
            "inherits" => Self::Inherits,
            "implements" => Self::Implements,
            "uses" => Self::Uses,
            "uses_trait" => Self::UsesTrait,
            "template" => Self::Template,
            "reference" => Self::Reference,
            "type_ref" => Self::TypeRef,
            "soql_query" => Self::SoqlQuery,
            "dml_insert" => Self::DmlInsert,
            "dml_update" => Self::DmlUpdate,
            "dml_delete" => Self::DmlDelete,
            "dml_upsert" => Self::DmlUpsert,
            "dml_merge" => Self::DmlMerge,
            "dml_undelete" => Self::DmlUndelete,
            "label" => Self::Label,
            "schema_ref" => Self::SchemaRef,
            _ => return None,
        })
    }

    /// Priority used by QueryEngine's semantic-context neighbor de-duplication
    ///: lower value wins when multiple edge kinds connect the
    /// same pair of symbols.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Call => 0,
            Self::Uses | Self::UsesTrait => 1,
            Self::Inherits => 2,
            Self::Implements => 3,
            Self::Template => 4,
            Self::Import => 5,
            Self::Reference => 6,
            _ => 7,
        }
    }
}

impl rusqlite::types::ToSql for EdgeKind {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
    }
}

impl rusqlite::types::FromSql for EdgeKind {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        EdgeKind::from_str_loose(s).ok_or_else(|| rusqlite::types::FromSqlError::Other(s.into()))
    }
}

impl rusqlite::types::ToSql for SymbolKind {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
    }
}

impl rusqlite::types::FromSql for SymbolKind {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        SymbolKind::from_str_loose(s).ok_or_else(|| rusqlite::types::FromSqlError::Other(s.into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Source,
    Test,
    Config,
    Build,
    Docs,
    Generated,
    Vendored,
    Data,
    Examples,
    Scripts,
    Ci,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Test => "test",
            Self::Config => "config",
            Self::Build => "build",
            Self::Docs => "docs",
            Self::Generated => "generated",
            Self::Vendored => "vendored",
            Self::Data => "data",
            Self::Examples => "examples",
            Self::Scripts => "scripts",
            Self::Ci => "ci",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        Some(match s {
            "source" => Self::Source,
            "test" => Self::Test,
            "config" => Self::Config,
            "build" => Self::Build,
            "docs" => Self::Docs,
            "generated" => Self::Generated,
            "vendored" => Self::Vendored,
            "data" => Self::Data,
            "examples" => Self::Examples,
            "scripts" => Self::Scripts,
            "ci" => Self::Ci,
            _ => return None,
        })
    }
}

impl rusqlite::types::ToSql for FileRole {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
    }
}

impl rusqlite::types::FromSql for FileRole {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        FileRole::from_str_loose(s).ok_or_else(|| rusqlite::types::FromSqlError::Other(s.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        assert!(SymbolId::new(0).is_none());
        let id = SymbolId::new(42).unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(format!("{id}"), "42");
    }

    #[test]
    fn test_line_span_contains() {
        let span = LineSpan::new(10, 20);
        assert!(span.contains_line(10));
        assert!(span.contains_line(20));
        assert!(!span.contains_line(9));
        assert!(!span.contains_line(21));
        assert_eq!(span.len(), 11);
    }

    #[test]
    fn test_edge_kind_priority_ordering() {
        assert!(EdgeKind::Call.priority() < EdgeKind::Uses.priority());
        assert!(EdgeKind::Uses.priority() < EdgeKind::Import.priority());
    }

    #[test]
    fn test_symbol_kind_function_like() {
        assert!(SymbolKind::Function.is_function_like());
        assert!(SymbolKind::Method.is_function_like());
        assert!(!SymbolKind::Class.is_function_like());
    }
}
