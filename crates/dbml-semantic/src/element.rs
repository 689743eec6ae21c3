//! Element kinds, selected by an element declaration's keyword.

use derive_more::Display;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize)]
pub enum ElementKind {
    Table,
    Enum,
    Ref,
    Project,
    TableGroup,
    TablePartial,
    Function,
    Policy,
    Records,
    Note,
    #[display("indexes")]
    Indexes,
    #[display("checks")]
    Checks,
    /// Any keyword the language does not define.
    #[display("custom element")]
    Custom,
}

impl ElementKind {
    /// Keywords match case-insensitively.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "table" => ElementKind::Table,
            "enum" => ElementKind::Enum,
            "ref" => ElementKind::Ref,
            "project" => ElementKind::Project,
            "tablegroup" => ElementKind::TableGroup,
            "tablepartial" => ElementKind::TablePartial,
            "function" => ElementKind::Function,
            "policy" => ElementKind::Policy,
            "records" => ElementKind::Records,
            "note" => ElementKind::Note,
            "indexes" => ElementKind::Indexes,
            "checks" => ElementKind::Checks,
            _ => ElementKind::Custom,
        }
    }

    /// Kinds allowed at the top level of a program.
    pub fn is_top_level(self) -> bool {
        !matches!(
            self,
            ElementKind::Indexes | ElementKind::Checks | ElementKind::Custom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_ignore_case() {
        assert_eq!(ElementKind::from_keyword("TABLE"), ElementKind::Table);
        assert_eq!(ElementKind::from_keyword("tableGroup"), ElementKind::TableGroup);
        assert_eq!(ElementKind::from_keyword("Indexes"), ElementKind::Indexes);
        assert_eq!(ElementKind::from_keyword("Widget"), ElementKind::Custom);
    }

    #[test]
    fn test_nested_only_kinds() {
        assert!(ElementKind::Records.is_top_level());
        assert!(!ElementKind::Indexes.is_top_level());
        assert!(!ElementKind::Custom.is_top_level());
    }
}
