//! Typed declarations extracted from the syntax tree by the validator.
//!
//! Every declaration keeps the [`NodeId`] of the syntax node it came from,
//! and every name keeps the node of the identifier it was read from, so the
//! binder can attach resolved symbols to exact source locations.

use dbml_core::{Span, escape_string};
use dbml_syntax::NodeId;
use derive_more::Display;
use serde::Serialize;

use crate::element::ElementKind;
use crate::symbol::{DEFAULT_SCHEMA, SymbolId};

pub use dbml_syntax::NameSegment as Name;

/// `name` or `schema.name`.
#[derive(Clone, Debug, PartialEq)]
pub struct QualifiedName {
    pub schema: Option<Name>,
    pub name: Name,
}

impl QualifiedName {
    pub fn schema_name(&self) -> &str {
        self.schema.as_ref().map_or(DEFAULT_SCHEMA, |s| &s.name)
    }

    pub fn span(&self) -> Span {
        match &self.schema {
            Some(schema) => schema.span.cover(self.name.span),
            None => self.name.span,
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.", schema.name)?;
        }
        f.write_str(&self.name.name)
    }
}

/// A literal value as written in settings and record rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Backtick expression text, kept verbatim.
    Expression(String),
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

/// Literal syntax: `null`, `true`, `1.5`, `'text'`, `` `expr` ``.
impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "'{}'", escape_string(s)),
            Literal::Expression(e) => write!(f, "`{e}`"),
        }
    }
}

/// Relationship operator between two endpoints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize)]
pub enum RelationOp {
    #[display("<")]
    OneToMany,
    #[display(">")]
    ManyToOne,
    #[display("-")]
    OneToOne,
    #[display("<>")]
    ManyToMany,
}

impl RelationOp {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "<" => Some(RelationOp::OneToMany),
            ">" => Some(RelationOp::ManyToOne),
            "-" => Some(RelationOp::OneToOne),
            "<>" => Some(RelationOp::ManyToMany),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefAction {
    #[display("cascade")]
    Cascade,
    #[display("restrict")]
    Restrict,
    #[display("set null")]
    SetNull,
    #[display("set default")]
    SetDefault,
    #[display("no action")]
    NoAction,
}

impl RefAction {
    pub const ALLOWED: &'static [&'static str] =
        &["cascade", "restrict", "set null", "set default", "no action"];

    pub fn parse(words: &str) -> Option<Self> {
        match words.to_ascii_lowercase().as_str() {
            "cascade" => Some(RefAction::Cascade),
            "restrict" => Some(RefAction::Restrict),
            "set null" => Some(RefAction::SetNull),
            "set default" => Some(RefAction::SetDefault),
            "no action" => Some(RefAction::NoAction),
            _ => None,
        }
    }
}

/// Column side of a relationship: `t.c`, `s.t.c`, `t.(a, b)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub schema: Option<Name>,
    pub table: Name,
    pub columns: Vec<Name>,
    pub span: Span,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.", schema.name)?;
        }
        write!(f, "{}.", self.table.name)?;
        match self.columns.as_slice() {
            [column] => f.write_str(&column.name),
            columns => {
                let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
                write!(f, "({})", names.join(", "))
            }
        }
    }
}

// =============================================================================
// Tables and partials
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnType {
    pub schema: Option<Name>,
    pub name: Name,
    pub args: Vec<String>,
    /// Written with a trailing `[]`.
    pub array: bool,
    pub span: Span,
}

impl ColumnType {
    /// `varchar(255)`, `int[]`, `auth.role`.
    pub fn type_name(&self) -> String {
        let mut out = String::new();
        if let Some(schema) = &self.schema {
            out.push_str(&schema.name);
            out.push('.');
        }
        out.push_str(&self.name.name);
        if !self.args.is_empty() {
            out.push('(');
            out.push_str(&self.args.join(","));
            out.push(')');
        }
        if self.array {
            out.push_str("[]");
        }
        out
    }
}

/// `ref: > users.id` inside column settings.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineRef {
    pub op: RelationOp,
    pub target: Endpoint,
    pub span: Span,
}

/// `check: ...` inside column settings.
#[derive(Clone, Debug, PartialEq)]
pub enum InlineCheck {
    Expression { text: String, span: Span },
    /// A bare or schema-qualified enum name.
    Enum { path: Vec<Name>, span: Span },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnSettings {
    pub pk: bool,
    pub unique: bool,
    pub increment: bool,
    /// `Some(true)` for `not null`, `Some(false)` for `null`.
    pub not_null: Option<bool>,
    pub default: Option<Literal>,
    pub note: Option<String>,
    pub refs: Vec<InlineRef>,
    pub checks: Vec<InlineCheck>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDecl {
    pub node: NodeId,
    pub name: Name,
    pub column_type: ColumnType,
    pub settings: ColumnSettings,
    pub span: Span,
}

/// `~partial_name` inside a table body.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialInjection {
    pub node: NodeId,
    pub name: Name,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableField {
    Column(ColumnDecl),
    Partial(PartialInjection),
}

#[derive(Clone, Debug, PartialEq)]
pub enum IndexPart {
    Column(Name),
    Expression(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexDecl {
    pub node: NodeId,
    pub span: Span,
    pub parts: Vec<IndexPart>,
    pub pk: bool,
    pub unique: bool,
    pub name: Option<String>,
    pub index_type: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckDecl {
    pub node: NodeId,
    pub span: Span,
    pub expression: String,
    pub name: Option<String>,
}

/// A column after partial injection.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatColumn {
    pub column: ColumnDecl,
    pub symbol: SymbolId,
    /// Name of the partial the column was injected from.
    pub injected_from: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: QualifiedName,
    pub alias: Option<Name>,
    pub header_color: Option<String>,
    pub note: Option<String>,
    /// Body order, partial injections included.
    pub fields: Vec<TableField>,
    pub indexes: Vec<IndexDecl>,
    pub checks: Vec<CheckDecl>,
    /// Flattened column list, filled once partials are injected.
    pub columns: Vec<FlatColumn>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TablePartialDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: Name,
    pub header_color: Option<String>,
    pub note: Option<String>,
    pub columns: Vec<ColumnDecl>,
    pub indexes: Vec<IndexDecl>,
    pub checks: Vec<CheckDecl>,
}

// =============================================================================
// Other elements
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct EnumFieldDecl {
    pub node: NodeId,
    pub name: Name,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: QualifiedName,
    pub fields: Vec<EnumFieldDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RefDecl {
    pub node: NodeId,
    pub span: Span,
    pub name: Option<Name>,
    pub left: Endpoint,
    pub op: RelationOp,
    pub right: Endpoint,
    pub update: Option<RefAction>,
    pub delete: Option<RefAction>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectDecl {
    pub node: NodeId,
    pub span: Span,
    pub name: Option<Name>,
    pub database_type: Option<String>,
    pub note: Option<String>,
    /// Custom `key: 'value'` entries in source order.
    pub properties: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableGroupDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: QualifiedName,
    pub members: Vec<QualifiedName>,
    pub color: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionArg {
    pub name: Name,
    pub type_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: QualifiedName,
    pub args: Vec<FunctionArg>,
    pub returns: Option<String>,
    pub body: Option<String>,
    pub language: Option<String>,
    pub behavior: Option<String>,
    pub security: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: QualifiedName,
    pub table: Option<QualifiedName>,
    pub behavior: Option<String>,
    pub command: Option<String>,
    pub roles: Vec<String>,
    /// `Some(None)` when written as `null`.
    pub using: Option<Option<String>>,
    pub check: Option<Option<String>>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RowValue {
    Literal(Literal),
    /// `enum.value` or `schema.enum.value`.
    EnumValue(Vec<Name>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowValueDecl {
    pub value: RowValue,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowDecl {
    pub node: NodeId,
    pub span: Span,
    pub values: Vec<RowValueDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordsDecl {
    pub node: NodeId,
    pub span: Span,
    pub table: QualifiedName,
    /// Explicit column list, when the element names one.
    pub columns: Option<Vec<Name>>,
    pub rows: Vec<RowDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoteDecl {
    pub node: NodeId,
    pub span: Span,
    pub symbol: SymbolId,
    pub name: Name,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Table(TableDecl),
    TablePartial(TablePartialDecl),
    Enum(EnumDecl),
    Ref(RefDecl),
    Project(ProjectDecl),
    TableGroup(TableGroupDecl),
    Function(FunctionDecl),
    Policy(PolicyDecl),
    Records(RecordsDecl),
    Note(NoteDecl),
}

impl Decl {
    pub fn node(&self) -> NodeId {
        match self {
            Decl::Table(d) => d.node,
            Decl::TablePartial(d) => d.node,
            Decl::Enum(d) => d.node,
            Decl::Ref(d) => d.node,
            Decl::Project(d) => d.node,
            Decl::TableGroup(d) => d.node,
            Decl::Function(d) => d.node,
            Decl::Policy(d) => d.node,
            Decl::Records(d) => d.node,
            Decl::Note(d) => d.node,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Decl::Table(_) => ElementKind::Table,
            Decl::TablePartial(_) => ElementKind::TablePartial,
            Decl::Enum(_) => ElementKind::Enum,
            Decl::Ref(_) => ElementKind::Ref,
            Decl::Project(_) => ElementKind::Project,
            Decl::TableGroup(_) => ElementKind::TableGroup,
            Decl::Function(_) => ElementKind::Function,
            Decl::Policy(_) => ElementKind::Policy,
            Decl::Records(_) => ElementKind::Records,
            Decl::Note(_) => ElementKind::Note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Null.to_string(), "null");
        assert_eq!(Literal::Boolean(true).to_string(), "true");
        assert_eq!(Literal::Number(1.0).to_string(), "1");
        assert_eq!(Literal::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Literal::String("it's".into()).to_string(), r"'it\'s'");
        assert_eq!(Literal::Expression("now()".into()).to_string(), "`now()`");
    }

    #[test]
    fn test_relation_ops() {
        assert_eq!(RelationOp::from_operator("<>"), Some(RelationOp::ManyToMany));
        assert_eq!(RelationOp::from_operator("="), None);
        assert_eq!(RelationOp::OneToOne.to_string(), "-");
    }

    #[test]
    fn test_ref_actions_accept_words() {
        assert_eq!(RefAction::parse("SET NULL"), Some(RefAction::SetNull));
        assert_eq!(RefAction::parse("no action"), Some(RefAction::NoAction));
        assert_eq!(RefAction::parse("drop"), None);
        assert_eq!(RefAction::SetDefault.to_string(), "set default");
    }
}
