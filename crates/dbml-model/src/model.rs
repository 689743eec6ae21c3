//! The normalized relational model produced by interpretation.
//!
//! Every element kind is stored in a map keyed by the [`NodeId`] of its
//! declaration, so iteration follows source order. Relationships and
//! records are kept as ordered lists since inline `ref:` settings and
//! repeated `Records` elements have no single declaring element.

use std::collections::BTreeMap;

use dbml_core::Span;
use dbml_syntax::NodeId;
use derive_more::Display;
use serde::Serialize;

pub use dbml_semantic::decl::{Literal as Value, RefAction};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InterpreterDatabase {
    pub project: Option<Project>,
    pub tables: BTreeMap<NodeId, Table>,
    pub enums: BTreeMap<NodeId, Enum>,
    pub refs: Vec<Ref>,
    pub table_groups: BTreeMap<NodeId, TableGroup>,
    pub table_partials: BTreeMap<NodeId, TablePartial>,
    pub functions: BTreeMap<NodeId, Function>,
    pub policies: BTreeMap<NodeId, Policy>,
    pub notes: BTreeMap<NodeId, StickyNote>,
    pub records: Vec<TableRecord>,
}

impl InterpreterDatabase {
    pub fn table(&self, schema_name: &str, table_name: &str) -> Option<&Table> {
        self.tables
            .values()
            .find(|t| t.schema_name == schema_name && t.name == table_name)
    }

    /// Record sets targeting a table, in source order.
    pub fn records_of<'a, 'n>(
        &'a self,
        schema_name: &'n str,
        table_name: &'n str,
    ) -> impl Iterator<Item = &'a TableRecord> + use<'a, 'n> {
        self.records
            .iter()
            .filter(move |r| r.schema_name == schema_name && r.table_name == table_name)
    }
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub schema_name: String,
    pub alias: Option<String>,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub checks: Vec<Check>,
    pub header_color: Option<String>,
    pub note: Option<String>,
    /// Names of injected partials, in injection order.
    pub partials: Vec<String>,
    #[serde(skip)]
    pub span: Span,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub pk: bool,
    pub unique: bool,
    pub not_null: bool,
    pub increment: bool,
    #[serde(rename = "dbdefault")]
    pub default: Option<Value>,
    pub note: Option<String>,
    pub checks: Vec<ColumnCheck>,
    /// The partial this column was injected from.
    pub injected_from: Option<String>,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnType {
    /// Schema of an enum type written as `schema.enum`.
    pub schema_name: Option<String>,
    /// Full type text: `varchar(255)`, `int[]`.
    pub type_name: String,
    pub args: Vec<String>,
    /// The type names an enum.
    pub is_enum: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnCheck {
    Expression { expression: String },
    Enum { schema_name: String, enum_name: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Index {
    pub columns: Vec<IndexColumn>,
    pub pk: bool,
    pub unique: bool,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub index_type: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IndexColumn {
    Column(String),
    Expression(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Check {
    pub expression: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TablePartial {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub checks: Vec<Check>,
    pub header_color: Option<String>,
    pub note: Option<String>,
}

// =============================================================================
// Relationships
// =============================================================================

/// One side of a relationship.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize)]
pub enum Cardinality {
    #[display("1")]
    #[serde(rename = "1")]
    One,
    #[display("*")]
    #[serde(rename = "*")]
    Many,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RefEndpoint {
    pub schema_name: String,
    pub table_name: String,
    pub field_names: Vec<String>,
    pub relation: Cardinality,
}

impl std::fmt::Display for RefEndpoint {
    /// `schema.table.column` or `schema.table.(a, b)`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.", self.schema_name, self.table_name)?;
        match self.field_names.as_slice() {
            [field] => f.write_str(field),
            fields => write!(f, "({})", fields.join(", ")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ref {
    pub name: Option<String>,
    pub endpoints: [RefEndpoint; 2],
    #[serde(rename = "onUpdate")]
    pub update: Option<RefAction>,
    #[serde(rename = "onDelete")]
    pub delete: Option<RefAction>,
    pub color: Option<String>,
    /// Declared through a column's `ref:` setting.
    pub inline: bool,
    #[serde(skip)]
    pub span: Span,
}

// =============================================================================
// Other elements
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enum {
    pub name: String,
    pub schema_name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Project {
    pub name: Option<String>,
    pub database_type: Option<String>,
    pub note: Option<String>,
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableName {
    pub schema_name: String,
    pub table_name: String,
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableGroup {
    pub name: String,
    pub schema_name: String,
    pub tables: Vec<TableName>,
    pub color: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StickyNote {
    pub name: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionArg {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub schema_name: String,
    pub args: Vec<FunctionArg>,
    pub returns: String,
    pub body: String,
    pub language: String,
    pub behavior: String,
    pub security: String,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Policy {
    pub name: String,
    pub schema_name: String,
    pub table: Option<TableName>,
    pub behavior: String,
    pub command: String,
    pub roles: Vec<String>,
    pub using: Option<String>,
    pub check: Option<String>,
    pub note: Option<String>,
}

// =============================================================================
// Records
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRecord {
    pub schema_name: String,
    pub table_name: String,
    /// Columns the rows' values map onto, in order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
    #[serde(skip)]
    pub span: Span,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.column == column)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cell {
    pub column: String,
    pub value: Value,
    #[serde(skip)]
    pub span: Span,
}
