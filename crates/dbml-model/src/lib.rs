//! The relational model of a DBML program.
//!
//! [`interpret`] turns a bound [`dbml_semantic::SemanticModel`] into an
//! [`InterpreterDatabase`], and [`check`] evaluates the rows it declares
//! against keys, `not null` columns and relationships.

pub mod check;
pub mod interpret;
pub mod model;

pub use check::check;
pub use interpret::interpret;
pub use model::{
    Cardinality, Cell, Check, Column, ColumnCheck, ColumnType, Enum, EnumValue, Function,
    FunctionArg, Index, IndexColumn, InterpreterDatabase, Policy, Project, Ref, RefAction,
    RefEndpoint, Row, StickyNote, Table, TableGroup, TableName, TablePartial, TableRecord, Value,
};
