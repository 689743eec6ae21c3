//! Integrity checks over the literal rows declared with `Records`.
//!
//! Every table with rows is checked against its primary keys, unique
//! columns and indexes, and `not null` columns; every relationship is then
//! checked as a foreign key from its many side to its one side. Values are
//! compared by their literal form, so `1` and `'1'` are different values.

mod foreign;
mod keys;

use dbml_core::{Diagnostic, ErrorCode, Span};
use tracing::{debug, trace};

use crate::model::{Cell, Column, InterpreterDatabase, Row, Table};

/// Check every declared row of `db`.
pub fn check(db: &InterpreterDatabase) -> Vec<Diagnostic> {
    let mut checker = Checker {
        db,
        diagnostics: Vec::new(),
    };
    for table in db.tables.values() {
        let rows = checker.rows(&table.schema_name, &table.name);
        if rows.is_empty() {
            continue;
        }
        trace!(table = %table.qualified_name(), rows = rows.len(), "checking rows");
        checker.primary_keys(table, &rows);
        checker.unique_keys(table, &rows);
        checker.not_null(table, &rows);
    }
    for relationship in &db.refs {
        checker.foreign_key(relationship);
    }
    debug!(diagnostics = checker.diagnostics.len(), "checked records");
    checker.diagnostics
}

struct Checker<'d> {
    db: &'d InterpreterDatabase,
    diagnostics: Vec<Diagnostic>,
}

impl<'d> Checker<'d> {
    fn error(&mut self, code: ErrorCode, span: Span, message: String) {
        self.diagnostics.push(Diagnostic::error(code, span, message));
    }

    /// All rows declared for a table, in source order.
    fn rows(&self, schema_name: &str, table_name: &str) -> Vec<&'d Row> {
        self.db
            .records_of(schema_name, table_name)
            .flat_map(|record| &record.rows)
            .collect()
    }
}

/// A missing value is filled in by the database.
fn has_default(column: &Column) -> bool {
    column.default.is_some() || column.increment
}

/// `schema.table.column` or `schema.table.(a, b)`.
fn column_ref(table: &Table, key: &[&Column]) -> String {
    match key {
        [column] => format!("{}.{}", table.qualified_name(), column.name),
        columns => {
            let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
            format!("{}.({})", table.qualified_name(), names.join(", "))
        }
    }
}

/// `1` or `(1, 'a')`.
fn tuple(cells: &[&Cell]) -> String {
    match cells {
        [cell] => cell.value.to_string(),
        cells => {
            let values: Vec<_> = cells.iter().map(|c| c.value.to_string()).collect();
            format!("({})", values.join(", "))
        }
    }
}

/// Comparison key of a tuple of cells.
fn tuple_key(cells: &[&Cell]) -> Vec<String> {
    cells.iter().map(|c| c.value.to_string()).collect()
}

/// Where to point at a tuple: the cell itself, or the whole row.
fn tuple_span(row: &Row, cells: &[&Cell]) -> Span {
    match cells {
        [cell] => cell.span,
        _ => row.span,
    }
}
