use std::collections::HashSet;

use dbml_core::ErrorCode;
use dbml_semantic::{SymbolId, SymbolKind};
use dbml_semantic::decl::{RecordsDecl, RowDecl, RowValue};

use super::Interpreter;
use crate::model::{Cell, Row, TableRecord, Value};

impl Interpreter<'_> {
    pub(crate) fn records(&mut self, decl: &RecordsDecl) {
        let Some(table) = self.resolved(&decl.table.name, SymbolKind::Table) else {
            return;
        };
        let Some(columns) = self.record_columns(decl, table) else {
            return;
        };
        let rows: Vec<Row> = decl.rows.iter().map(|row| self.row(row, &columns)).collect();

        let target = self.table_name(table);
        let existing = self
            .db
            .records
            .iter_mut()
            .find(|r| r.schema_name == target.schema_name && r.table_name == target.table_name);
        match existing {
            Some(record) => {
                for column in columns {
                    if !record.columns.contains(&column) {
                        record.columns.push(column);
                    }
                }
                record.rows.extend(rows);
            }
            None => self.db.records.push(TableRecord {
                schema_name: target.schema_name,
                table_name: target.table_name,
                columns,
                rows,
            }),
        }
    }

    /// The explicit column list, or every column of the table in order.
    fn record_columns(
        &mut self,
        decl: &RecordsDecl,
        table: SymbolId,
    ) -> Option<Vec<String>> {
        let Some(explicit) = &decl.columns else {
            let table = self.model.table(table)?;
            return Some(
                table
                    .columns
                    .iter()
                    .map(|flat| flat.column.name.name.clone())
                    .collect(),
            );
        };

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(explicit.len());
        for column in explicit {
            // an unresolved column was reported by the binder
            self.model.binding(column.node)?;
            if !seen.insert(column.name.as_str()) {
                let message = format!("Column '{}' is listed more than once", column.name);
                self.error(ErrorCode::MalformedElement, column.span, message);
                return None;
            }
            columns.push(column.name.clone());
        }
        Some(columns)
    }

    fn row(&mut self, row: &RowDecl, columns: &[String]) -> Row {
        if row.values.len() != columns.len() {
            let message = format!(
                "Row has {} values but {} columns are expected",
                row.values.len(),
                columns.len()
            );
            self.error(ErrorCode::RecordArityMismatch, row.span, message);
        }
        let cells = columns
            .iter()
            .zip(&row.values)
            .map(|(column, value)| Cell {
                column: column.clone(),
                value: match &value.value {
                    RowValue::Literal(literal) => literal.clone(),
                    RowValue::EnumValue(path) => {
                        Value::String(path.last().map(|f| f.name.clone()).unwrap_or_default())
                    }
                },
                span: value.span,
            })
            .collect();
        Row {
            cells,
            span: row.span,
        }
    }
}
