//! Primary key, unique and not-null rules.

use std::collections::HashSet;

use dbml_core::ErrorCode;

use super::{Checker, column_ref, has_default, tuple, tuple_key, tuple_span};
use crate::model::{Cell, Column, Index, IndexColumn, Row, Table};

/// Column-level `pk` columns form one key; each `[pk]` index forms its own.
fn primary_keys(table: &Table) -> Vec<Vec<&Column>> {
    let mut keys = Vec::new();
    let columns: Vec<_> = table.columns.iter().filter(|c| c.pk).collect();
    if !columns.is_empty() {
        keys.push(columns);
    }
    keys.extend(table.indexes.iter().filter(|i| i.pk).filter_map(|i| index_key(table, i)));
    keys
}

fn unique_keys(table: &Table) -> Vec<Vec<&Column>> {
    // a sole primary key column is already checked for duplicates
    let single_pk = table.columns.iter().filter(|c| c.pk).count() == 1;
    let mut keys: Vec<_> = table
        .columns
        .iter()
        .filter(|c| c.unique && !(c.pk && single_pk))
        .map(|c| vec![c])
        .collect();
    keys.extend(
        table
            .indexes
            .iter()
            .filter(|i| i.unique && !i.pk)
            .filter_map(|i| index_key(table, i)),
    );
    keys
}

/// The column parts of an index; expressions cannot be checked.
fn index_key<'t>(table: &'t Table, index: &Index) -> Option<Vec<&'t Column>> {
    let key: Vec<_> = index
        .columns
        .iter()
        .filter_map(|part| match part {
            IndexColumn::Column(name) => table.column(name),
            IndexColumn::Expression(_) => None,
        })
        .collect();
    (!key.is_empty()).then_some(key)
}

impl Checker<'_> {
    pub(super) fn primary_keys(&mut self, table: &Table, rows: &[&Row]) {
        for key in primary_keys(table) {
            self.primary_key(table, &key, rows);
        }
    }

    fn primary_key(&mut self, table: &Table, key: &[&Column], rows: &[&Row]) {
        let mut seen = HashSet::new();
        for row in rows {
            let mut cells = Vec::with_capacity(key.len());
            let mut complete = true;
            for column in key {
                match row.get(&column.name) {
                    Some(cell) if cell.value.is_null() => {
                        let message = format!(
                            "NULL value in primary key column {}",
                            column_ref(table, &[*column])
                        );
                        self.error(ErrorCode::NullInPrimaryKey, cell.span, message);
                        complete = false;
                    }
                    Some(cell) => cells.push(cell),
                    None => {
                        if !has_default(column) {
                            let message = format!(
                                "Missing value for primary key column {}",
                                column_ref(table, &[*column])
                            );
                            self.error(ErrorCode::MissingPrimaryKey, row.span, message);
                        }
                        complete = false;
                    }
                }
            }
            if complete && !seen.insert(tuple_key(&cells)) {
                let message = format!(
                    "Duplicate primary key {} = {}",
                    column_ref(table, key),
                    tuple(&cells)
                );
                self.error(ErrorCode::DuplicatePrimaryKey, tuple_span(row, &cells), message);
            }
        }
    }

    pub(super) fn unique_keys(&mut self, table: &Table, rows: &[&Row]) {
        for key in unique_keys(table) {
            let mut seen = HashSet::new();
            for row in rows {
                let Some(cells) = key
                    .iter()
                    .map(|column| row.get(&column.name))
                    .collect::<Option<Vec<&Cell>>>()
                else {
                    continue;
                };
                if cells.iter().any(|cell| cell.value.is_null()) {
                    continue;
                }
                if !seen.insert(tuple_key(&cells)) {
                    let message = format!(
                        "Duplicate unique value {} = {}",
                        column_ref(table, &key),
                        tuple(&cells)
                    );
                    self.error(ErrorCode::DuplicateUnique, tuple_span(row, &cells), message);
                }
            }
        }
    }

    pub(super) fn not_null(&mut self, table: &Table, rows: &[&Row]) {
        for column in table.columns.iter().filter(|c| c.not_null && !c.pk) {
            for row in rows {
                match row.get(&column.name) {
                    Some(cell) if cell.value.is_null() => {
                        let message = format!(
                            "NULL value in not null column {}",
                            column_ref(table, &[column])
                        );
                        self.error(ErrorCode::NullInNotNull, cell.span, message);
                    }
                    None if !has_default(column) => {
                        let message = format!(
                            "Missing value for not null column {} without a default",
                            column_ref(table, &[column])
                        );
                        self.error(ErrorCode::NullInNotNull, row.span, message);
                    }
                    _ => {}
                }
            }
        }
    }
}
