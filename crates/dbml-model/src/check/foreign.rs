use std::collections::HashSet;

use dbml_core::ErrorCode;

use super::{Checker, tuple, tuple_key, tuple_span};
use crate::model::{Cardinality, Cell, Ref, RefEndpoint, Row};

/// The many side references the one side; `-` runs left to right.
fn direction(relationship: &Ref) -> Option<(&RefEndpoint, &RefEndpoint)> {
    let [left, right] = &relationship.endpoints;
    match (left.relation, right.relation) {
        (Cardinality::Many, Cardinality::Many) => None,
        (Cardinality::One, Cardinality::Many) => Some((right, left)),
        _ => Some((left, right)),
    }
}

/// The cells of `fields` in `row`, if all are present and not null.
fn key_cells<'r>(row: &'r Row, fields: &[String]) -> Option<Vec<&'r Cell>> {
    let cells = fields
        .iter()
        .map(|field| row.get(field))
        .collect::<Option<Vec<_>>>()?;
    (!cells.iter().any(|cell| cell.value.is_null())).then_some(cells)
}

impl Checker<'_> {
    pub(super) fn foreign_key(&mut self, relationship: &Ref) {
        let Some((source, target)) = direction(relationship) else {
            return;
        };
        let source_rows = self.rows(&source.schema_name, &source.table_name);
        if source_rows.is_empty() {
            return;
        }
        let existing: HashSet<Vec<String>> = self
            .rows(&target.schema_name, &target.table_name)
            .into_iter()
            .filter_map(|row| key_cells(row, &target.field_names))
            .map(|cells| tuple_key(&cells))
            .collect();

        for row in source_rows {
            let Some(cells) = key_cells(row, &source.field_names) else {
                continue;
            };
            if existing.contains(&tuple_key(&cells)) {
                continue;
            }
            let message = format!(
                "Foreign key violation: {source} = {} does not exist in {target}",
                tuple(&cells)
            );
            self.error(ErrorCode::ForeignKeyViolation, tuple_span(row, &cells), message);
        }
    }
}
