//! Table partial injection.
//!
//! Runs once every element is registered, since a table may inject a
//! partial declared further down the file.

use std::collections::{HashMap, HashSet};

use dbml_core::ErrorCode;
use tracing::trace;

use super::Validator;
use crate::decl::{ColumnDecl, Decl, FlatColumn, TableDecl, TableField, TablePartialDecl};
use crate::symbol::{SymbolId, SymbolKind};

impl Validator<'_> {
    pub(crate) fn inject_partials(&mut self) {
        let partials: HashMap<SymbolId, TablePartialDecl> = self
            .decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::TablePartial(partial) => Some((partial.symbol, partial.clone())),
                _ => None,
            })
            .collect();

        let mut decls = std::mem::take(&mut self.decls);
        for decl in &mut decls {
            if let Decl::Table(table) = decl {
                self.flatten_table(table, &partials);
            }
        }
        self.decls = decls;
    }

    fn flatten_table(&mut self, table: &mut TableDecl, partials: &HashMap<SymbolId, TablePartialDecl>) {
        let public = self.symbols.public_schema();
        let own_names: HashSet<String> = table
            .fields
            .iter()
            .filter_map(|field| match field {
                TableField::Column(column) => Some(column.name.name.clone()),
                TableField::Partial(_) => None,
            })
            .collect();

        // (column, partial it came from), in body order
        let mut candidates: Vec<(ColumnDecl, Option<&TablePartialDecl>)> = Vec::new();
        let mut injected = Vec::new();
        for field in &table.fields {
            match field {
                TableField::Column(column) => {
                    let duplicate = candidates
                        .iter()
                        .any(|(c, from)| from.is_none() && c.name.name == column.name.name);
                    if duplicate {
                        continue;
                    }
                    candidates.push((column.clone(), None));
                }
                TableField::Partial(injection) => {
                    let partial = self
                        .symbols
                        .lookup(public, SymbolKind::TablePartial, &injection.name.name)
                        .and_then(|symbol| partials.get(&symbol));
                    let Some(partial) = partial else {
                        self.error(
                            ErrorCode::UnknownTablePartial,
                            injection.name.span,
                            format!("Table partial '{}' is not defined", injection.name.name),
                        );
                        continue;
                    };
                    trace!(table = %table.name, partial = %partial.name.name, "injecting partial");
                    for column in &partial.columns {
                        if own_names.contains(&column.name.name) {
                            continue;
                        }
                        candidates.retain(|(c, _)| c.name.name != column.name.name);
                        candidates.push((column.clone(), Some(partial)));
                    }
                    if !injected.iter().any(|p: &&TablePartialDecl| p.symbol == partial.symbol) {
                        injected.push(partial);
                    }
                }
            }
        }

        let mut columns = Vec::with_capacity(candidates.len());
        for (column, from) in candidates {
            let symbol = match from {
                None => self.own_columns.get(&column.node).copied(),
                Some(_) => Some(
                    match self.symbols.define(
                        table.symbol,
                        SymbolKind::PartialInjectedColumn,
                        &column.name.name,
                        column.node,
                    ) {
                        Ok(symbol) | Err(symbol) => symbol,
                    },
                ),
            };
            let Some(symbol) = symbol else {
                continue;
            };
            columns.push(FlatColumn {
                column,
                symbol,
                injected_from: from.map(|partial| partial.name.name.clone()),
            });
        }
        table.columns = columns;

        let own_note = table.note.is_some();
        let own_color = table.header_color.is_some();
        for partial in injected {
            table.indexes.extend(partial.indexes.iter().cloned());
            table.checks.extend(partial.checks.iter().cloned());
            if !own_note && partial.note.is_some() {
                table.note.clone_from(&partial.note);
            }
            if !own_color && partial.header_color.is_some() {
                table.header_color.clone_from(&partial.header_color);
            }
        }
    }
}
