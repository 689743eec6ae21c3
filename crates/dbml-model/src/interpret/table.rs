use dbml_semantic::SymbolKind;
use dbml_semantic::decl::{
    CheckDecl, ColumnDecl, IndexDecl, IndexPart, InlineCheck, TableDecl, TableField,
    TablePartialDecl,
};

use super::Interpreter;
use crate::model::{
    Check, Column, ColumnCheck, ColumnType, Index, IndexColumn, Table, TableName, TablePartial,
};

impl Interpreter<'_> {
    pub(crate) fn table(&mut self, decl: &TableDecl) {
        let columns = decl
            .columns
            .iter()
            .map(|flat| {
                let mut column = self.column(&flat.column);
                column.injected_from.clone_from(&flat.injected_from);
                column
            })
            .collect();
        let partials = decl
            .fields
            .iter()
            .filter_map(|field| match field {
                TableField::Partial(injection) => self
                    .resolved(&injection.name, SymbolKind::TablePartial)
                    .map(|_| injection.name.name.clone()),
                TableField::Column(_) => None,
            })
            .collect();
        let table = Table {
            name: decl.name.name.name.clone(),
            schema_name: decl.name.schema_name().to_string(),
            alias: decl.alias.as_ref().map(|alias| alias.name.clone()),
            columns,
            indexes: decl.indexes.iter().map(index).collect(),
            checks: decl.checks.iter().map(check).collect(),
            header_color: decl.header_color.clone(),
            note: decl.note.clone(),
            partials,
            span: decl.span,
        };

        let owner = TableName {
            schema_name: table.schema_name.clone(),
            table_name: table.name.clone(),
        };
        for flat in &decl.columns {
            for inline in &flat.column.settings.refs {
                self.inline_ref(&owner, &flat.column, inline);
            }
        }
        self.db.tables.insert(decl.node, table);
    }

    pub(crate) fn table_partial(&mut self, decl: &TablePartialDecl) {
        let partial = TablePartial {
            name: decl.name.name.clone(),
            columns: decl.columns.iter().map(|c| self.column(c)).collect(),
            indexes: decl.indexes.iter().map(index).collect(),
            checks: decl.checks.iter().map(check).collect(),
            header_color: decl.header_color.clone(),
            note: decl.note.clone(),
        };
        self.db.table_partials.insert(decl.node, partial);
    }

    fn column(&self, decl: &ColumnDecl) -> Column {
        let settings = &decl.settings;
        let declared_type = &decl.column_type;
        let enum_type = self.resolved(&declared_type.name, SymbolKind::Enum);
        let column_type = ColumnType {
            schema_name: match enum_type {
                Some(symbol) => Some(self.schema_name(symbol)),
                None => declared_type.schema.as_ref().map(|s| s.name.clone()),
            },
            type_name: declared_type.type_name(),
            args: declared_type.args.clone(),
            is_enum: enum_type.is_some(),
        };
        let checks = settings
            .checks
            .iter()
            .filter_map(|check| match check {
                InlineCheck::Expression { text, .. } => Some(ColumnCheck::Expression {
                    expression: text.clone(),
                }),
                InlineCheck::Enum { path, .. } => {
                    let symbol = self.resolved(path.last()?, SymbolKind::Enum)?;
                    Some(ColumnCheck::Enum {
                        schema_name: self.schema_name(symbol),
                        enum_name: self.model.symbols.get(symbol).name.clone(),
                    })
                }
            })
            .collect();
        Column {
            name: decl.name.name.clone(),
            column_type,
            pk: settings.pk,
            unique: settings.unique,
            not_null: settings.not_null == Some(true),
            increment: settings.increment,
            default: settings.default.clone(),
            note: settings.note.clone(),
            checks,
            injected_from: None,
            span: decl.span,
        }
    }
}

fn index(decl: &IndexDecl) -> Index {
    Index {
        columns: decl
            .parts
            .iter()
            .map(|part| match part {
                IndexPart::Column(name) => IndexColumn::Column(name.name.clone()),
                IndexPart::Expression(text) => IndexColumn::Expression(text.clone()),
            })
            .collect(),
        pk: decl.pk,
        unique: decl.unique,
        name: decl.name.clone(),
        index_type: decl.index_type.clone(),
        note: decl.note.clone(),
    }
}

fn check(decl: &CheckDecl) -> Check {
    Check {
        expression: decl.expression.clone(),
        name: decl.name.clone(),
    }
}
