//! Name resolution.
//!
//! The binder walks the validated declarations and resolves every name that
//! refers to another declaration: relationship endpoints, enum checks and
//! enum-typed columns, group members, policy and records targets, and
//! partial injections. A resolved name gets an entry in the model's binding
//! side table and a [`Reference`](crate::symbol::Reference) on its target.
//!
//! Unqualified names are looked up in the schema of the element they appear
//! in, then in `public`. A schema-qualified name is looked up in that schema
//! only.

use dbml_core::{Diagnostic, ErrorCode, Report, Span};
use dbml_syntax::NodeId;
use tracing::{debug, trace};

use crate::decl::{
    ColumnDecl, Decl, Endpoint, InlineCheck, Name, PolicyDecl, RecordsDecl, RowValue, TableDecl,
    TableField, TableGroupDecl, TablePartialDecl,
};
use crate::model::SemanticModel;
use crate::symbol::{SymbolId, SymbolKind};

/// Resolve the names of a validated model.
pub fn bind(mut model: SemanticModel) -> Report<SemanticModel> {
    let decls = std::mem::take(&mut model.decls);
    let mut binder = Binder {
        model,
        diagnostics: Vec::new(),
    };
    for decl in &decls {
        trace!(kind = %decl.kind(), node = %decl.node(), "binding declaration");
        match decl {
            Decl::Table(table) => binder.table(table),
            Decl::TablePartial(partial) => binder.table_partial(partial),
            Decl::Ref(r) => {
                let public = binder.model.symbols.public_schema();
                binder.endpoint(&r.left, public);
                binder.endpoint(&r.right, public);
            }
            Decl::TableGroup(group) => binder.table_group(group),
            Decl::Policy(policy) => binder.policy(policy),
            Decl::Records(records) => binder.records(records),
            Decl::Enum(_) | Decl::Project(_) | Decl::Function(_) | Decl::Note(_) => {}
        }
    }
    let Binder {
        mut model,
        diagnostics,
    } = binder;
    model.decls = decls;
    debug!(
        bindings = model.bindings_len(),
        diagnostics = diagnostics.len(),
        "bound program"
    );
    Report::with_diagnostics(model, diagnostics)
}

struct Binder {
    model: SemanticModel,
    diagnostics: Vec<Diagnostic>,
}

impl Binder {
    fn undefined(&mut self, span: Span, message: String) {
        self.diagnostics
            .push(Diagnostic::error(ErrorCode::UndefinedReference, span, message));
    }

    /// Record that `node` refers to `symbol`. A node is resolved once.
    fn record(&mut self, node: NodeId, span: Span, symbol: SymbolId) {
        if self.model.binding(node).is_some() {
            return;
        }
        self.model.bind(node, symbol);
        self.model.symbols.add_reference(symbol, node, span);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find a schema-level symbol, recording references on success.
    fn lookup(
        &mut self,
        kind: SymbolKind,
        schema: Option<&Name>,
        name: &Name,
        context: SymbolId,
    ) -> Option<SymbolId> {
        let symbols = &self.model.symbols;
        let (scope, found) = match schema {
            Some(schema) => {
                let scope = symbols.schema(&schema.name)?;
                (Some(scope), symbols.lookup(scope, kind, &name.name)?)
            }
            None => {
                let found = symbols
                    .lookup(context, kind, &name.name)
                    .or_else(|| symbols.lookup(symbols.public_schema(), kind, &name.name))?;
                (None, found)
            }
        };
        if let (Some(schema), Some(scope)) = (schema, scope) {
            self.record(schema.node, schema.span, scope);
        }
        self.record(name.node, name.span, found);
        Some(found)
    }

    /// Like [`Binder::lookup`], reporting a missing declaration.
    fn require(
        &mut self,
        kind: SymbolKind,
        schema: Option<&Name>,
        name: &Name,
        context: SymbolId,
    ) -> Option<SymbolId> {
        let found = self.lookup(kind, schema, name, context);
        if found.is_none() {
            let span = schema.map_or(name.span, |s| s.span.cover(name.span));
            let written = match schema {
                Some(schema) => format!("{}.{}", schema.name, name.name),
                None => name.name.clone(),
            };
            let article = if kind == SymbolKind::Enum { "An" } else { "A" };
            self.undefined(span, format!("{article} {kind} named '{written}' does not exist"));
        }
        found
    }

    /// A column of `table`, declared or injected.
    fn column(&mut self, table: SymbolId, column: &Name) -> Option<SymbolId> {
        match self.model.symbols.lookup_column(table, &column.name) {
            Some(symbol) => {
                self.record(column.node, column.span, symbol);
                Some(symbol)
            }
            None => {
                let table = self.model.symbols.qualified_name(table);
                self.undefined(
                    column.span,
                    format!("Column '{}' does not exist in table '{table}'", column.name),
                );
                None
            }
        }
    }

    /// The schema scope a declaration's own symbol lives in.
    fn schema_context(&self, symbol: SymbolId) -> SymbolId {
        self.model
            .symbols
            .schema_of(symbol)
            .unwrap_or_else(|| self.model.symbols.public_schema())
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn endpoint(&mut self, endpoint: &Endpoint, context: SymbolId) {
        let Some(table) = self.require(
            SymbolKind::Table,
            endpoint.schema.as_ref(),
            &endpoint.table,
            context,
        ) else {
            return;
        };
        for column in &endpoint.columns {
            self.column(table, column);
        }
    }

    fn table(&mut self, table: &TableDecl) {
        let context = self.schema_context(table.symbol);
        for field in &table.fields {
            match field {
                TableField::Column(column) => self.column_settings(column, context),
                TableField::Partial(injection) => {
                    let public = self.model.symbols.public_schema();
                    self.lookup(SymbolKind::TablePartial, None, &injection.name, public);
                }
            }
        }
    }

    fn table_partial(&mut self, partial: &TablePartialDecl) {
        let context = self.model.symbols.public_schema();
        for column in &partial.columns {
            self.column_settings(column, context);
        }
    }

    fn column_settings(&mut self, column: &ColumnDecl, context: SymbolId) {
        let column_type = &column.column_type;
        // any type that is not an enum is a SQL type name
        self.lookup(
            SymbolKind::Enum,
            column_type.schema.as_ref(),
            &column_type.name,
            context,
        );
        for inline in &column.settings.refs {
            self.endpoint(&inline.target, context);
        }
        for check in &column.settings.checks {
            if let InlineCheck::Enum { path, .. } = check {
                match path.as_slice() {
                    [name] => self.require(SymbolKind::Enum, None, name, context),
                    [schema, name] => self.require(SymbolKind::Enum, Some(schema), name, context),
                    _ => None,
                };
            }
        }
    }

    fn table_group(&mut self, group: &TableGroupDecl) {
        let context = self.schema_context(group.symbol);
        for member in &group.members {
            self.require(SymbolKind::Table, member.schema.as_ref(), &member.name, context);
        }
    }

    fn policy(&mut self, policy: &PolicyDecl) {
        let context = self.schema_context(policy.symbol);
        if let Some(table) = &policy.table {
            self.require(SymbolKind::Table, table.schema.as_ref(), &table.name, context);
        }
    }

    fn records(&mut self, records: &RecordsDecl) {
        let public = self.model.symbols.public_schema();
        let target = &records.table;
        let table = self.require(SymbolKind::Table, target.schema.as_ref(), &target.name, public);
        if let (Some(table), Some(columns)) = (table, &records.columns) {
            for column in columns {
                self.column(table, column);
            }
        }
        for row in &records.rows {
            for value in &row.values {
                if let RowValue::EnumValue(path) = &value.value {
                    self.enum_value(path, value.span, public);
                }
            }
        }
    }

    /// `enum.value` or `schema.enum.value`.
    fn enum_value(&mut self, path: &[Name], span: Span, context: SymbolId) {
        let (schema, enum_name, field) = match path {
            [enum_name, field] => (None, enum_name, field),
            [schema, enum_name, field] => (Some(schema), enum_name, field),
            _ => return,
        };
        let Some(symbol) = self.require(SymbolKind::Enum, schema, enum_name, context) else {
            return;
        };
        match self.model.symbols.lookup(symbol, SymbolKind::EnumField, &field.name) {
            Some(found) => self.record(field.node, field.span, found),
            None => {
                let enum_name = self.model.symbols.qualified_name(symbol);
                self.undefined(
                    span,
                    format!("Enum '{enum_name}' has no value '{}'", field.name),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests;
