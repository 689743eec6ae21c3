//! Interpretation: bound declarations to the relational model.
//!
//! Each element kind has its own interpreter, selected by a `match` on the
//! declaration. Interpreters read resolved names through the model's
//! binding side table; a name the binder could not resolve was already
//! reported, so whatever depends on it is skipped silently here.

mod elements;
mod records;
mod relation;
mod table;

use std::collections::{HashMap, HashSet};

use dbml_core::{Diagnostic, ErrorCode, Report, Span};
use dbml_semantic::decl::{Decl, Name};
use dbml_semantic::{DEFAULT_SCHEMA, SemanticModel, SymbolId, SymbolKind};
use tracing::{debug, trace};

use crate::model::{InterpreterDatabase, TableName};

/// Build the relational model from a bound program.
pub fn interpret(model: &SemanticModel) -> Report<InterpreterDatabase> {
    let mut interpreter = Interpreter::new(model);
    for decl in &model.decls {
        trace!(kind = %decl.kind(), node = %decl.node(), "interpreting declaration");
        match decl {
            Decl::Table(table) => interpreter.table(table),
            Decl::TablePartial(partial) => interpreter.table_partial(partial),
            Decl::Enum(decl) => interpreter.enum_(decl),
            Decl::Ref(decl) => interpreter.ref_(decl),
            Decl::Project(decl) => interpreter.project(decl),
            Decl::TableGroup(decl) => interpreter.table_group(decl),
            Decl::Function(decl) => interpreter.function(decl),
            Decl::Policy(decl) => interpreter.policy(decl),
            Decl::Records(decl) => interpreter.records(decl),
            Decl::Note(decl) => interpreter.note(decl),
        }
    }
    let Interpreter { db, diagnostics, .. } = interpreter;
    debug!(
        tables = db.tables.len(),
        refs = db.refs.len(),
        records = db.records.len(),
        diagnostics = diagnostics.len(),
        "interpreted program"
    );
    Report::with_diagnostics(db, diagnostics)
}

pub(crate) struct Interpreter<'m> {
    model: &'m SemanticModel,
    db: InterpreterDatabase,
    diagnostics: Vec<Diagnostic>,
    /// Endpoint pairs of the relationships seen so far.
    ref_keys: HashSet<relation::RefKey>,
    /// The group each grouped table belongs to.
    grouped: HashMap<TableName, String>,
}

impl<'m> Interpreter<'m> {
    fn new(model: &'m SemanticModel) -> Self {
        Self {
            model,
            db: InterpreterDatabase::default(),
            diagnostics: Vec::new(),
            ref_keys: HashSet::new(),
            grouped: HashMap::new(),
        }
    }

    pub(crate) fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(code, span, message));
    }

    /// The symbol a name resolved to, if it is of `kind`.
    pub(crate) fn resolved(&self, name: &Name, kind: SymbolKind) -> Option<SymbolId> {
        let symbol = self.model.binding(name.node)?;
        (self.model.symbols.get(symbol).kind == kind).then_some(symbol)
    }

    /// Name of the schema a table-level symbol lives in.
    pub(crate) fn schema_name(&self, symbol: SymbolId) -> String {
        let symbols = &self.model.symbols;
        symbols
            .schema_of(symbol)
            .map_or_else(|| DEFAULT_SCHEMA.to_string(), |s| symbols.get(s).name.clone())
    }

    pub(crate) fn table_name(&self, table: SymbolId) -> TableName {
        TableName {
            schema_name: self.schema_name(table),
            table_name: self.model.symbols.get(table).name.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
