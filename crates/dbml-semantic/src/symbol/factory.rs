use dbml_core::Span;
use dbml_syntax::NodeId;

use super::{Reference, Symbol, SymbolId, SymbolIdGen, SymbolIndex, SymbolKind, SymbolTable};

/// Name of the schema unqualified declarations belong to.
pub const DEFAULT_SCHEMA: &str = "public";

/// Arena of every symbol created during one compilation.
///
/// The factory also owns the program scope, which maps schema names to
/// schema symbols. The `public` schema always exists.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolFactory {
    ids: SymbolIdGen,
    symbols: Vec<Symbol>,
    schemas: SymbolTable,
    public: SymbolId,
}

impl Default for SymbolFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolFactory {
    pub fn new() -> Self {
        let mut factory = Self {
            ids: SymbolIdGen::new(),
            symbols: Vec::new(),
            schemas: SymbolTable::new(),
            public: SymbolId(0),
        };
        let public = factory.create(SymbolKind::Schema, DEFAULT_SCHEMA, None, None);
        factory.public = factory.register_schema(DEFAULT_SCHEMA, public);
        factory
    }

    /// Allocate a symbol without registering it in any scope.
    pub fn create(
        &mut self,
        kind: SymbolKind,
        name: impl Into<String>,
        declaration: Option<NodeId>,
        parent: Option<SymbolId>,
    ) -> SymbolId {
        let id = self.ids.fresh();
        debug_assert_eq!(id.index(), self.symbols.len());
        self.symbols.push(Symbol {
            id,
            kind,
            name: name.into(),
            declaration,
            parent,
            scope: kind.has_scope().then(SymbolTable::new),
            references: Vec::new(),
        });
        id
    }

    /// Create a symbol and register it in `parent`'s scope.
    ///
    /// Fails with the already registered symbol when the name is taken.
    pub fn define(
        &mut self,
        parent: SymbolId,
        kind: SymbolKind,
        name: &str,
        declaration: NodeId,
    ) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.lookup(parent, kind, name) {
            return Err(existing);
        }
        let id = self.create(kind, name, Some(declaration), Some(parent));
        self.bind(parent, SymbolIndex::new(kind, name), id)?;
        Ok(id)
    }

    /// Register an existing symbol under another index of `parent`'s scope.
    pub fn bind(&mut self, parent: SymbolId, index: SymbolIndex, id: SymbolId) -> Result<(), SymbolId> {
        match self.symbols[parent.index()].scope.as_mut() {
            Some(scope) => scope.set(index, id),
            None => Err(parent),
        }
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn lookup(&self, parent: SymbolId, kind: SymbolKind, name: &str) -> Option<SymbolId> {
        self.get(parent).scope.as_ref()?.lookup(kind, name)
    }

    /// A column of a table, declared or injected from a partial.
    pub fn lookup_column(&self, table: SymbolId, name: &str) -> Option<SymbolId> {
        self.lookup(table, SymbolKind::Column, name)
            .or_else(|| self.lookup(table, SymbolKind::PartialInjectedColumn, name))
    }

    pub fn public_schema(&self) -> SymbolId {
        self.public
    }

    pub fn schema(&self, name: &str) -> Option<SymbolId> {
        self.schemas.lookup(SymbolKind::Schema, name)
    }

    /// The schema called `name`, created on first use.
    pub fn ensure_schema(&mut self, name: &str, declaration: NodeId) -> SymbolId {
        if let Some(id) = self.schema(name) {
            return id;
        }
        let id = self.create(SymbolKind::Schema, name, Some(declaration), None);
        self.register_schema(name, id)
    }

    /// Registers `id` as the schema `name`; an existing registration wins.
    fn register_schema(&mut self, name: &str, id: SymbolId) -> SymbolId {
        match self.schemas.set(SymbolIndex::new(SymbolKind::Schema, name), id) {
            Ok(()) => id,
            Err(existing) => existing,
        }
    }

    pub fn add_reference(&mut self, referee: SymbolId, node: NodeId, span: Span) {
        self.symbols[referee.index()].references.push(Reference {
            span,
            node,
            referee,
        });
    }

    /// The schema a table-level symbol lives in.
    pub fn schema_of(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if self.get(parent).kind == SymbolKind::Schema {
                return Some(parent);
            }
            current = self.get(parent).parent;
        }
        None
    }

    /// `schema.name` for tables, enums and friends; `schema.table.column`
    /// for columns and enum fields.
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut segments = vec![self.get(id).name.as_str()];
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            segments.push(&self.get(parent).name);
            current = self.get(parent).parent;
        }
        segments.reverse();
        segments.join(".")
    }
}
