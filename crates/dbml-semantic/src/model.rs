//! The semantic model shared by the validator, binder and interpreter.

use std::collections::HashMap;

use dbml_syntax::{NodeId, SyntaxTree};

use crate::decl::{Decl, TableDecl};
use crate::symbol::{SymbolFactory, SymbolId};

#[derive(Clone, Debug, PartialEq)]
pub struct SemanticModel {
    pub tree: SyntaxTree,
    pub symbols: SymbolFactory,
    /// Validated declarations in source order.
    pub decls: Vec<Decl>,
    /// Referring name nodes and the symbols they resolved to.
    bindings: HashMap<NodeId, SymbolId>,
}

impl SemanticModel {
    pub fn new(tree: SyntaxTree, symbols: SymbolFactory, decls: Vec<Decl>) -> Self {
        Self {
            tree,
            symbols,
            decls,
            bindings: HashMap::new(),
        }
    }

    /// The symbol a referring node resolved to.
    pub fn binding(&self, node: NodeId) -> Option<SymbolId> {
        self.bindings.get(&node).copied()
    }

    /// Record a resolution. A node is bound at most once; later attempts
    /// keep the first symbol.
    pub fn bind(&mut self, node: NodeId, symbol: SymbolId) {
        self.bindings.entry(node).or_insert(symbol);
    }

    pub fn bindings_len(&self) -> usize {
        self.bindings.len()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Table(table) => Some(table),
            _ => None,
        })
    }

    /// The declaration of the table behind `symbol`.
    pub fn table(&self, symbol: SymbolId) -> Option<&TableDecl> {
        self.tables().find(|table| table.symbol == symbol)
    }
}
