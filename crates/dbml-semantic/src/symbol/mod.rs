//! Symbols, scopes and the per-compilation symbol arena.
//!
//! A [`Symbol`] is the semantic entity a name denotes. Symbols live in a
//! [`SymbolFactory`] arena and are addressed by [`SymbolId`]; scope-bearing
//! symbols own a [`SymbolTable`] mapping [`SymbolIndex`] keys to children.

mod factory;
mod table;

pub use factory::{DEFAULT_SCHEMA, SymbolFactory};
pub use table::{SymbolIndex, SymbolTable};

use dbml_core::Span;
use dbml_syntax::NodeId;
use derive_more::Display;
use serde::Serialize;

/// Unique identifier of a symbol within one compilation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Generator for SymbolIds, owned by a single [`SymbolFactory`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolIdGen(u32);

impl SymbolIdGen {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn fresh(&mut self) -> SymbolId {
        let id = SymbolId(self.0);
        self.0 = self.0.checked_add(1).expect("SymbolId overflow");
        id
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
pub enum SymbolKind {
    #[display("schema")]
    Schema,
    #[display("table")]
    Table,
    #[display("column")]
    Column,
    #[display("enum")]
    Enum,
    #[display("enum field")]
    EnumField,
    #[display("ref")]
    Ref,
    #[display("table group")]
    TableGroup,
    #[display("table partial")]
    TablePartial,
    #[display("column")]
    PartialInjectedColumn,
    #[display("function")]
    Function,
    #[display("policy")]
    Policy,
    #[display("note")]
    Note,
}

impl SymbolKind {
    /// Kinds that own a child scope.
    pub fn has_scope(self) -> bool {
        matches!(
            self,
            SymbolKind::Schema | SymbolKind::Table | SymbolKind::Enum | SymbolKind::TablePartial
        )
    }

    pub fn is_column(self) -> bool {
        matches!(self, SymbolKind::Column | SymbolKind::PartialInjectedColumn)
    }
}

/// A use of a symbol somewhere in the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub span: Span,
    /// The referring syntax node.
    pub node: NodeId,
    pub referee: SymbolId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub name: String,
    /// Declaring syntax node. Absent for the implicit `public` schema.
    pub declaration: Option<NodeId>,
    /// Enclosing symbol (a schema for tables, a table for columns, ...).
    pub parent: Option<SymbolId>,
    pub scope: Option<SymbolTable>,
    pub references: Vec<Reference>,
}
