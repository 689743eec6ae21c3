//! Semantic analysis for DBML.
//!
//! [`validate`] turns a syntax tree into typed declarations and registers
//! their symbols; [`bind`] then resolves every name that refers to another
//! declaration. Both stages report through [`dbml_core::Report`] and never
//! stop at the first problem.

pub mod bind;
pub mod decl;
pub mod element;
pub mod model;
pub mod symbol;
pub mod validate;

pub use bind::bind;
pub use element::ElementKind;
pub use model::SemanticModel;
pub use symbol::{
    DEFAULT_SCHEMA, Reference, Symbol, SymbolFactory, SymbolId, SymbolIndex, SymbolKind,
    SymbolTable,
};
pub use validate::validate;

/// Validate and bind a parsed program.
pub fn analyze(tree: dbml_syntax::SyntaxTree) -> dbml_core::Report<SemanticModel> {
    validate(tree).chain(bind)
}
