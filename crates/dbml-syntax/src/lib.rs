//! Lexing and parsing for DBML.
//!
//! [`lex`] turns source text into a lossless token stream and [`parse`]
//! builds an error-tolerant concrete syntax tree from it.

pub mod context;
pub mod cst;
pub mod lexer;
pub mod parser;
pub mod token;

pub use cst::{
    Attribute, CallExpression, CommaExpression, Delimited, ElementDeclaration,
    FunctionApplication, IdentifierStream, InfixExpression, NameSegment, NodeId, NodeIdGen,
    NodeKind, PrefixExpression, Program, SyntaxNode, SyntaxTree,
};
pub use lexer::lex;
pub use parser::parse;
pub use token::{Token, TokenKind, reconstruct};

/// Lex and parse `source`, concatenating both stages' diagnostics.
pub fn parse_source(source: &str) -> dbml_core::Report<(Vec<Token>, SyntaxTree)> {
    lex(source).chain(|tokens| parse(tokens.clone()).map(|tree| (tokens, tree)))
}
