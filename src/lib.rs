//! Error-tolerant compiler for the DBML database modeling language.
//!
//! The stages live in their own crates: [`dbml_syntax`] lexes and parses,
//! [`dbml_semantic`] validates and binds, and [`dbml_model`] interprets and
//! checks records. This crate ties them together behind a salsa database and
//! the [`Compiler`] facade.

pub mod compiler;
pub mod database;
pub mod diagnostics;
pub mod driver;
pub mod pipeline;

pub use compiler::{Compiler, Parse};
pub use database::{CheckOptions, DbmlDatabase, SourceFile};
pub use dbml_core::{Diagnostic, ErrorCode, LocatedDiagnostic, Severity};
pub use dbml_model::InterpreterDatabase;
