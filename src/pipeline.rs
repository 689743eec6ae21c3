//! Compilation pipeline for DBML.
//!
//! Each stage is a Salsa tracked function over a [`SourceFile`], so a
//! stage re-runs only when the source text or options change.
//!
//! ```text
//! SourceFile
//!     │
//!     ▼
//! lex_source ─► tokens
//!     │
//!     ▼
//! parse_source ─► SyntaxTree
//!     │
//!     ▼
//! analyze_source ─► SemanticModel (validated and bound)
//!     │
//!     ▼
//! interpret_source ─► InterpreterDatabase
//!     │
//!     ▼
//! check_source ─► record diagnostics (skipped unless enabled)
//! ```
//!
//! Every stage returns its own diagnostics only; [`all_diagnostics`]
//! concatenates them in stage order.

use dbml_core::{Diagnostic, Report};
use dbml_model::InterpreterDatabase;
use dbml_semantic::SemanticModel;
use dbml_syntax::{SyntaxTree, Token};
use tracing::debug;

use crate::database::SourceFile;

#[salsa::tracked]
pub fn lex_source(db: &dyn salsa::Database, source: SourceFile) -> Report<Vec<Token>> {
    let report = dbml_syntax::lex(source.text(db));
    debug!(tokens = report.value().len(), "lexed source");
    report
}

#[salsa::tracked]
pub fn parse_source(db: &dyn salsa::Database, source: SourceFile) -> Report<SyntaxTree> {
    let tokens = lex_source(db, source).into_value();
    dbml_syntax::parse(tokens)
}

#[salsa::tracked]
pub fn analyze_source(db: &dyn salsa::Database, source: SourceFile) -> Report<SemanticModel> {
    let tree = parse_source(db, source).into_value();
    dbml_semantic::analyze(tree)
}

#[salsa::tracked]
pub fn interpret_source(
    db: &dyn salsa::Database,
    source: SourceFile,
) -> Report<InterpreterDatabase> {
    let model = analyze_source(db, source);
    dbml_model::interpret(model.value())
}

#[salsa::tracked]
pub fn check_source(db: &dyn salsa::Database, source: SourceFile) -> Vec<Diagnostic> {
    if !source.options(db).check_records {
        return Vec::new();
    }
    let database = interpret_source(db, source);
    dbml_model::check(database.value())
}

/// Lexing and parsing diagnostics.
pub fn syntax_diagnostics(db: &dyn salsa::Database, source: SourceFile) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<_> = lex_source(db, source).diagnostics().cloned().collect();
    diagnostics.extend(parse_source(db, source).diagnostics().cloned());
    diagnostics
}

/// Diagnostics of every stage, in stage order.
pub fn all_diagnostics(db: &dyn salsa::Database, source: SourceFile) -> Vec<Diagnostic> {
    let mut diagnostics = syntax_diagnostics(db, source);
    diagnostics.extend(analyze_source(db, source).diagnostics().cloned());
    diagnostics.extend(interpret_source(db, source).diagnostics().cloned());
    diagnostics.extend(check_source(db, source));
    diagnostics
}
