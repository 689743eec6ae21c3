//! The compiler facade consumed by tooling.
//!
//! A [`Compiler`] owns one database and one [`SourceFile`]. Replacing the
//! source invalidates every derived query; asking for a result computes
//! only the stages it depends on.

use dbml_core::{Diagnostic, LineIndex, LocatedDiagnostic};
use dbml_model::InterpreterDatabase;
use dbml_semantic::SemanticModel;
use dbml_syntax::{SyntaxTree, Token};
use salsa::Setter;

use crate::database::{CheckOptions, DbmlDatabase, SourceFile};
use crate::pipeline;

pub struct Compiler {
    db: DbmlDatabase,
    source: SourceFile,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new("")
    }
}

impl Compiler {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_options(text, CheckOptions::default())
    }

    pub fn with_options(text: impl Into<String>, options: CheckOptions) -> Self {
        let db = DbmlDatabase::default();
        let source = SourceFile::new(&db, text.into(), options);
        Self { db, source }
    }

    /// Replace the whole source text.
    pub fn set_source(&mut self, text: impl Into<String>) {
        self.source.set_text(&mut self.db).to(text.into());
    }

    pub fn set_options(&mut self, options: CheckOptions) {
        self.source.set_options(&mut self.db).to(options);
    }

    pub fn source(&self) -> &str {
        self.source.text(&self.db)
    }

    pub fn parse(&self) -> Parse<'_> {
        Parse { compiler: self }
    }

    /// Diagnostics of every stage, without positions.
    pub fn raw_diagnostics(&self) -> Vec<Diagnostic> {
        pipeline::all_diagnostics(&self.db, self.source)
    }

    /// Diagnostics of every stage with 1-based line and column positions.
    pub fn diagnostics(&self) -> Vec<LocatedDiagnostic> {
        let index = LineIndex::new(self.source());
        self.raw_diagnostics()
            .iter()
            .map(|diag| diag.locate(&index))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.raw_diagnostics().iter().any(Diagnostic::is_error)
    }
}

/// Results of the pipeline for the current source.
pub struct Parse<'c> {
    compiler: &'c Compiler,
}

impl Parse<'_> {
    pub fn tokens(&self) -> Vec<Token> {
        let Compiler { db, source } = self.compiler;
        pipeline::lex_source(db, *source).into_value()
    }

    pub fn ast(&self) -> SyntaxTree {
        let Compiler { db, source } = self.compiler;
        pipeline::parse_source(db, *source).into_value()
    }

    /// Lexing and parsing diagnostics only.
    pub fn errors(&self) -> Vec<Diagnostic> {
        let Compiler { db, source } = self.compiler;
        pipeline::syntax_diagnostics(db, *source)
    }

    /// Validated and bound declarations with their symbols.
    pub fn semantic_model(&self) -> SemanticModel {
        let Compiler { db, source } = self.compiler;
        pipeline::analyze_source(db, *source).into_value()
    }

    /// The interpreted model, computed on demand.
    pub fn raw_db(&self) -> InterpreterDatabase {
        let Compiler { db, source } = self.compiler;
        pipeline::interpret_source(db, *source).into_value()
    }
}

#[cfg(test)]
mod tests {
    use dbml_core::{CompilationPhase, ErrorCode, Position};

    use super::*;

    #[test]
    fn test_set_source_recompiles() {
        let mut compiler = Compiler::new("Table users {\n  id int\n}");
        assert!(compiler.diagnostics().is_empty());
        assert_eq!(compiler.parse().raw_db().tables.len(), 1);

        compiler.set_source("Table users {\n  id int\n}\nTable users {\n  id int\n}");
        let codes: Vec<_> = compiler.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, [ErrorCode::DuplicateName]);
        assert!(compiler.has_errors());
    }

    #[test]
    fn test_parse_errors_exclude_later_stages() {
        let compiler = Compiler::new("Table t {\n  id int [ref: > missing.id]\n}\nTable {");
        let parse = compiler.parse();
        let errors = parse.errors();
        assert!(!errors.is_empty());
        assert!(
            errors
                .iter()
                .all(|d| matches!(d.phase, CompilationPhase::Lexing | CompilationPhase::Parsing))
        );
        assert!(
            compiler
                .raw_diagnostics()
                .iter()
                .any(|d| d.code == ErrorCode::UndefinedReference)
        );
    }

    #[test]
    fn test_located_positions() {
        let compiler = Compiler::new("Table t {\n  id int [pk, pk]\n}");
        let diagnostics = compiler.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::DuplicateSetting);
        assert_eq!(diagnostics[0].start.line, 2);
        assert!(diagnostics[0].start >= Position::new(2, 1));
    }

    #[test]
    fn test_record_checks_follow_options() {
        let source = "Table t {\n  id int [pk]\n}\nRecords t {\n  1\n  1\n}";
        let mut compiler = Compiler::new(source);
        assert!(compiler.has_errors());
        compiler.set_options(CheckOptions {
            check_records: false,
        });
        assert!(!compiler.has_errors());
    }
}
