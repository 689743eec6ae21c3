//! Diagnostic messages emitted during compilation.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::line_index::LineIndex;
use crate::span::{Position, Span};

/// A diagnostic (error or warning) with source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    pub severity: Severity,
    pub phase: CompilationPhase,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(code, span, message, Severity::Error)
    }

    pub fn warning(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(code, span, message, Severity::Warning)
    }

    fn new(code: ErrorCode, span: Span, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            severity,
            phase: code.phase(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert byte offsets to the 1-based line/column shape consumers expect.
    pub fn locate(&self, index: &LineIndex) -> LocatedDiagnostic {
        LocatedDiagnostic {
            code: self.code,
            severity: self.severity,
            message: self.message.clone(),
            start: index.position(self.span.start),
            end: index.position(self.span.end),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

/// Diagnostic as exposed to editors and other tooling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatedDiagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub start: Position,
    pub end: Position,
}

/// Severity level of a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[display("error")]
    Error,
    #[display("warning")]
    Warning,
}

/// Compilation phase where a diagnostic was emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum CompilationPhase {
    Lexing,
    Parsing,
    Validation,
    Binding,
    Interpretation,
    ConstraintCheck,
}

/// Stable identifier of every diagnostic the compiler can produce.
///
/// The numeric value groups codes by phase: 1xxx lexing, 2xxx parsing,
/// 3xxx validation, 4xxx binding, 5xxx interpretation, 6xxx constraints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[display("UNKNOWN_CHARACTER")]
    UnknownCharacter = 1000,
    #[display("UNTERMINATED_STRING")]
    UnterminatedString = 1001,
    #[display("UNTERMINATED_QUOTED_IDENTIFIER")]
    UnterminatedQuotedIdentifier = 1002,
    #[display("UNTERMINATED_MULTILINE_STRING")]
    UnterminatedMultilineString = 1003,
    #[display("UNTERMINATED_FUNCTION_EXPRESSION")]
    UnterminatedFunctionExpression = 1004,
    #[display("UNTERMINATED_COMMENT")]
    UnterminatedComment = 1005,
    #[display("INVALID_ESCAPE_SEQUENCE")]
    InvalidEscapeSequence = 1006,

    #[display("UNEXPECTED_TOKEN")]
    UnexpectedToken = 2000,
    #[display("MISSING_CLOSING_DELIMITER")]
    MissingClosingDelimiter = 2001,
    #[display("EXPECTED_EXPRESSION")]
    ExpectedExpression = 2002,
    #[display("EXPECTED_ELEMENT_BODY")]
    ExpectedElementBody = 2003,
    #[display("EXPECTED_IDENTIFIER")]
    ExpectedIdentifier = 2004,

    #[display("UNKNOWN_ELEMENT_TYPE")]
    UnknownElementType = 3000,
    #[display("INVALID_ELEMENT_CONTEXT")]
    InvalidElementContext = 3001,
    #[display("INVALID_NAME")]
    InvalidName = 3002,
    #[display("MISSING_NAME")]
    MissingName = 3003,
    #[display("UNEXPECTED_ALIAS")]
    UnexpectedAlias = 3004,
    #[display("INVALID_BODY")]
    InvalidBody = 3005,
    #[display("UNKNOWN_SETTING")]
    UnknownSetting = 3006,
    #[display("DUPLICATE_SETTING")]
    DuplicateSetting = 3007,
    #[display("INVALID_SETTING_VALUE")]
    InvalidSettingValue = 3008,
    #[display("CONFLICTING_SETTINGS")]
    ConflictingSettings = 3009,
    #[display("DUPLICATE_NAME")]
    DuplicateName = 3010,
    #[display("PROJECT_REDEFINED")]
    ProjectRedefined = 3011,
    #[display("INVALID_FIELD_VALUE")]
    InvalidFieldValue = 3012,
    #[display("INVALID_COLUMN")]
    InvalidColumn = 3013,
    #[display("EMPTY_ENUM")]
    EmptyEnum = 3014,
    #[display("INVALID_RELATIONSHIP")]
    InvalidRelationship = 3015,
    #[display("INVALID_TYPE")]
    InvalidType = 3016,
    #[display("UNKNOWN_TABLE_PARTIAL")]
    UnknownTablePartial = 3017,
    #[display("INVALID_RECORD_VALUE")]
    InvalidRecordValue = 3018,
    #[display("MISSING_SETTING")]
    MissingSetting = 3019,

    #[display("UNDEFINED_REFERENCE")]
    UndefinedReference = 4000,

    #[display("SAME_ENDPOINT")]
    SameEndpoint = 5000,
    #[display("DUPLICATE_REF")]
    DuplicateRef = 5001,
    #[display("RECORD_ARITY_MISMATCH")]
    RecordArityMismatch = 5002,
    #[display("TABLE_IN_MULTIPLE_GROUPS")]
    TableInMultipleGroups = 5003,
    #[display("MALFORMED_ELEMENT")]
    MalformedElement = 5004,

    #[display("NULL_IN_PRIMARY_KEY")]
    NullInPrimaryKey = 6000,
    #[display("MISSING_PRIMARY_KEY")]
    MissingPrimaryKey = 6001,
    #[display("DUPLICATE_PRIMARY_KEY")]
    DuplicatePrimaryKey = 6002,
    #[display("DUPLICATE_UNIQUE")]
    DuplicateUnique = 6003,
    #[display("NULL_IN_NOT_NULL")]
    NullInNotNull = 6004,
    #[display("FOREIGN_KEY_VIOLATION")]
    ForeignKeyViolation = 6005,
}

impl ErrorCode {
    /// Numeric code, stable across releases.
    pub const fn number(self) -> u32 {
        self as u32
    }

    pub const fn phase(self) -> CompilationPhase {
        match self.number() / 1000 {
            1 => CompilationPhase::Lexing,
            2 => CompilationPhase::Parsing,
            3 => CompilationPhase::Validation,
            4 => CompilationPhase::Binding,
            5 => CompilationPhase::Interpretation,
            _ => CompilationPhase::ConstraintCheck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_code() {
        assert_eq!(ErrorCode::UnterminatedString.phase(), CompilationPhase::Lexing);
        assert_eq!(ErrorCode::UnexpectedToken.phase(), CompilationPhase::Parsing);
        assert_eq!(ErrorCode::InvalidFieldValue.phase(), CompilationPhase::Validation);
        assert_eq!(ErrorCode::UndefinedReference.phase(), CompilationPhase::Binding);
        assert_eq!(ErrorCode::DuplicateRef.phase(), CompilationPhase::Interpretation);
        assert_eq!(
            ErrorCode::ForeignKeyViolation.phase(),
            CompilationPhase::ConstraintCheck
        );
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::error(ErrorCode::ProjectRedefined, Span::new(0, 7), "Project is redefined");
        assert_eq!(diag.to_string(), "[error] PROJECT_REDEFINED: Project is redefined");
        assert_eq!(ErrorCode::ProjectRedefined.number(), 3011);
    }

    #[test]
    fn test_locate_is_one_based() {
        let index = LineIndex::new("Table t {\n  id int\n}");
        let diag = Diagnostic::warning(ErrorCode::InvalidColumn, Span::new(12, 14), "w");
        let located = diag.locate(&index);
        assert_eq!(located.start, Position::new(2, 3));
        assert_eq!(located.end, Position::new(2, 5));
        assert_eq!(located.severity, Severity::Warning);
    }
}
