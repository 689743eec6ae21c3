//! Shared building blocks for the DBML compiler.
//!
//! Every pipeline stage reports through [`Report`], locates problems with
//! [`Span`], and classifies them with [`ErrorCode`].

pub mod diagnostic;
pub mod line_index;
pub mod report;
pub mod span;
pub mod text;

pub use diagnostic::{CompilationPhase, Diagnostic, ErrorCode, LocatedDiagnostic, Severity};
pub use line_index::LineIndex;
pub use report::Report;
pub use span::{Position, Span};
pub use text::{escape_string, split_qualified_identifier, unescape, unescape_string, Unescaped};
