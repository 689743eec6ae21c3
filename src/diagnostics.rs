//! Diagnostic formatting for the command-line driver.

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use dbml_core::{CompilationPhase, Diagnostic, Severity};

/// Get the display color for a compilation phase.
pub fn phase_color(phase: CompilationPhase) -> Color {
    match phase {
        CompilationPhase::Lexing | CompilationPhase::Parsing => Color::Red,
        CompilationPhase::Validation => Color::Yellow,
        CompilationPhase::Binding => Color::Magenta,
        CompilationPhase::Interpretation => Color::Cyan,
        CompilationPhase::ConstraintCheck => Color::Blue,
    }
}

/// Normalize a span to ensure end > start (required by ariadne).
pub fn normalize_span(start: usize, end: usize) -> (usize, usize) {
    (start, end.max(start + 1))
}

/// Render a diagnostic against its source text.
pub fn render_diagnostic(diag: &Diagnostic, source: &str, file_path: &str, color: bool) -> String {
    let (start, end) = normalize_span(diag.span.start, diag.span.end);
    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };
    let config = Config::default()
        .with_color(color)
        .with_index_type(IndexType::Byte);

    let mut out = Vec::new();
    Report::build(kind, (file_path, start..end))
        .with_config(config)
        .with_code(diag.code)
        .with_message(&diag.message)
        .with_label(
            Label::new((file_path, start..end))
                .with_message(&diag.message)
                .with_color(phase_color(diag.phase)),
        )
        .finish()
        .write((file_path, Source::from(source)), &mut out)
        .ok();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use dbml_core::{ErrorCode, Span};

    use super::*;

    #[test]
    fn test_phase_color() {
        assert_eq!(phase_color(CompilationPhase::Parsing), Color::Red);
        assert_eq!(phase_color(CompilationPhase::Binding), Color::Magenta);
        assert_eq!(phase_color(CompilationPhase::ConstraintCheck), Color::Blue);
    }

    #[test]
    fn test_normalize_span_zero_length() {
        assert_eq!(normalize_span(0, 10), (0, 10));
        assert_eq!(normalize_span(5, 5), (5, 6));
    }

    #[test]
    fn test_render_names_code_and_message() {
        let source = "Table t {\n  id int [pk, pk]\n}";
        let diag = Diagnostic::error(
            ErrorCode::DuplicateSetting,
            Span::new(24, 26),
            "Setting 'pk' is specified more than once",
        );
        let rendered = render_diagnostic(&diag, source, "schema.dbml", false);
        assert!(rendered.contains("DUPLICATE_SETTING"), "{rendered}");
        assert!(rendered.contains("Setting 'pk' is specified more than once"));
        assert!(rendered.contains("schema.dbml:2:"), "{rendered}");
    }
}
