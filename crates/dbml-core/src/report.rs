//! Accumulating result type threaded through every pipeline stage.
//!
//! A stage never aborts on bad input: it returns its best-effort value
//! together with the diagnostics it produced. `chain` feeds the value to the
//! next stage and concatenates diagnostics in stage order.

use crate::diagnostic::{Diagnostic, Severity};

#[derive(Clone, Debug, PartialEq)]
pub struct Report<T> {
    value: T,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl<T> Report<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Build a report from a value and diagnostics of mixed severity.
    pub fn with_diagnostics(value: T, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        let mut report = Self::new(value);
        report.extend(diagnostics);
        report
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Errors first, then warnings, each in emission order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    /// Thread the value through a further stage.
    pub fn chain<U>(self, stage: impl FnOnce(T) -> Report<U>) -> Report<U> {
        let Report {
            value,
            mut errors,
            mut warnings,
        } = self;
        let next = stage(value);
        errors.extend(next.errors);
        warnings.extend(next.warnings);
        Report {
            value: next.value,
            errors,
            warnings,
        }
    }

    /// Transform the value, keeping diagnostics untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Report<U> {
        Report {
            value: f(self.value),
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>, Vec<Diagnostic>) {
        (self.value, self.errors, self.warnings)
    }
}

impl<T: Default> Default for Report<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
