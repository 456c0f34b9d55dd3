//! Diagnostic queue for collecting diagnostics across a run.
//!
//! One declaration's failure never aborts its siblings: diagnostics
//! accumulate here and the caller decides, per declaration, whether errors
//! occurred by staging a fresh queue and merging it back.

use crate::{Diagnostic, Severity};

/// Ordered collection of diagnostics.
#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the queue.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Drain all diagnostics, leaving the queue empty.
    pub fn take_all(&mut self) -> Vec<Diagnostic> {
        self.errors = 0;
        std::mem::take(&mut self.diagnostics)
    }

    /// Move every diagnostic from `other` into this queue.
    pub fn merge(&mut self, other: &mut DiagnosticQueue) {
        self.errors += other.errors;
        other.errors = 0;
        self.diagnostics.append(&mut other.diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Diagnostic, ErrorCode};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_error_counting() {
        let mut queue = DiagnosticQueue::new();
        queue.emit(Diagnostic::error(ErrorCode::E1001).with_message("not an interface"));
        queue.emit(Diagnostic::warning(ErrorCode::W2101).with_message("missing dependency"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.error_count(), 1);
        assert!(queue.has_errors());
        assert_eq!(queue.warnings().count(), 1);
    }

    #[test]
    fn test_merge_resets_source() {
        let mut staged = DiagnosticQueue::new();
        staged.emit(Diagnostic::error(ErrorCode::E1003).with_message("clash"));

        let mut main = DiagnosticQueue::new();
        main.merge(&mut staged);

        assert!(staged.is_empty());
        assert!(!staged.has_errors());
        assert_eq!(main.error_count(), 1);
    }

    #[test]
    fn test_take_all() {
        let mut queue = DiagnosticQueue::new();
        queue.emit(Diagnostic::error(ErrorCode::E9001).with_message("failed to generate"));
        let drained = queue.take_all();
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());
        assert!(!queue.has_errors());
    }
}
