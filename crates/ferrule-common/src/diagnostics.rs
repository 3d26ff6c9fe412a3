//! Diagnostic records and rendering for the Ferrule front-end.
//!
//! Every pass appends [`Diagnostic`] records to a shared [`Diagnostics`]
//! list; nothing is ever removed. Rendering is a pure function of
//! (diagnostic, source): [`render`] produces a labeled report with the
//! offending span underlined, using ariadne with a colorless config so
//! output is stable across terminals and test snapshots.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::span::Span;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A single diagnostic record.
///
/// Messages own their backing storage: passes format messages with
/// dynamic content (type names, variant lists) and the diagnostic keeps
/// the resulting `String`, never a borrow into pass-local state.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// Optional fix suggestion rendered as a help line.
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn note(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Note,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Append-only list of diagnostics, in the order passes emitted them.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    /// Shorthand for pushing an error.
    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::error(message, span));
    }

    /// Shorthand for pushing a warning.
    pub fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::warning(message, span));
    }

    /// Shorthand for pushing a note.
    pub fn note(&mut self, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::note(message, span));
    }

    /// Whether any error-severity diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.records
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn note_count(&self) -> usize {
        self.count(Severity::Note)
    }

    fn count(&self, severity: Severity) -> usize {
        self.records
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Iterate in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    /// Diagnostics sorted by primary span start, for user-facing output.
    pub fn in_source_order(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.records.iter().collect();
        sorted.sort_by_key(|d| (d.span.start, d.span.end));
        sorted
    }

    /// Render every diagnostic in source order, concatenated.
    pub fn render_all(&self, source: &str, file_name: &str) -> String {
        let mut out = String::new();
        for diag in self.in_source_order() {
            out.push_str(&render(diag, source, file_name));
        }
        out
    }
}

/// Render a diagnostic into a formatted report string.
///
/// Output is colorless for consistent snapshots. The report carries the
/// severity, message, a label under the offending span, and the hint as a
/// help line when present.
pub fn render(diagnostic: &Diagnostic, source: &str, _file_name: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    // Clamp the span to source bounds; ariadne needs a non-empty range,
    // so zero-length spans (typically end-of-file) widen to the nearest
    // character.
    let start = (diagnostic.span.start as usize).min(source_len);
    let end = (diagnostic.span.end as usize).min(source_len).max(start);
    let range: Range<usize> = if start < end {
        start..end
    } else if end < source_len {
        start..end + 1
    } else if start > 0 {
        start - 1..end
    } else {
        0..0
    };

    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut builder = Report::build(kind, range.clone())
        .with_message(&diagnostic.message)
        .with_config(config)
        .with_label(Label::new(range).with_message(&diagnostic.message));

    if let Some(hint) = &diagnostic.hint {
        builder.set_help(hint);
    }

    let mut buf = Vec::new();
    builder
        .finish()
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let mut diags = Diagnostics::new();
        diags.error("bad", Span::new(0, 1));
        diags.warning("iffy", Span::new(2, 3));
        diags.warning("iffy too", Span::new(4, 5));
        diags.note("fyi", Span::new(6, 7));

        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 2);
        assert_eq!(diags.note_count(), 1);
        assert_eq!(diags.len(), 4);
    }

    #[test]
    fn no_errors_when_only_warnings() {
        let mut diags = Diagnostics::new();
        diags.warning("iffy", Span::new(0, 1));
        assert!(!diags.has_errors());
    }

    #[test]
    fn source_order_sorts_by_span() {
        let mut diags = Diagnostics::new();
        diags.error("second", Span::new(10, 12));
        diags.error("first", Span::new(2, 4));

        let ordered = diags.in_source_order();
        assert_eq!(ordered[0].message, "first");
        assert_eq!(ordered[1].message, "second");
    }

    #[test]
    fn render_includes_message_and_hint() {
        let source = "const x = 42;";
        let diag = Diagnostic::error("numeric literal requires explicit type annotation", Span::new(6, 7))
            .with_hint("write `const x: i32 = 42;`");
        let out = render(&diag, source, "test.fe");
        assert!(out.contains("numeric literal requires explicit type annotation"));
        assert!(out.contains("const x: i32"));
    }

    #[test]
    fn render_clamps_out_of_bounds_span() {
        let diag = Diagnostic::error("past the end", Span::new(100, 120));
        // Must not panic.
        let out = render(&diag, "short", "test.fe");
        assert!(out.contains("past the end"));
    }
}
