//! Compiler diagnostics
//!
//! A [`Diagnostic`] carries a severity, an optional `E`-prefixed code, a
//! message, an optional primary span and any number of labels, notes and
//! help lines. [`ErrorFormatter`] renders them as plain text against a
//! [`SourceMap`].

use std::fmt;

pub use source_map::{FileId, SourceFile, SourceMap, SourcePosition, SourceSpan};

pub mod internal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Note => write!(f, "note"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: SourceSpan,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: Option<String>,
    pub message: String,
    /// `None` when the problem has no usable source location
    pub span: Option<SourceSpan>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    fn with_severity(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic {
                severity,
                code: None,
                message: message.into(),
                span: None,
                labels: Vec::new(),
                notes: Vec::new(),
                help: Vec::new(),
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(DiagnosticSeverity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(DiagnosticSeverity::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::with_severity(DiagnosticSeverity::Note, message)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    pub fn span(mut self, span: Option<SourceSpan>) -> Self {
        self.diagnostic.span = span;
        self
    }

    pub fn label(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.diagnostic.labels.push(Label::primary(span, message));
        self
    }

    pub fn secondary_label(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.diagnostic.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic.help.push(help.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

/// Plain-text renderer in the usual `error[E0000]: message` layout
#[derive(Debug, Default)]
pub struct ErrorFormatter;

impl ErrorFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_diagnostics(&self, diagnostics: &Diagnostics, source_map: &SourceMap) -> String {
        diagnostics
            .iter()
            .map(|d| self.format_diagnostic(d, source_map))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic, source_map: &SourceMap) -> String {
        let mut out = String::new();
        out.push_str(&diagnostic.severity.to_string());
        if let Some(code) = &diagnostic.code {
            out.push_str(&format!("[{}]", code));
        }
        out.push_str(&format!(": {}\n", diagnostic.message));

        if let Some(span) = diagnostic.span {
            self.format_snippet(&mut out, diagnostic, span, source_map);
        }

        for label in diagnostic
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary)
        {
            if let Some(name) = source_map.file_name(label.span.file_id) {
                out.push_str(&format!(
                    "  --> {}:{}:{}: {}\n",
                    name, label.span.start.line, label.span.start.column, label.message
                ));
            }
        }
        for help in &diagnostic.help {
            out.push_str(&format!("  = help: {}\n", help));
        }
        for note in &diagnostic.notes {
            out.push_str(&format!("  = note: {}\n", note));
        }
        out
    }

    fn format_snippet(&self, out: &mut String, diagnostic: &Diagnostic, span: SourceSpan, source_map: &SourceMap) {
        let Some(name) = source_map.file_name(span.file_id) else {
            return;
        };
        out.push_str(&format!("  --> {}:{}:{}\n", name, span.start.line, span.start.column));

        let Some(line) = source_map.get_line(span.file_id, span.start.line) else {
            return;
        };
        let gutter = " ".repeat(span.start.line.to_string().len());
        out.push_str(&format!("{} |\n", gutter));
        out.push_str(&format!("{} | {}\n", span.start.line, line));

        let start = span.start.column.saturating_sub(1);
        let width = if span.is_single_line() {
            span.end.column.saturating_sub(span.start.column)
        } else {
            line.len().saturating_sub(start)
        };
        out.push_str(&format!("{} | {}{}", gutter, " ".repeat(start), "^".repeat(width.max(1))));
        if let Some(label) = diagnostic
            .labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
        {
            out.push_str(&format!(" {}", label.message));
        }
        out.push('\n');
    }
}

pub type DiagnosticResult<T> = Result<T, Diagnostics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let span = SourceSpan::new(
            SourcePosition::new(1, 5, 4),
            SourcePosition::new(1, 6, 5),
            FileId::new(0),
        );
        let diagnostic = DiagnosticBuilder::error("bad reference")
            .code("E9101")
            .span(Some(span))
            .label(span, "here")
            .help("report it")
            .with_note("while annotating `run`")
            .build();

        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.code.as_deref(), Some("E9101"));
        assert_eq!(diagnostic.labels.len(), 1);
        assert_eq!(diagnostic.help.len(), 1);
        assert_eq!(diagnostic.notes.len(), 1);
    }

    #[test]
    fn test_collection() {
        let mut diagnostics = Diagnostics::from(DiagnosticBuilder::warning("w").build());
        assert!(!diagnostics.has_errors());
        diagnostics.push(DiagnosticBuilder::error("e").build());
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.errors().count(), 1);
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_render_with_snippet() {
        let mut map = SourceMap::new();
        let file = map.add_file("run.ceylon", "value x = y;\n");
        let span = map.span_at(file, 1, 11).unwrap();
        let diagnostic = DiagnosticBuilder::error("reference to unknown declaration")
            .code("E9101")
            .span(Some(span))
            .label(span, "this one")
            .help("report it")
            .build();

        let text = ErrorFormatter::new().format_diagnostic(&diagnostic, &map);
        assert_eq!(
            text,
            "error[E9101]: reference to unknown declaration\n\
             \x20 --> run.ceylon:1:11\n\
             \x20 |\n\
             1 | value x = y;\n\
             \x20 |           ^ this one\n\
             \x20 = help: report it\n"
        );
    }

    #[test]
    fn test_render_without_span() {
        let diagnostic = DiagnosticBuilder::note("nothing to show").build();
        let text = ErrorFormatter::new().format_diagnostic(&diagnostic, &SourceMap::new());
        assert_eq!(text, "note: nothing to show\n");
    }
}
