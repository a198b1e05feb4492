//! Parse errors and terminal reporting.

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::ast::Span;

/// An error produced while parsing. Displays as `[line:column] message`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span} {message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Pretty-print a parse error against its source using ariadne.
pub fn report_error(filename: &str, source: &str, error: &ParseError) {
    let span = error.span();
    let range = span.start..span.end.max(span.start);
    let _ = Report::build(ReportKind::Error, (filename, range.clone()))
        .with_message("Parse error")
        .with_label(
            Label::new((filename, range))
                .with_message(error.message())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));
}
