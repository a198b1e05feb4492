//! Source location tracking.

use std::fmt;

/// A byte range in the source together with the position error messages use:
/// the 1-based line of `start` and the 1-based column just past the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Placeholder for positions with no source text (empty input).
    pub fn dummy() -> Self {
        Self::new(0, 0, 1, 1)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.line, self.column)
    }
}

/// A node paired with the span of the token that anchors it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_column() {
        assert_eq!(Span::new(2, 3, 1, 4).to_string(), "[1:4]");
        assert_eq!(Span::dummy().to_string(), "[1:1]");
    }

    #[test]
    fn spanned_displays_node() {
        let s = Spanned::new(42, Span::dummy());
        assert_eq!(s.to_string(), "42");
        assert_eq!(s.span, Span::dummy());
    }
}
