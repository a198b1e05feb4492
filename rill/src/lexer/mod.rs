//! Lexer: turns source text into a vector of [`Token`]s.
//!
//! Lexing is total. Characters outside the alphabet and unterminated block
//! comments become [`TokenKind::Illegal`] tokens, which the parser reports;
//! end of input is simply the end of the vector.

mod token;

pub use token::{Token, TokenKind};

use logos::Logos;

use crate::ast::Span;

/// Lex `source` into tokens with line/column spans.
pub fn tokenize(source: &str) -> Vec<Token> {
    let line_starts = line_starts(source);
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let kind = result.unwrap_or(TokenKind::Illegal);
        let literal = match kind {
            TokenKind::Str => strip_quotes(lexer.slice()),
            _ => lexer.slice().to_string(),
        };
        tokens.push(Token {
            kind,
            literal,
            span: span_at(&line_starts, range.start, range.end),
        });
    }
    tokens
}

fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// The line is taken at `start`, the column just past the token at `end`,
/// which is the position error messages display.
fn span_at(line_starts: &[usize], start: usize, end: usize) -> Span {
    let start_line = line_starts.partition_point(|&off| off <= start) - 1;
    let end_line = line_starts.partition_point(|&off| off <= end) - 1;
    Span::new(start, end, start_line + 1, end - line_starts[end_line] + 1)
}

fn strip_quotes(slice: &str) -> String {
    let s = slice.strip_prefix('"').unwrap_or(slice);
    s.strip_suffix('"').unwrap_or(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("let x = func(a) { return a; }"),
            vec![
                Let, Ident, Assign, Function, LParen, Ident, RParen, LBrace, Return, Ident,
                Semicolon, RBrace
            ]
        );
    }

    #[test]
    fn lexes_multi_char_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("== != <= >= && || << >> ++ -- += <<="),
            vec![Eq, NotEq, Le, Ge, AmpAmp, PipePipe, Shl, Shr, PlusPlus, MinusMinus, PlusAssign, ShlAssign]
        );
    }

    #[test]
    fn float_wins_over_int() {
        let tokens = tokenize("3.14 42 1.");
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].literal, "3.14");
        assert_eq!(tokens[1].kind, TokenKind::Int);
        assert_eq!(tokens[2].kind, TokenKind::Float);
    }

    #[test]
    fn string_literal_is_unquoted() {
        let tokens = tokenize("\"hello world\"");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, "hello world");
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let tokens = tokenize("\"oops");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, "oops");
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("1 // line\n2 /* block\nstill block */ 3"),
            vec![TokenKind::Int, TokenKind::Int, TokenKind::Int]
        );
    }

    #[test]
    fn unterminated_block_comment_is_illegal() {
        let tokens = tokenize("1 /* never closed");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
    }

    #[test]
    fn unknown_character_is_illegal() {
        let tokens = tokenize("let @ = 1");
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].literal, "@");
    }

    #[test]
    fn spans_carry_line_and_past_the_end_column() {
        // `+` occupies column 3; messages point just past it.
        let tokens = tokenize("5 + true;");
        let plus = &tokens[1];
        assert_eq!(plus.kind, TokenKind::Plus);
        assert_eq!(plus.span.line, 1);
        assert_eq!(plus.span.column, 4);
    }

    #[test]
    fn spans_track_lines() {
        let tokens = tokenize("const NAME = \"YOU\";\nNAME = \"ME\";");
        let assign = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Assign)
            .nth(1)
            .unwrap();
        assert_eq!(assign.span.line, 2);
        assert_eq!(assign.span.column, 7);
    }
}
