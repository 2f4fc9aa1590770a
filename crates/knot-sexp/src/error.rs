//! Errors produced while parsing S-expression text.

use thiserror::Error;

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unterminated atom")]
    UnterminatedAtom,

    #[error("unterminated list")]
    UnterminatedList,

    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(char),

    #[error("unexpected character: {0:?}")]
    UnexpectedChar(char),

    #[error("nesting exceeds depth limit of {limit}")]
    TooDeep { limit: usize },

    #[error("trailing input after expression")]
    TrailingInput,
}

/// A parse failure and where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {kind}")]
pub struct ParseError {
    /// The failure.
    pub kind: ParseErrorKind,
    /// Byte offset into the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl ParseError {
    #[cold]
    pub(crate) fn new(kind: ParseErrorKind, source: &str, offset: usize) -> Self {
        let (line, column) = location(source, offset);
        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}

/// Line and column of a byte offset, both 1-based.
fn location(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
