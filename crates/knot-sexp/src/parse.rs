//! Recursive-descent parser, driven by an explicit stack.
//!
//! Grammar:
//!
//! ```text
//! sexp     := atom | list
//! atom     := '"' atomchar* '"'
//! atomchar := '\' ('\' | '"') | any other character
//! list     := '(' ws? (sexp (ws sexp)*)? ws? ')'
//! ws       := [ \t\r\n]+
//! ```
//!
//! Leading whitespace before the expression is skipped. Anything after the
//! first complete expression is ignored unless [`ParseOptions::strict`] is set.

use std::iter::Peekable;
use std::str::CharIndices;

use tracing::debug;

use crate::error::{ParseError, ParseErrorKind};
use crate::Sexp;

/// Parser configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum list nesting depth. `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Reject non-whitespace input after the expression.
    pub strict: bool,
}

impl ParseOptions {
    /// Options rejecting trailing input.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Sets the maximum nesting depth.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

/// Parses one expression from the start of `input`, ignoring trailing input.
pub fn parse(input: &str) -> Result<Sexp, ParseError> {
    parse_with(input, &ParseOptions::default())
}

/// Parses one expression with explicit options.
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Sexp, ParseError> {
    Parser::new(input, options).run()
}

/// Parses one expression, discarding failure detail.
///
/// Returns `None` for any malformed input; never panics.
pub fn from_text(input: &str) -> Option<Sexp> {
    match parse(input) {
        Ok(sexp) => Some(sexp),
        Err(err) => {
            debug!(%err, "rejected S-expression text");
            None
        }
    }
}

/// An open list awaiting its closing parenthesis.
struct Frame {
    start: usize,
    items: Vec<Sexp>,
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            options,
        }
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::new(kind, self.source, offset)
    }

    fn run(mut self) -> Result<Sexp, ParseError> {
        let mut open: Vec<Frame> = Vec::new();
        self.skip_whitespace();

        loop {
            // Expect the start of an expression.
            let mut value = match self.chars.peek().copied() {
                None => {
                    return Err(match open.last() {
                        Some(frame) => self.error(ParseErrorKind::UnterminatedList, frame.start),
                        None => self.error(ParseErrorKind::UnexpectedEof, self.source.len()),
                    });
                }
                Some((start, '"')) => {
                    self.chars.next();
                    self.atom(start)?
                }
                Some((start, '(')) => {
                    self.chars.next();
                    if let Some(limit) = self.options.max_depth {
                        if open.len() >= limit {
                            return Err(self.error(ParseErrorKind::TooDeep { limit }, start));
                        }
                    }
                    self.skip_whitespace();
                    if self.eat(')') {
                        Sexp::empty()
                    } else {
                        open.push(Frame {
                            start,
                            items: Vec::new(),
                        });
                        continue;
                    }
                }
                Some((offset, c)) => {
                    return Err(self.error(ParseErrorKind::UnexpectedChar(c), offset));
                }
            };

            // Attach the finished value to its parent, closing lists as we go.
            loop {
                let Some(frame) = open.last_mut() else {
                    return self.finish(value);
                };
                let start = frame.start;
                frame.items.push(value);
                let separated = self.skip_whitespace();

                match self.chars.peek().copied() {
                    Some((_, ')')) => {
                        self.chars.next();
                        let items = open.pop().map(|frame| frame.items).unwrap_or_default();
                        value = Sexp::List(items);
                    }
                    Some(_) if separated => break,
                    Some((offset, c)) => {
                        return Err(self.error(ParseErrorKind::UnexpectedChar(c), offset));
                    }
                    None => return Err(self.error(ParseErrorKind::UnterminatedList, start)),
                }
            }
        }
    }

    /// Reads the rest of an atom whose opening quote is at `start`.
    fn atom(&mut self, start: usize) -> Result<Sexp, ParseError> {
        let mut text = String::new();

        loop {
            match self.chars.next() {
                None => return Err(self.error(ParseErrorKind::UnterminatedAtom, start)),
                Some((_, '"')) => return Ok(Sexp::Atom(text)),
                Some((offset, '\\')) => match self.chars.next() {
                    Some((_, c @ ('\\' | '"'))) => text.push(c),
                    Some((_, c)) => {
                        return Err(self.error(ParseErrorKind::InvalidEscape(c), offset));
                    }
                    None => return Err(self.error(ParseErrorKind::UnterminatedAtom, start)),
                },
                Some((_, c)) => text.push(c),
            }
        }
    }

    fn finish(mut self, value: Sexp) -> Result<Sexp, ParseError> {
        if self.options.strict {
            self.skip_whitespace();
            if let Some(&(offset, _)) = self.chars.peek() {
                return Err(self.error(ParseErrorKind::TrailingInput, offset));
            }
        }
        Ok(value)
    }

    /// Skips grammar whitespace. Returns true if anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self
            .chars
            .next_if(|&(_, c)| matches!(c, ' ' | '\t' | '\r' | '\n'))
            .is_some()
        {
            skipped = true;
        }
        skipped
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }
}
