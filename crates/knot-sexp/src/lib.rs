//! S-expression value model and text codec for Knot.
//!
//! A value is either an atom of opaque text or a list of values. The text
//! form is a single canonical line:
//!
//! ```text
//! ("name" "knot" "tags" ("a" "b") "empty" ())
//! ```
//!
//! [`to_text`] is total and deterministic; [`from_text`] is partial and
//! returns `None` on malformed input. [`parse`] reports the failure with its
//! location instead.

mod error;
mod parse;
mod print;
mod sexp;

pub use error::{ParseError, ParseErrorKind};
pub use parse::{from_text, parse, parse_with, ParseOptions};
pub use print::{escape, to_text, write_text};
pub use sexp::Sexp;
