//! Canonical printer.
//!
//! Output is a single line: atoms are double-quoted with only `\` and `"`
//! escaped, list elements are separated by exactly one space, and no other
//! whitespace is emitted. The printer walks the tree with an explicit stack so
//! nesting depth is bounded only by memory.

use crate::Sexp;

enum Step<'a> {
    Node(&'a Sexp),
    Space,
    Close,
}

/// Prints a value in canonical form.
pub fn to_text(sexp: &Sexp) -> String {
    let mut out = String::new();
    write_text(&mut out, sexp);
    out
}

/// Appends the canonical form of a value to `out`.
pub fn write_text(out: &mut String, sexp: &Sexp) {
    let mut stack = vec![Step::Node(sexp)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Space => out.push(' '),
            Step::Close => out.push(')'),
            Step::Node(Sexp::Atom(text)) => write_atom(out, text),
            Step::Node(Sexp::List(items)) => {
                out.push('(');
                stack.push(Step::Close);
                for (index, item) in items.iter().enumerate().rev() {
                    stack.push(Step::Node(item));
                    if index > 0 {
                        stack.push(Step::Space);
                    }
                }
            }
        }
    }
}

/// Escapes atom text: `\` becomes `\\` and `"` becomes `\"`.
///
/// Every other character, including newlines and control characters, is
/// passed through verbatim.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn write_atom(out: &mut String, text: &str) {
    out.reserve(text.len() + 2);
    out.push('"');
    push_escaped(out, text);
    out.push('"');
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
}
