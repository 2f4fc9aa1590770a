//! S-expression value model.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::print::to_text;

/// An S-expression node.
///
/// A tree with exactly two shapes: an opaque text leaf and an ordered list of
/// children. Equality, ordering and hashing are structural. Ordering puts
/// every atom before every list, then compares payloads lexicographically.
///
/// ```
/// use rhizome_knot_sexp::Sexp;
///
/// let point = Sexp::list([Sexp::atom("x"), Sexp::atom("1")]);
/// assert_eq!(point.to_string(), r#"("x" "1")"#);
/// ```
///
/// Dropping, cloning, comparing and hashing walk the tree with a heap stack,
/// so they work at any nesting depth. `Debug` and `Serialize` recurse once
/// per level.
#[derive(Debug)]
pub enum Sexp {
    /// A leaf carrying arbitrary text, including whitespace and quotes.
    Atom(String),
    /// Zero or more child nodes, order-significant.
    List(Vec<Sexp>),
}

impl Sexp {
    /// Creates an atom.
    pub fn atom(text: impl Into<String>) -> Self {
        Sexp::Atom(text.into())
    }

    /// Creates a list from its children.
    pub fn list(items: impl IntoIterator<Item = Sexp>) -> Self {
        Sexp::List(items.into_iter().collect())
    }

    /// Creates the empty list `()`.
    pub fn empty() -> Self {
        Sexp::List(Vec::new())
    }

    /// Returns true if this is an atom.
    pub fn is_atom(&self) -> bool {
        matches!(self, Sexp::Atom(_))
    }

    /// Returns true if this is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Sexp::List(_))
    }

    /// Returns the atom text if this is an atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexp::Atom(text) => Some(text),
            Sexp::List(_) => None,
        }
    }

    /// Returns the children if this is a list.
    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(items) => Some(items),
            Sexp::Atom(_) => None,
        }
    }

    /// Returns the head atom text if this is a non-empty list starting with an atom.
    ///
    /// This is the tag position used by tagged encodings such as `("Just" x)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    /// Prints this value in canonical single-line form.
    pub fn to_text(&self) -> String {
        to_text(self)
    }
}

impl Drop for Sexp {
    fn drop(&mut self) {
        let Sexp::List(items) = self else {
            return;
        };
        let mut pending = std::mem::take(items);
        while let Some(mut node) = pending.pop() {
            if let Sexp::List(children) = &mut node {
                pending.append(children);
            }
        }
    }
}

impl Clone for Sexp {
    fn clone(&self) -> Self {
        let root = match self {
            Sexp::Atom(text) => return Sexp::Atom(text.clone()),
            Sexp::List(items) => items,
        };

        let mut iter = root.iter();
        let mut built = Vec::with_capacity(root.len());
        let mut parents = Vec::new();
        loop {
            match iter.next() {
                Some(Sexp::Atom(text)) => built.push(Sexp::Atom(text.clone())),
                Some(Sexp::List(items)) => {
                    let parent_iter = std::mem::replace(&mut iter, items.iter());
                    let parent_built =
                        std::mem::replace(&mut built, Vec::with_capacity(items.len()));
                    parents.push((parent_iter, parent_built));
                }
                None => {
                    let node = Sexp::List(std::mem::take(&mut built));
                    let Some((parent_iter, parent_built)) = parents.pop() else {
                        return node;
                    };
                    iter = parent_iter;
                    built = parent_built;
                    built.push(node);
                }
            }
        }
    }
}

impl PartialEq for Sexp {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Sexp::Atom(a), Sexp::Atom(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Sexp::List(a), Sexp::List(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    pending.extend(a.iter().zip(b));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Sexp {}

impl PartialOrd for Sexp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sexp {
    fn cmp(&self, other: &Self) -> Ordering {
        // One pair of sibling cursors per open list, compared lexicographically.
        let mut open = vec![(
            std::slice::from_ref(self).iter(),
            std::slice::from_ref(other).iter(),
        )];
        while let Some((left, right)) = open.last_mut() {
            match (left.next(), right.next()) {
                (None, None) => {
                    open.pop();
                }
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(Sexp::Atom(a)), Some(Sexp::Atom(b))) => match a.cmp(b) {
                    Ordering::Equal => {}
                    ordering => return ordering,
                },
                (Some(Sexp::Atom(_)), Some(Sexp::List(_))) => return Ordering::Less,
                (Some(Sexp::List(_)), Some(Sexp::Atom(_))) => return Ordering::Greater,
                (Some(Sexp::List(a)), Some(Sexp::List(b))) => open.push((a.iter(), b.iter())),
            }
        }
        Ordering::Equal
    }
}

impl Hash for Sexp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Pre-order with list lengths, which identifies the tree uniquely.
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Sexp::Atom(text) => {
                    state.write_u8(0);
                    text.hash(state);
                }
                Sexp::List(items) => {
                    state.write_u8(1);
                    state.write_usize(items.len());
                    pending.extend(items.iter().rev());
                }
            }
        }
    }
}

impl Default for Sexp {
    fn default() -> Self {
        Sexp::empty()
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_text(self))
    }
}

impl From<&str> for Sexp {
    fn from(value: &str) -> Self {
        Sexp::atom(value)
    }
}

impl From<String> for Sexp {
    fn from(value: String) -> Self {
        Sexp::Atom(value)
    }
}

impl From<Vec<Sexp>> for Sexp {
    fn from(value: Vec<Sexp>) -> Self {
        Sexp::List(value)
    }
}

impl FromIterator<Sexp> for Sexp {
    fn from_iter<I: IntoIterator<Item = Sexp>>(iter: I) -> Self {
        Sexp::list(iter)
    }
}

// Serialization/deserialization support: atoms are strings, lists are sequences.
impl Serialize for Sexp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Sexp::Atom(text) => serializer.serialize_str(text),
            Sexp::List(items) => serializer.collect_seq(items),
        }
    }
}

impl<'de> Deserialize<'de> for Sexp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SexpVisitor)
    }
}

struct SexpVisitor;

impl<'de> Visitor<'de> for SexpVisitor {
    type Value = Sexp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a sequence of S-expressions")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Sexp, E> {
        Ok(Sexp::atom(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Sexp, E> {
        Ok(Sexp::Atom(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Sexp, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Sexp::List(items))
    }
}
