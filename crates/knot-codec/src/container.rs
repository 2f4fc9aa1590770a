//! Codecs for parametrized containers, built from their element codecs.
//!
//! | container | encoding |
//! |---|---|
//! | sequence | `(e0 e1 ...)` |
//! | optional | `("Just" e)` or `"Nothing"` |
//! | pair / triple | `(a b)` / `(a b c)` |
//! | set | `(e0 e1 ...)` in iteration order |
//! | map | `(k0 v0 k1 v1 ...)` in iteration order |
//!
//! The free functions take element decoders as closures so the schema-driven
//! codecs share exactly these encodings.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

use rhizome_knot_sexp::Sexp;

use crate::codec::{expect_exact, expect_list};
use crate::{DecodeError, SexpCodec};

pub(crate) const JUST: &str = "Just";
pub(crate) const NOTHING: &str = "Nothing";

// ============================================================================
// Shared encodings
// ============================================================================

/// Decodes every element of a list, failing on the first bad element.
pub fn decode_seq<T, F>(sexp: &Sexp, mut decode: F) -> Result<Vec<T>, DecodeError>
where
    F: FnMut(&Sexp) -> Result<T, DecodeError>,
{
    expect_list(sexp)?
        .iter()
        .enumerate()
        .map(|(index, item)| decode(item).map_err(|err| err.at_index(index)))
        .collect()
}

/// Encodes an optional value that has already been encoded.
pub fn encode_option(value: Option<Sexp>) -> Sexp {
    match value {
        Some(inner) => Sexp::list([Sexp::atom(JUST), inner]),
        None => Sexp::atom(NOTHING),
    }
}

/// Decodes `("Just" x)` or `"Nothing"`.
pub fn decode_option<T, F>(sexp: &Sexp, decode: F) -> Result<Option<T>, DecodeError>
where
    F: FnOnce(&Sexp) -> Result<T, DecodeError>,
{
    match sexp {
        Sexp::Atom(tag) if tag == NOTHING => Ok(None),
        Sexp::Atom(tag) => Err(unknown_option_tag(tag)),
        Sexp::List(items) => match items.split_first() {
            Some((Sexp::Atom(tag), [inner])) if tag == JUST => decode(inner)
                .map(Some)
                .map_err(|err| err.in_argument(JUST, 0)),
            Some((Sexp::Atom(tag), rest)) if tag == JUST => Err(DecodeError::WrongArity {
                constructor: JUST.to_string(),
                expected: 1,
                got: rest.len(),
            }),
            Some((Sexp::Atom(tag), _)) => Err(unknown_option_tag(tag)),
            _ => Err(DecodeError::MissingTag),
        },
    }
}

fn unknown_option_tag(tag: &str) -> DecodeError {
    DecodeError::UnknownTag {
        union: "Option".to_string(),
        tag: tag.to_string(),
    }
}

/// Decodes a two-element list.
pub fn decode_pair<A, B, FA, FB>(sexp: &Sexp, first: FA, second: FB) -> Result<(A, B), DecodeError>
where
    FA: FnOnce(&Sexp) -> Result<A, DecodeError>,
    FB: FnOnce(&Sexp) -> Result<B, DecodeError>,
{
    let [a, b] = expect_exact::<2>(sexp)?;
    Ok((
        first(a).map_err(|err| err.at_index(0))?,
        second(b).map_err(|err| err.at_index(1))?,
    ))
}

/// Encodes already-encoded key/value pairs as a flat alternating list.
pub fn encode_map<I>(entries: I) -> Sexp
where
    I: IntoIterator<Item = (Sexp, Sexp)>,
{
    Sexp::List(
        entries
            .into_iter()
            .flat_map(|(key, value)| [key, value])
            .collect(),
    )
}

/// Decodes a flat alternating key/value list, left to right.
pub fn decode_map<K, V, FK, FV>(
    sexp: &Sexp,
    mut key: FK,
    mut value: FV,
) -> Result<Vec<(K, V)>, DecodeError>
where
    FK: FnMut(&Sexp) -> Result<K, DecodeError>,
    FV: FnMut(&Sexp) -> Result<V, DecodeError>,
{
    let items = expect_list(sexp)?;
    if items.len() % 2 != 0 {
        return Err(DecodeError::OddMapLength(items.len()));
    }

    items
        .chunks_exact(2)
        .enumerate()
        .map(|(pair, chunk)| {
            let k = key(&chunk[0]).map_err(|err| err.at_index(pair * 2))?;
            let v = value(&chunk[1]).map_err(|err| err.at_index(pair * 2 + 1))?;
            Ok((k, v))
        })
        .collect()
}

// ============================================================================
// Sequences
// ============================================================================

impl<T: SexpCodec> SexpCodec for Vec<T> {
    fn to_sexp(&self) -> Sexp {
        self.iter().map(T::to_sexp).collect()
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_seq(sexp, T::from_sexp)
    }
}

impl<T: SexpCodec> SexpCodec for VecDeque<T> {
    fn to_sexp(&self) -> Sexp {
        self.iter().map(T::to_sexp).collect()
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_seq(sexp, T::from_sexp).map(VecDeque::from)
    }
}

impl<T: SexpCodec> SexpCodec for Box<T> {
    fn to_sexp(&self) -> Sexp {
        T::to_sexp(self)
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        T::from_sexp(sexp).map(Box::new)
    }
}

// ============================================================================
// Optional values and tuples
// ============================================================================

impl<T: SexpCodec> SexpCodec for Option<T> {
    fn to_sexp(&self) -> Sexp {
        encode_option(self.as_ref().map(T::to_sexp))
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_option(sexp, T::from_sexp)
    }
}

impl<A: SexpCodec, B: SexpCodec> SexpCodec for (A, B) {
    fn to_sexp(&self) -> Sexp {
        Sexp::list([self.0.to_sexp(), self.1.to_sexp()])
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_pair(sexp, A::from_sexp, B::from_sexp)
    }
}

impl<A: SexpCodec, B: SexpCodec, C: SexpCodec> SexpCodec for (A, B, C) {
    fn to_sexp(&self) -> Sexp {
        Sexp::list([self.0.to_sexp(), self.1.to_sexp(), self.2.to_sexp()])
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        let [a, b, c] = expect_exact::<3>(sexp)?;
        Ok((
            A::from_sexp(a).map_err(|err| err.at_index(0))?,
            B::from_sexp(b).map_err(|err| err.at_index(1))?,
            C::from_sexp(c).map_err(|err| err.at_index(2))?,
        ))
    }
}

// ============================================================================
// Sets and maps
// ============================================================================

impl<T: SexpCodec + Ord> SexpCodec for BTreeSet<T> {
    fn to_sexp(&self) -> Sexp {
        self.iter().map(T::to_sexp).collect()
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_seq(sexp, T::from_sexp).map(BTreeSet::from_iter)
    }
}

impl<T, S> SexpCodec for HashSet<T, S>
where
    T: SexpCodec + Eq + Hash,
    S: BuildHasher + Default,
{
    fn to_sexp(&self) -> Sexp {
        self.iter().map(T::to_sexp).collect()
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_seq(sexp, T::from_sexp).map(HashSet::from_iter)
    }
}

impl<K: SexpCodec + Ord, V: SexpCodec> SexpCodec for BTreeMap<K, V> {
    fn to_sexp(&self) -> Sexp {
        encode_map(self.iter().map(|(k, v)| (k.to_sexp(), v.to_sexp())))
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_map(sexp, K::from_sexp, V::from_sexp).map(BTreeMap::from_iter)
    }
}

impl<K, V, S> SexpCodec for HashMap<K, V, S>
where
    K: SexpCodec + Eq + Hash,
    V: SexpCodec,
    S: BuildHasher + Default,
{
    fn to_sexp(&self) -> Sexp {
        encode_map(self.iter().map(|(k, v)| (k.to_sexp(), v.to_sexp())))
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        decode_map(sexp, K::from_sexp, V::from_sexp).map(HashMap::from_iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(text: &str) -> Sexp {
        Sexp::atom(text)
    }

    #[test]
    fn test_vec() {
        let value = vec![1i32, 2, 3];
        assert_eq!(
            value.to_sexp(),
            Sexp::list([atom("1"), atom("2"), atom("3")])
        );
        assert_eq!(Vec::<i32>::from_sexp(&value.to_sexp()), Ok(value));
        assert_eq!(Vec::<i32>::from_sexp(&Sexp::empty()), Ok(vec![]));
        assert_eq!(Vec::<i32>::from_sexp(&atom("1")), Err(DecodeError::ExpectedList));

        let err = Vec::<i32>::from_sexp(&Sexp::list([atom("1"), atom("x")])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidPayload {
                expected: "i32",
                text: "x".into()
            }
            .at_index(1)
        );
    }

    #[test]
    fn test_option() {
        assert_eq!(Some(5u8).to_sexp(), Sexp::list([atom("Just"), atom("5")]));
        assert_eq!(None::<u8>.to_sexp(), atom("Nothing"));
        assert_eq!(Option::<u8>::from_sexp(&atom("Nothing")), Ok(None));
        assert_eq!(
            Option::<u8>::from_sexp(&Sexp::list([atom("Just"), atom("5")])),
            Ok(Some(5))
        );
        assert_eq!(
            Option::<Option<u8>>::from_sexp(&Some(None::<u8>).to_sexp()),
            Ok(Some(None))
        );
    }

    #[test]
    fn test_option_rejects_other_shapes() {
        assert!(Option::<u8>::from_sexp(&atom("Just")).is_err());
        assert!(Option::<u8>::from_sexp(&Sexp::list([atom("Nothing")])).is_err());
        assert_eq!(
            Option::<u8>::from_sexp(&Sexp::list([atom("Just")])),
            Err(DecodeError::WrongArity {
                constructor: "Just".into(),
                expected: 1,
                got: 0
            })
        );
        assert!(Option::<u8>::from_sexp(&Sexp::list([atom("Just"), atom("1"), atom("2")])).is_err());
        assert_eq!(Option::<u8>::from_sexp(&Sexp::empty()), Err(DecodeError::MissingTag));
        assert!(Option::<u8>::from_sexp(&Sexp::list([atom("Just"), atom("x")])).is_err());
    }

    #[test]
    fn test_pair() {
        let value = (7u8, "seven".to_string());
        assert_eq!(value.to_sexp(), Sexp::list([atom("7"), atom("seven")]));
        assert_eq!(<(u8, String)>::from_sexp(&value.to_sexp()), Ok(value));
        assert_eq!(
            <(u8, u8)>::from_sexp(&Sexp::list([atom("1")])),
            Err(DecodeError::WrongLength {
                expected: 2,
                got: 1
            })
        );
        assert!(<(u8, u8)>::from_sexp(&Sexp::list([atom("1"), atom("2"), atom("3")])).is_err());
    }

    #[test]
    fn test_triple() {
        let value = (1u8, 'b', true);
        assert_eq!(<(u8, char, bool)>::from_sexp(&value.to_sexp()), Ok(value));
        assert!(<(u8, char, bool)>::from_sexp(&(1u8, 'b').to_sexp()).is_err());
    }

    #[test]
    fn test_btree_set() {
        let value: BTreeSet<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(
            value.to_sexp(),
            Sexp::list([atom("1"), atom("2"), atom("3")])
        );
        let with_duplicates = Sexp::list([atom("2"), atom("1"), atom("2")]);
        assert_eq!(
            BTreeSet::<i32>::from_sexp(&with_duplicates),
            Ok([1, 2].into_iter().collect())
        );
    }

    #[test]
    fn test_hash_set() {
        let value: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(HashSet::<String>::from_sexp(&value.to_sexp()), Ok(value.clone()));
        assert_eq!(value.to_sexp(), value.to_sexp());
    }

    #[test]
    fn test_btree_map() {
        let value: BTreeMap<String, i32> = [("b".to_string(), 2), ("a".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(
            value.to_sexp(),
            Sexp::list([atom("a"), atom("1"), atom("b"), atom("2")])
        );
        assert_eq!(BTreeMap::<String, i32>::from_sexp(&value.to_sexp()), Ok(value));
    }

    #[test]
    fn test_map_odd_length_fails() {
        let odd = Sexp::list([atom("a"), atom("1"), atom("b")]);
        assert_eq!(
            BTreeMap::<String, i32>::from_sexp(&odd),
            Err(DecodeError::OddMapLength(3))
        );
        assert_eq!(
            HashMap::<String, i32>::from_sexp(&odd),
            Err(DecodeError::OddMapLength(3))
        );
    }

    #[test]
    fn test_map_value_error_position() {
        let bad = Sexp::list([atom("a"), atom("1"), atom("b"), atom("two")]);
        let err = BTreeMap::<String, i32>::from_sexp(&bad).unwrap_err();
        assert!(matches!(err, DecodeError::AtIndex { index: 3, .. }));
    }

    #[test]
    fn test_hash_map() {
        let value: HashMap<u8, Vec<bool>> = [(1, vec![true]), (2, vec![]), (3, vec![false, true])]
            .into_iter()
            .collect();
        assert_eq!(HashMap::<u8, Vec<bool>>::from_sexp(&value.to_sexp()), Ok(value));
    }

    #[test]
    fn test_vec_deque_and_box() {
        let deque: VecDeque<u16> = [4, 5].into_iter().collect();
        assert_eq!(VecDeque::<u16>::from_sexp(&deque.to_sexp()), Ok(deque));

        let boxed = Box::new(9u16);
        assert_eq!(boxed.to_sexp(), atom("9"));
        assert_eq!(Box::<u16>::from_sexp(&atom("9")), Ok(boxed));
    }
}
