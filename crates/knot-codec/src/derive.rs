//! Structural derivation of record and union codecs.
//!
//! [`derive_record!`](crate::derive_record) and
//! [`derive_union!`](crate::derive_union) implement [`SexpCodec`] for a type
//! from a list of its fields or constructors. The generated code is a thin
//! layer over the readers and writers in this module, which are also usable
//! directly for hand-written codecs.
//!
//! ```
//! use rhizome_knot_codec::{derive_record, derive_union, decode, encode};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! derive_record!(Point { x: i64, y: i64 });
//!
//! #[derive(Debug, PartialEq)]
//! enum Tree {
//!     Leaf,
//!     Node(Box<Tree>, i64, Box<Tree>),
//! }
//!
//! derive_union!(Tree {
//!     Leaf,
//!     Node(left: Box<Tree>, value: i64, right: Box<Tree>),
//! });
//!
//! let point = Point { x: 1, y: 2 };
//! assert_eq!(decode(&encode(&point)), Some(point));
//!
//! let tree = Tree::Node(Box::new(Tree::Leaf), 5, Box::new(Tree::Leaf));
//! assert_eq!(encode(&tree).to_string(), r#"("Node" ("Leaf") "5" ("Leaf"))"#);
//! ```
//!
//! Recursive types need no special handling: each argument's codec is found
//! through its type's [`SexpCodec`] impl when decoding reaches it.

use rhizome_knot_sexp::Sexp;

use crate::codec::expect_list;
use crate::{DecodeError, SexpCodec, UnionShape};

// ============================================================================
// Records
// ============================================================================

/// Encodes named field values as `(name0 value0 name1 value1 ...)`.
pub fn encode_record(fields: Vec<(&str, Sexp)>) -> Sexp {
    let mut items = Vec::with_capacity(fields.len() * 2);
    for (name, value) in fields {
        items.push(Sexp::atom(name));
        items.push(value);
    }
    Sexp::List(items)
}

/// Looks up fields of an encoded record by name.
///
/// The list is read as consecutive name/value pairs and each lookup scans
/// them in order, so the first pair with a matching name wins. Pairs with
/// unknown names are ignored, as is an unpaired trailing element.
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'a> {
    record: &'a str,
    items: &'a [Sexp],
}

impl<'a> RecordReader<'a> {
    /// Fails unless the value is a list.
    pub fn new(record: &'a str, sexp: &'a Sexp) -> Result<Self, DecodeError> {
        Ok(Self {
            record,
            items: expect_list(sexp)?,
        })
    }

    /// The raw value paired with `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&'a Sexp> {
        self.items
            .chunks_exact(2)
            .find(|pair| pair[0].as_atom() == Some(name))
            .map(|pair| &pair[1])
    }

    /// Decodes the named field.
    pub fn field<T: SexpCodec>(&self, name: &str) -> Result<T, DecodeError> {
        self.field_with(name, T::from_sexp)
    }

    /// Decodes the named field with an explicit decoder.
    pub fn field_with<T, F>(&self, name: &str, decode: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&'a Sexp) -> Result<T, DecodeError>,
    {
        let value = self.lookup(name).ok_or_else(|| DecodeError::MissingField {
            record: self.record.to_string(),
            field: name.to_string(),
        })?;
        decode(value).map_err(|err| err.in_field(name))
    }
}

// ============================================================================
// Unions
// ============================================================================

/// Encodes a constructor application as `(name arg0 arg1 ...)`.
///
/// A nullary constructor is still a one-element list.
pub fn encode_variant(constructor: &str, args: Vec<Sexp>) -> Sexp {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Sexp::atom(constructor));
    items.extend(args);
    Sexp::List(items)
}

/// Reads the positional arguments of an encoded constructor application.
///
/// Construction checks the tag and the argument count, so once a reader
/// exists its arguments are all present.
#[derive(Debug, Clone)]
pub struct VariantReader<'a> {
    union: &'a str,
    constructor: &'a str,
    args: &'a [Sexp],
    next: usize,
}

impl<'a> VariantReader<'a> {
    /// Reads the tag of `sexp` and checks the arguments against `arity`,
    /// which returns the argument count for a known constructor name.
    pub fn new<F>(union: &'a str, sexp: &'a Sexp, arity: F) -> Result<Self, DecodeError>
    where
        F: FnOnce(&str) -> Option<usize>,
    {
        let Some((Sexp::Atom(tag), args)) = expect_list(sexp)?.split_first() else {
            return Err(DecodeError::MissingTag);
        };

        let expected = arity(tag.as_str()).ok_or_else(|| DecodeError::UnknownTag {
            union: union.to_string(),
            tag: tag.clone(),
        })?;
        if args.len() != expected {
            return Err(DecodeError::WrongArity {
                constructor: tag.clone(),
                expected,
                got: args.len(),
            });
        }

        Ok(Self {
            union,
            constructor: tag,
            args,
            next: 0,
        })
    }

    /// Reads `sexp` against a union descriptor.
    pub fn for_shape(shape: &'a UnionShape, sexp: &'a Sexp) -> Result<Self, DecodeError> {
        Self::new(shape.name, sexp, |tag| {
            shape.constructor(tag).map(|ctor| ctor.arity())
        })
    }

    /// The constructor tag.
    pub fn constructor(&self) -> &'a str {
        self.constructor
    }

    /// Arguments not yet read.
    pub fn remaining(&self) -> usize {
        self.args.len() - self.next
    }

    /// Decodes the next argument.
    pub fn arg<T: SexpCodec>(&mut self) -> Result<T, DecodeError> {
        self.arg_with(T::from_sexp)
    }

    /// Decodes the next argument with an explicit decoder.
    pub fn arg_with<T, F>(&mut self, decode: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&'a Sexp) -> Result<T, DecodeError>,
    {
        let index = self.next;
        let sexp = self.args.get(index).ok_or_else(|| DecodeError::WrongArity {
            constructor: self.constructor.to_string(),
            expected: index + 1,
            got: self.args.len(),
        })?;
        self.next += 1;
        decode(sexp).map_err(|err| err.in_argument(self.constructor, index))
    }

    /// The error for a tag the caller does not handle.
    pub fn unknown(&self) -> DecodeError {
        DecodeError::UnknownTag {
            union: self.union.to_string(),
            tag: self.constructor.to_string(),
        }
    }
}

// ============================================================================
// Macros
// ============================================================================

/// Implements [`SexpCodec`](crate::SexpCodec) and
/// [`DerivedRecord`](crate::DerivedRecord) for a struct with named fields.
///
/// List every field with its type. Type parameters must themselves implement
/// `SexpCodec`.
///
/// ```
/// use rhizome_knot_codec::derive_record;
///
/// struct Labeled<T> {
///     label: String,
///     value: T,
/// }
///
/// derive_record!(Labeled<T> { label: String, value: T });
/// ```
#[macro_export]
macro_rules! derive_record {
    (
        $name:ident $(< $($param:ident),+ $(,)? >)?
        { $($field:ident : $ty:ty),* $(,)? }
    ) => {
        impl $(< $($param: $crate::SexpCodec),+ >)? $crate::DerivedRecord
            for $name $(< $($param),+ >)?
        {
            const SHAPE: &'static $crate::RecordShape = &$crate::RecordShape {
                name: stringify!($name),
                fields: &[
                    $($crate::FieldShape {
                        name: stringify!($field),
                        ty: stringify!($ty),
                    }),*
                ],
            };
        }

        impl $(< $($param: $crate::SexpCodec),+ >)? $crate::SexpCodec
            for $name $(< $($param),+ >)?
        {
            fn to_sexp(&self) -> $crate::Sexp {
                $crate::derive::encode_record(::std::vec![
                    $((stringify!($field), $crate::SexpCodec::to_sexp(&self.$field))),*
                ])
            }

            #[allow(unused_variables)]
            fn from_sexp(sexp: &$crate::Sexp) -> ::std::result::Result<Self, $crate::DecodeError> {
                let record = $crate::derive::RecordReader::new(stringify!($name), sexp)?;
                ::std::result::Result::Ok(Self {
                    $($field: record.field::<$ty>(stringify!($field))?,)*
                })
            }
        }
    };
}

/// Implements [`SexpCodec`](crate::SexpCodec) and
/// [`DerivedUnion`](crate::DerivedUnion) for an enum.
///
/// List every variant in declaration order. Tuple variants name each
/// argument; the names only bind values while encoding.
///
/// ```
/// use rhizome_knot_codec::derive_union;
///
/// enum Shape {
///     Empty,
///     Circle(f64),
///     Rect(f64, f64),
/// }
///
/// derive_union!(Shape {
///     Empty,
///     Circle(radius: f64),
///     Rect(width: f64, height: f64),
/// });
/// ```
#[macro_export]
macro_rules! derive_union {
    (
        $name:ident $(< $($param:ident),+ $(,)? >)?
        { $($ctor:ident $(( $($arg:ident : $ty:ty),* $(,)? ))?),* $(,)? }
    ) => {
        impl $(< $($param: $crate::SexpCodec),+ >)? $crate::DerivedUnion
            for $name $(< $($param),+ >)?
        {
            const SHAPE: &'static $crate::UnionShape = &$crate::UnionShape {
                name: stringify!($name),
                constructors: &[
                    $($crate::ConstructorShape {
                        name: stringify!($ctor),
                        args: &[$($(stringify!($ty)),*)?],
                    }),*
                ],
            };
        }

        impl $(< $($param: $crate::SexpCodec),+ >)? $crate::SexpCodec
            for $name $(< $($param),+ >)?
        {
            fn to_sexp(&self) -> $crate::Sexp {
                match self {
                    $(Self::$ctor $(( $($arg),* ))? => $crate::derive::encode_variant(
                        stringify!($ctor),
                        ::std::vec![$($($crate::SexpCodec::to_sexp($arg)),*)?],
                    ),)*
                }
            }

            #[allow(unused_mut)]
            fn from_sexp(sexp: &$crate::Sexp) -> ::std::result::Result<Self, $crate::DecodeError> {
                let mut variant = $crate::derive::VariantReader::for_shape(
                    <Self as $crate::DerivedUnion>::SHAPE,
                    sexp,
                )?;
                match variant.constructor() {
                    $(stringify!($ctor) => ::std::result::Result::Ok(
                        Self::$ctor $(( $(variant.arg::<$ty>()?),* ))?
                    ),)*
                    _ => ::std::result::Result::Err(variant.unknown()),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(text: &str) -> Sexp {
        Sexp::atom(text)
    }

    #[test]
    fn test_encode_record() {
        let sexp = encode_record(vec![("x", atom("1")), ("y", atom("2"))]);
        assert_eq!(sexp.to_string(), r#"("x" "1" "y" "2")"#);
        assert_eq!(encode_record(vec![]), Sexp::empty());
    }

    #[test]
    fn test_record_reader_lookup() {
        let sexp = Sexp::list([atom("y"), atom("2"), atom("x"), atom("1"), atom("x"), atom("3")]);
        let record = RecordReader::new("Point", &sexp).unwrap();
        assert_eq!(record.field::<i64>("x"), Ok(1));
        assert_eq!(record.field::<i64>("y"), Ok(2));
        assert_eq!(
            record.field::<i64>("z"),
            Err(DecodeError::MissingField {
                record: "Point".into(),
                field: "z".into()
            })
        );
    }

    #[test]
    fn test_record_reader_scans_pairs() {
        // "x" only appears in value position, so it is not a field name.
        let sexp = Sexp::list([atom("label"), atom("x"), atom("1")]);
        let record = RecordReader::new("R", &sexp).unwrap();
        assert!(record.lookup("x").is_none());
        assert_eq!(record.lookup("label"), Some(&atom("x")));

        assert_eq!(
            RecordReader::new("R", &atom("x")).map(|_| ()),
            Err(DecodeError::ExpectedList)
        );
    }

    #[test]
    fn test_record_reader_field_context() {
        let sexp = Sexp::list([atom("x"), atom("one")]);
        let record = RecordReader::new("Point", &sexp).unwrap();
        let err = record.field::<i64>("x").unwrap_err();
        assert!(matches!(err, DecodeError::InField { ref field, .. } if field == "x"));
    }

    #[test]
    fn test_encode_variant() {
        assert_eq!(encode_variant("Leaf", vec![]).to_string(), r#"("Leaf")"#);
        assert_eq!(
            encode_variant("Pair", vec![atom("1"), Sexp::empty()]).to_string(),
            r#"("Pair" "1" ())"#
        );
    }

    fn arity(tag: &str) -> Option<usize> {
        match tag {
            "Leaf" => Some(0),
            "Node" => Some(2),
            _ => None,
        }
    }

    #[test]
    fn test_variant_reader() {
        let sexp = Sexp::list([atom("Node"), atom("1"), atom("true")]);
        let mut variant = VariantReader::new("Tree", &sexp, arity).unwrap();
        assert_eq!(variant.constructor(), "Node");
        assert_eq!(variant.remaining(), 2);
        assert_eq!(variant.arg::<u8>(), Ok(1));
        assert_eq!(variant.arg::<bool>(), Ok(true));
        assert_eq!(variant.remaining(), 0);
        assert!(matches!(variant.arg::<u8>(), Err(DecodeError::WrongArity { .. })));
    }

    #[test]
    fn test_variant_reader_rejects_bad_tags() {
        let reject = |sexp: Sexp| VariantReader::new("Tree", &sexp, arity).map(|_| ()).unwrap_err();

        assert_eq!(reject(atom("Leaf")), DecodeError::ExpectedList);
        assert_eq!(reject(Sexp::empty()), DecodeError::MissingTag);
        assert_eq!(reject(Sexp::list([Sexp::empty()])), DecodeError::MissingTag);
        assert_eq!(
            reject(Sexp::list([atom("NotAConstructor")])),
            DecodeError::UnknownTag {
                union: "Tree".into(),
                tag: "NotAConstructor".into()
            }
        );
        assert_eq!(
            reject(Sexp::list([atom("Leaf"), atom("1")])),
            DecodeError::WrongArity {
                constructor: "Leaf".into(),
                expected: 0,
                got: 1
            }
        );
    }

    #[test]
    fn test_variant_reader_argument_context() {
        let sexp = Sexp::list([atom("Node"), atom("1"), atom("maybe")]);
        let mut variant = VariantReader::new("Tree", &sexp, arity).unwrap();
        assert_eq!(variant.arg::<u8>(), Ok(1));
        assert_eq!(
            variant.arg::<bool>(),
            Err(DecodeError::InvalidPayload {
                expected: "bool",
                text: "maybe".into()
            }
            .in_argument("Node", 1))
        );
    }
}
