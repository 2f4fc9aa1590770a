//! Codecs for built-in scalar types.
//!
//! Every scalar is an atom holding its canonical text form, except unit which
//! is the empty list.

use rhizome_knot_sexp::Sexp;

use crate::codec::{expect_atom, expect_list};
use crate::{DecodeError, SexpCodec};

fn invalid(expected: &'static str, text: &str) -> DecodeError {
    DecodeError::InvalidPayload {
        expected,
        text: text.to_string(),
    }
}

impl SexpCodec for () {
    fn to_sexp(&self) -> Sexp {
        Sexp::empty()
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        match expect_list(sexp)? {
            [] => Ok(()),
            items => Err(DecodeError::WrongLength {
                expected: 0,
                got: items.len(),
            }),
        }
    }
}

impl SexpCodec for bool {
    fn to_sexp(&self) -> Sexp {
        Sexp::atom(if *self { "true" } else { "false" })
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        match expect_atom(sexp)? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(invalid("bool", other)),
        }
    }
}

impl SexpCodec for char {
    fn to_sexp(&self) -> Sexp {
        Sexp::Atom(self.to_string())
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        let text = expect_atom(sexp)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(invalid("char", text)),
        }
    }
}

impl SexpCodec for String {
    fn to_sexp(&self) -> Sexp {
        Sexp::Atom(self.clone())
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        expect_atom(sexp).map(str::to_string)
    }
}

impl SexpCodec for Sexp {
    fn to_sexp(&self) -> Sexp {
        self.clone()
    }

    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
        Ok(sexp.clone())
    }
}

/// Numbers use the standard library's `Display` and `FromStr`, which agree
/// with each other for every finite and non-finite value.
macro_rules! number_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SexpCodec for $ty {
                fn to_sexp(&self) -> Sexp {
                    Sexp::Atom(self.to_string())
                }

                fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError> {
                    let text = expect_atom(sexp)?;
                    text.parse::<$ty>()
                        .map_err(|_| invalid(stringify!($ty), text))
                }
            }
        )*
    };
}

number_codec!(i8, i16, i32, i64, i128, isize);
number_codec!(u8, u16, u32, u64, u128, usize);
number_codec!(f32, f64);
