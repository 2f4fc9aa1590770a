//! The codec trait and the codec pair value.

use std::fmt;

use rhizome_knot_sexp::{Sexp, from_text, to_text};
use tracing::debug;

use crate::DecodeError;

/// A type with a lossless S-expression encoding.
///
/// Encoding is total; decoding is partial. For every value `x`,
/// `T::from_sexp(&x.to_sexp()) == Ok(x)`.
pub trait SexpCodec: Sized {
    /// Encodes a value.
    fn to_sexp(&self) -> Sexp;

    /// Decodes a value, reporting why it failed.
    fn from_sexp(sexp: &Sexp) -> Result<Self, DecodeError>;
}

/// Encodes a value.
pub fn encode<T: SexpCodec>(value: &T) -> Sexp {
    value.to_sexp()
}

/// Decodes a value, discarding failure detail.
pub fn decode<T: SexpCodec>(sexp: &Sexp) -> Option<T> {
    match T::from_sexp(sexp) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(%err, ty = std::any::type_name::<T>(), "decode failed");
            None
        }
    }
}

/// Encodes a value straight to canonical text.
pub fn encode_text<T: SexpCodec>(value: &T) -> String {
    to_text(&value.to_sexp())
}

/// Parses and decodes text. Fails if either stage fails.
pub fn decode_text<T: SexpCodec>(text: &str) -> Option<T> {
    decode(&from_text(text)?)
}

/// Returns the atom text, or fails if this is a list.
pub fn expect_atom(sexp: &Sexp) -> Result<&str, DecodeError> {
    sexp.as_atom().ok_or(DecodeError::ExpectedAtom)
}

/// Returns the list items, or fails if this is an atom.
pub fn expect_list(sexp: &Sexp) -> Result<&[Sexp], DecodeError> {
    sexp.as_list().ok_or(DecodeError::ExpectedList)
}

/// Returns the list items if there are exactly `N` of them.
pub fn expect_exact<const N: usize>(sexp: &Sexp) -> Result<&[Sexp; N], DecodeError> {
    let items = expect_list(sexp)?;
    items.try_into().map_err(|_| DecodeError::WrongLength {
        expected: N,
        got: items.len(),
    })
}

/// An encode/decode function pair for one type.
///
/// Obtained once per type and freely copied; it holds no state, so it can be
/// shared across threads.
pub struct Codec<T> {
    encode: fn(&T) -> Sexp,
    decode: fn(&Sexp) -> Result<T, DecodeError>,
}

impl<T: SexpCodec> Codec<T> {
    /// The pair derived from the type's [`SexpCodec`] implementation.
    pub fn derive() -> Self {
        Self::new(T::to_sexp, T::from_sexp)
    }
}

impl<T> Codec<T> {
    /// Builds a pair from explicit functions.
    pub fn new(encode: fn(&T) -> Sexp, decode: fn(&Sexp) -> Result<T, DecodeError>) -> Self {
        Self { encode, decode }
    }

    /// Encodes a value.
    pub fn encode(&self, value: &T) -> Sexp {
        (self.encode)(value)
    }

    /// Decodes a value, discarding failure detail.
    pub fn decode(&self, sexp: &Sexp) -> Option<T> {
        self.try_decode(sexp).ok()
    }

    /// Decodes a value.
    pub fn try_decode(&self, sexp: &Sexp) -> Result<T, DecodeError> {
        (self.decode)(sexp)
    }

    /// Encodes a value to canonical text.
    pub fn to_text(&self, value: &T) -> String {
        to_text(&self.encode(value))
    }

    /// Parses and decodes text.
    pub fn from_text(&self, text: &str) -> Option<T> {
        self.decode(&from_text(text)?)
    }
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Codec<T> {}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
