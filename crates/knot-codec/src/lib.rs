//! Structural S-expression codecs for Knot.
//!
//! Every supported type has a total encoder into [`Sexp`] and a partial
//! decoder back, related by the round-trip law:
//!
//! ```text
//! decode(encode(x)) == Some(x)
//! ```
//!
//! # Encodings
//!
//! - Scalars are atoms of their canonical text (`"42"`, `"true"`, `"x"`);
//!   unit is `()`.
//! - Sequences and sets are lists; maps are flat `(k0 v0 k1 v1 ...)` lists.
//! - `Option` is `("Just" x)` or `"Nothing"`; [`Either`] is `("Left" x)` or
//!   `("Right" y)`; pairs and triples are two and three element lists.
//! - Records are `("field" value ...)`, decoded by field name.
//! - Unions are `("Constructor" arg0 arg1 ...)`, decoded by tag.
//!
//! Records and unions get their codecs from [`derive_record!`] and
//! [`derive_union!`]. Types known only at runtime are described by a
//! [`Schema`] and decoded into [`Value`]s.

mod codec;
mod container;
pub mod derive;
mod either;
mod error;
mod primitive;
pub mod schema;
mod shape;
mod value;

pub use codec::{
    Codec, SexpCodec, decode, decode_text, encode, encode_text, expect_atom, expect_exact,
    expect_list,
};
pub use container::{
    decode_map, decode_option, decode_pair, decode_seq, encode_map, encode_option,
};
pub use either::Either;
pub use error::{DecodeError, SchemaError, ShapeError};
pub use schema::{Schema, TypeExpr};
pub use shape::{ConstructorShape, DerivedRecord, DerivedUnion, FieldShape, RecordShape, UnionShape};
pub use value::Value;

pub use rhizome_knot_sexp::Sexp;
