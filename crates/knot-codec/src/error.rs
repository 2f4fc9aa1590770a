//! Decode, shape and schema errors.

use thiserror::Error;

/// Why a value could not be decoded from an S-expression.
///
/// The `In*`/`AtIndex` variants wrap a nested failure with the position it
/// occurred at, so the display reads as a path from the outermost value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected atom, got list")]
    ExpectedAtom,

    #[error("expected list, got atom")]
    ExpectedList,

    #[error("invalid {expected} payload: {text:?}")]
    InvalidPayload { expected: &'static str, text: String },

    #[error("wrong number of elements: expected {expected}, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("map has an odd number of elements: {0}")]
    OddMapLength(usize),

    #[error("missing constructor tag")]
    MissingTag,

    #[error("unknown constructor {tag:?} for {union}")]
    UnknownTag { union: String, tag: String },

    #[error("missing field {field} in {record}")]
    MissingField { record: String, field: String },

    #[error("wrong number of arguments for {constructor}: expected {expected}, got {got}")]
    WrongArity {
        constructor: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("in field {field}: {source}")]
    InField {
        field: String,
        source: Box<DecodeError>,
    },

    #[error("in {constructor} argument {index}: {source}")]
    InArgument {
        constructor: String,
        index: usize,
        source: Box<DecodeError>,
    },

    #[error("at index {index}: {source}")]
    AtIndex {
        index: usize,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Wraps this error as having occurred in the named record field.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        DecodeError::InField {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Wraps this error as having occurred in a constructor argument.
    pub fn in_argument(self, constructor: impl Into<String>, index: usize) -> Self {
        DecodeError::InArgument {
            constructor: constructor.into(),
            index,
            source: Box::new(self),
        }
    }

    /// Wraps this error as having occurred at a list position.
    pub fn at_index(self, index: usize) -> Self {
        DecodeError::AtIndex {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, with all position context removed.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::InField { source, .. }
            | DecodeError::InArgument { source, .. }
            | DecodeError::AtIndex { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A malformed derivation descriptor or schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("duplicate field {field} in {record}")]
    DuplicateField { record: String, field: String },

    #[error("duplicate constructor {constructor} in {union}")]
    DuplicateConstructor { union: String, constructor: String },

    #[error("duplicate type name: {0}")]
    DuplicateType(String),

    #[error("type name {0} is reserved for a built-in type")]
    ReservedName(String),

    #[error("unknown type {name} referenced from {owner}")]
    UnknownType { owner: String, name: String },

    #[error("invalid type expression: {0:?}")]
    InvalidTypeExpr(String),

    #[error("constructor without a name in {0}")]
    EmptyConstructor(String),
}

/// Failure to load a schema or to encode a dynamic value against it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid schema file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid schema: {0}")]
    Shape(#[from] ShapeError),

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: String, found: &'static str },

    #[error("wrong number of values for {owner}: expected {expected}, got {got}")]
    WrongCount {
        owner: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown constructor {constructor} for {union}")]
    UnknownConstructor { union: String, constructor: String },

    #[error("missing field {field} in {record}")]
    MissingField { record: String, field: String },
}
