//! Derivation descriptors for composite types.
//!
//! A descriptor lists the names a composite type is encoded under, in
//! declaration order. The derive macros emit one as a `'static` constant per
//! type; decoding consults it to check constructor tags and arity before any
//! argument is touched.

use std::collections::HashSet;

use tracing::debug;

use crate::{SexpCodec, ShapeError};

/// One named field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub name: &'static str,
    /// The field's type as written, for diagnostics only.
    pub ty: &'static str,
}

/// A record: named fields, encoded as alternating name/value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: &'static [FieldShape],
}

/// One constructor of a union, with its positional argument types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorShape {
    pub name: &'static str,
    pub args: &'static [&'static str],
}

/// A union: a closed, ordered set of constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionShape {
    pub name: &'static str,
    pub constructors: &'static [ConstructorShape],
}

impl RecordShape {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks that field names are unique.
    pub fn validate(&self) -> Result<(), ShapeError> {
        debug!(record = self.name, fields = self.fields.len(), "validating record shape");
        match first_duplicate(self.fields.iter().map(|field| field.name)) {
            Some(field) => Err(ShapeError::DuplicateField {
                record: self.name.to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl ConstructorShape {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl UnionShape {
    /// Finds the first constructor, in declaration order, with this name.
    pub fn constructor(&self, name: &str) -> Option<&ConstructorShape> {
        self.constructors.iter().find(|ctor| ctor.name == name)
    }

    /// Checks that constructor names are unique.
    pub fn validate(&self) -> Result<(), ShapeError> {
        debug!(
            union = self.name,
            constructors = self.constructors.len(),
            "validating union shape"
        );
        match first_duplicate(self.constructors.iter().map(|ctor| ctor.name)) {
            Some(constructor) => Err(ShapeError::DuplicateConstructor {
                union: self.name.to_string(),
                constructor: constructor.to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

/// A record type whose codec was derived from a [`RecordShape`].
pub trait DerivedRecord: SexpCodec {
    const SHAPE: &'static RecordShape;
}

/// A union type whose codec was derived from a [`UnionShape`].
pub trait DerivedUnion: SexpCodec {
    const SHAPE: &'static UnionShape;
}
