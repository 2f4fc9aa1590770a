//! Schema-driven codecs for types known only at runtime.
//!
//! A schema names record and union shapes whose field and argument types are
//! [`TypeExpr`]s. Named references resolve through the schema when a value
//! reaches them, so shapes may refer to themselves and to each other.
//!
//! Schemas are usually loaded from TOML:
//!
//! ```toml
//! [record.Point]
//! fields = [["x", "int"], ["y", "int"]]
//!
//! [union.Tree]
//! constructors = [["Leaf"], ["Node", "Tree", "int", "Tree"]]
//! ```
//!
//! Every type uses the same encoding as its static counterpart, so text
//! written by a derived codec decodes here and vice versa.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rhizome_knot_sexp::Sexp;
use serde::Deserialize;
use tracing::{debug, info};

use crate::container::{
    decode_map, decode_option, decode_pair, decode_seq, encode_map, encode_option,
};
use crate::derive::{RecordReader, VariantReader, encode_record, encode_variant};
use crate::shape::first_duplicate;
use crate::{DecodeError, Either, SchemaError, SexpCodec, ShapeError, Value};

// ============================================================================
// Type expressions
// ============================================================================

/// A type as written in a schema, e.g. `map<string, list<Tree>>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Unit,
    Bool,
    Char,
    Int,
    Float,
    String,
    Sexp,
    List(Box<TypeExpr>),
    Option(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Pair(Box<TypeExpr>, Box<TypeExpr>),
    Either(Box<TypeExpr>, Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// A record or union defined in the schema.
    Named(String),
}

const BUILTIN_NAMES: &[&str] = &[
    "unit", "bool", "char", "int", "float", "string", "sexp", "list", "option", "set", "pair",
    "either", "map",
];

impl TypeExpr {
    /// Every named reference in this expression.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                TypeExpr::Named(name) => names.push(name.as_str()),
                TypeExpr::List(inner) | TypeExpr::Option(inner) | TypeExpr::Set(inner) => {
                    stack.push(inner)
                }
                TypeExpr::Pair(a, b) | TypeExpr::Either(a, b) | TypeExpr::Map(a, b) => {
                    stack.push(b);
                    stack.push(a);
                }
                _ => {}
            }
        }
        names
    }
}

impl FromStr for TypeExpr {
    type Err = ShapeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { text, pos: 0 };
        let expr = parser.expr()?;
        parser.skip_whitespace();
        if parser.pos == text.len() {
            Ok(expr)
        } else {
            Err(parser.error())
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Unit => f.write_str("unit"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Char => f.write_str("char"),
            TypeExpr::Int => f.write_str("int"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::String => f.write_str("string"),
            TypeExpr::Sexp => f.write_str("sexp"),
            TypeExpr::List(inner) => write!(f, "list<{inner}>"),
            TypeExpr::Option(inner) => write!(f, "option<{inner}>"),
            TypeExpr::Set(inner) => write!(f, "set<{inner}>"),
            TypeExpr::Pair(a, b) => write!(f, "pair<{a}, {b}>"),
            TypeExpr::Either(a, b) => write!(f, "either<{a}, {b}>"),
            TypeExpr::Map(k, v) => write!(f, "map<{k}, {v}>"),
            TypeExpr::Named(name) => f.write_str(name),
        }
    }
}

struct TypeParser<'a> {
    text: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn error(&self) -> ShapeError {
        ShapeError::InvalidTypeExpr(self.text.to_string())
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.text[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ShapeError> {
        if self.eat(c) { Ok(()) } else { Err(self.error()) }
    }

    fn ident(&mut self) -> Result<&str, ShapeError> {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error());
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn expr(&mut self) -> Result<TypeExpr, ShapeError> {
        let name = self.ident()?.to_string();
        let expr = match name.as_str() {
            "unit" => TypeExpr::Unit,
            "bool" => TypeExpr::Bool,
            "char" => TypeExpr::Char,
            "int" => TypeExpr::Int,
            "float" => TypeExpr::Float,
            "string" => TypeExpr::String,
            "sexp" => TypeExpr::Sexp,
            "list" => TypeExpr::List(self.one_arg()?),
            "option" => TypeExpr::Option(self.one_arg()?),
            "set" => TypeExpr::Set(self.one_arg()?),
            "pair" => {
                let (a, b) = self.two_args()?;
                TypeExpr::Pair(a, b)
            }
            "either" => {
                let (a, b) = self.two_args()?;
                TypeExpr::Either(a, b)
            }
            "map" => {
                let (k, v) = self.two_args()?;
                TypeExpr::Map(k, v)
            }
            _ => TypeExpr::Named(name),
        };
        Ok(expr)
    }

    fn one_arg(&mut self) -> Result<Box<TypeExpr>, ShapeError> {
        self.expect('<')?;
        let inner = self.expr()?;
        self.expect('>')?;
        Ok(Box::new(inner))
    }

    fn two_args(&mut self) -> Result<(Box<TypeExpr>, Box<TypeExpr>), ShapeError> {
        self.expect('<')?;
        let a = self.expr()?;
        self.expect(',')?;
        let b = self.expr()?;
        self.expect('>')?;
        Ok((Box::new(a), Box::new(b)))
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// A record shape with runtime field types.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<(String, TypeExpr)>,
}

/// A union shape with runtime argument types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDef {
    pub name: String,
    pub constructors: Vec<ConstructorDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDef {
    pub name: String,
    pub args: Vec<TypeExpr>,
}

impl UnionDef {
    /// Finds the first constructor, in declaration order, with this name.
    pub fn constructor(&self, name: &str) -> Option<&ConstructorDef> {
        self.constructors.iter().find(|ctor| ctor.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Record(RecordDef),
    Union(UnionDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Record(record) => &record.name,
            TypeDef::Union(union) => &union.name,
        }
    }

    fn field_types(&self) -> Box<dyn Iterator<Item = &TypeExpr> + '_> {
        match self {
            TypeDef::Record(record) => Box::new(record.fields.iter().map(|(_, ty)| ty)),
            TypeDef::Union(union) => {
                Box::new(union.constructors.iter().flat_map(|ctor| ctor.args.iter()))
            }
        }
    }
}

/// The TOML layout of a schema file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default)]
    record: BTreeMap<String, RecordEntry>,
    #[serde(default)]
    union: BTreeMap<String, UnionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordEntry {
    #[serde(default)]
    fields: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnionEntry {
    constructors: Vec<Vec<String>>,
}

// ============================================================================
// Schema
// ============================================================================

/// A set of named record and union shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    types: BTreeMap<String, TypeDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML schema.
    pub fn from_toml(text: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = toml::from_str(text)?;
        let mut schema = Schema::new();

        for (name, entry) in file.record {
            let fields = entry
                .fields
                .into_iter()
                .map(|(field, ty)| Ok((field, ty.parse::<TypeExpr>()?)))
                .collect::<Result<Vec<_>, ShapeError>>()?;
            schema.add_record(RecordDef { name, fields })?;
        }

        for (name, entry) in file.union {
            let mut constructors = Vec::with_capacity(entry.constructors.len());
            for ctor in entry.constructors {
                let mut parts = ctor.into_iter();
                let ctor_name = parts
                    .next()
                    .ok_or_else(|| ShapeError::EmptyConstructor(name.clone()))?;
                let args = parts
                    .map(|ty| ty.parse::<TypeExpr>())
                    .collect::<Result<Vec<_>, ShapeError>>()?;
                constructors.push(ConstructorDef {
                    name: ctor_name,
                    args,
                });
            }
            schema.add_union(UnionDef { name, constructors })?;
        }

        schema.validate()?;
        info!(types = schema.types.len(), "loaded schema");
        Ok(schema)
    }

    /// Reads and validates a TOML schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading schema");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Registers a record shape.
    pub fn add_record(&mut self, record: RecordDef) -> Result<&mut Self, ShapeError> {
        if let Some(field) = first_duplicate(record.fields.iter().map(|(name, _)| name.as_str())) {
            return Err(ShapeError::DuplicateField {
                record: record.name.clone(),
                field: field.to_string(),
            });
        }
        self.insert(TypeDef::Record(record))
    }

    /// Registers a union shape.
    pub fn add_union(&mut self, union: UnionDef) -> Result<&mut Self, ShapeError> {
        if let Some(ctor) = first_duplicate(union.constructors.iter().map(|c| c.name.as_str())) {
            return Err(ShapeError::DuplicateConstructor {
                union: union.name.clone(),
                constructor: ctor.to_string(),
            });
        }
        self.insert(TypeDef::Union(union))
    }

    fn insert(&mut self, def: TypeDef) -> Result<&mut Self, ShapeError> {
        let name = def.name().to_string();
        if BUILTIN_NAMES.contains(&name.as_str()) {
            return Err(ShapeError::ReservedName(name));
        }
        if self.types.contains_key(&name) {
            return Err(ShapeError::DuplicateType(name));
        }
        debug!(%name, "registered type");
        self.types.insert(name, def);
        Ok(self)
    }

    /// Checks that every named reference resolves to a registered shape.
    pub fn validate(&self) -> Result<(), ShapeError> {
        for def in self.types.values() {
            for ty in def.field_types() {
                self.check_references(def.name(), ty)?;
            }
        }
        Ok(())
    }

    /// Checks that a type expression only references registered shapes.
    pub fn check_references(&self, owner: &str, ty: &TypeExpr) -> Result<(), ShapeError> {
        match ty.references().into_iter().find(|name| !self.types.contains_key(*name)) {
            Some(name) => Err(ShapeError::UnknownType {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Decodes a value of type `ty`.
    pub fn decode(&self, ty: &TypeExpr, sexp: &Sexp) -> Result<Value, DecodeError> {
        match ty {
            TypeExpr::Unit => <()>::from_sexp(sexp).map(|()| Value::Unit),
            TypeExpr::Bool => bool::from_sexp(sexp).map(Value::Bool),
            TypeExpr::Char => char::from_sexp(sexp).map(Value::Char),
            TypeExpr::Int => i128::from_sexp(sexp).map(Value::Int),
            TypeExpr::Float => f64::from_sexp(sexp).map(Value::Float),
            TypeExpr::String => String::from_sexp(sexp).map(Value::Str),
            TypeExpr::Sexp => Ok(Value::Sexp(sexp.clone())),
            TypeExpr::List(inner) => decode_seq(sexp, |item| self.decode(inner, item)).map(Value::List),
            TypeExpr::Option(inner) => {
                decode_option(sexp, |item| self.decode(inner, item)).map(|value| Value::Option(value.map(Box::new)))
            }
            TypeExpr::Set(inner) => decode_seq(sexp, |item| self.decode(inner, item)).map(Value::set),
            TypeExpr::Pair(a, b) => decode_pair(sexp, |x| self.decode(a, x), |y| self.decode(b, y))
                .map(|(x, y)| Value::Pair(Box::new(x), Box::new(y))),
            TypeExpr::Either(left, right) => self.decode_either(left, right, sexp),
            TypeExpr::Map(k, v) => {
                decode_map(sexp, |key| self.decode(k, key), |value| self.decode(v, value)).map(Value::map)
            }
            TypeExpr::Named(name) => match self.types.get(name) {
                Some(TypeDef::Record(record)) => self.decode_record(record, sexp),
                Some(TypeDef::Union(union)) => self.decode_union(union, sexp),
                None => Err(DecodeError::UnknownType(name.clone())),
            },
        }
    }

    /// Parses `name` as a type expression and decodes against it.
    pub fn decode_as(&self, name: &str, sexp: &Sexp) -> Result<Value, DecodeError> {
        let ty = name
            .parse()
            .map_err(|_| DecodeError::UnknownType(name.to_string()))?;
        self.decode(&ty, sexp)
    }

    fn decode_either(&self, left: &TypeExpr, right: &TypeExpr, sexp: &Sexp) -> Result<Value, DecodeError> {
        let mut variant = VariantReader::new("Either", sexp, |tag| {
            matches!(tag, "Left" | "Right").then_some(1)
        })?;
        let either = match variant.constructor() {
            "Left" => Either::Left(Box::new(variant.arg_with(|x| self.decode(left, x))?)),
            _ => Either::Right(Box::new(variant.arg_with(|y| self.decode(right, y))?)),
        };
        Ok(Value::Either(either))
    }

    fn decode_record(&self, record: &RecordDef, sexp: &Sexp) -> Result<Value, DecodeError> {
        let reader = RecordReader::new(&record.name, sexp)?;
        let fields = record
            .fields
            .iter()
            .map(|(field, ty)| {
                let value = reader.field_with(field, |item| self.decode(ty, item))?;
                Ok((field.clone(), value))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;
        Ok(Value::Record {
            name: record.name.clone(),
            fields,
        })
    }

    fn decode_union(&self, union: &UnionDef, sexp: &Sexp) -> Result<Value, DecodeError> {
        let mut variant = VariantReader::new(&union.name, sexp, |tag| {
            union.constructor(tag).map(|ctor| ctor.args.len())
        })?;
        let ctor = union
            .constructor(variant.constructor())
            .ok_or_else(|| variant.unknown())?;
        let args = ctor
            .args
            .iter()
            .map(|ty| variant.arg_with(|item| self.decode(ty, item)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Variant {
            union: union.name.clone(),
            constructor: ctor.name.clone(),
            args,
        })
    }

    /// Encodes a value of type `ty`, checking that it fits.
    pub fn encode(&self, ty: &TypeExpr, value: &Value) -> Result<Sexp, SchemaError> {
        let sexp = match (ty, value) {
            (TypeExpr::Unit, Value::Unit) => ().to_sexp(),
            (TypeExpr::Bool, Value::Bool(b)) => b.to_sexp(),
            (TypeExpr::Char, Value::Char(c)) => c.to_sexp(),
            (TypeExpr::Int, Value::Int(n)) => n.to_sexp(),
            (TypeExpr::Float, Value::Float(x)) => x.to_sexp(),
            (TypeExpr::String, Value::Str(s)) => s.to_sexp(),
            (TypeExpr::Sexp, Value::Sexp(s)) => s.clone(),
            (TypeExpr::List(inner), Value::List(items)) | (TypeExpr::Set(inner), Value::Set(items)) => items
                .iter()
                .map(|item| self.encode(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Sexp::List)?,
            (TypeExpr::Option(inner), Value::Option(item)) => encode_option(
                item.as_deref()
                    .map(|item| self.encode(inner, item))
                    .transpose()?,
            ),
            (TypeExpr::Pair(a, b), Value::Pair(x, y)) => {
                Sexp::list([self.encode(a, x)?, self.encode(b, y)?])
            }
            (TypeExpr::Either(left, _), Value::Either(Either::Left(x))) => {
                encode_variant("Left", vec![self.encode(left, x)?])
            }
            (TypeExpr::Either(_, right), Value::Either(Either::Right(y))) => {
                encode_variant("Right", vec![self.encode(right, y)?])
            }
            (TypeExpr::Map(k, v), Value::Map(entries)) => encode_map(
                entries
                    .iter()
                    .map(|(key, value)| Ok((self.encode(k, key)?, self.encode(v, value)?)))
                    .collect::<Result<Vec<_>, SchemaError>>()?,
            ),
            (TypeExpr::Named(name), _) => match self.types.get(name) {
                Some(TypeDef::Record(record)) => self.encode_record(record, value)?,
                Some(TypeDef::Union(union)) => self.encode_union(union, value)?,
                None => return Err(SchemaError::UnknownType(name.clone())),
            },
            _ => return Err(mismatch(ty, value)),
        };
        Ok(sexp)
    }

    fn encode_record(&self, record: &RecordDef, value: &Value) -> Result<Sexp, SchemaError> {
        let Value::Record { name, fields } = value else {
            return Err(mismatch_named(&record.name, value));
        };
        if *name != record.name {
            return Err(mismatch_named(&record.name, value));
        }
        if fields.len() != record.fields.len() {
            return Err(SchemaError::WrongCount {
                owner: record.name.clone(),
                expected: record.fields.len(),
                got: fields.len(),
            });
        }

        let mut encoded = Vec::with_capacity(record.fields.len());
        for (field, ty) in &record.fields {
            let item = value.field(field).ok_or_else(|| SchemaError::MissingField {
                record: record.name.clone(),
                field: field.clone(),
            })?;
            encoded.push((field.as_str(), self.encode(ty, item)?));
        }
        Ok(encode_record(encoded))
    }

    fn encode_union(&self, union: &UnionDef, value: &Value) -> Result<Sexp, SchemaError> {
        let Value::Variant {
            union: name,
            constructor,
            args,
        } = value
        else {
            return Err(mismatch_named(&union.name, value));
        };
        if *name != union.name {
            return Err(mismatch_named(&union.name, value));
        }

        let ctor = union
            .constructor(constructor)
            .ok_or_else(|| SchemaError::UnknownConstructor {
                union: union.name.clone(),
                constructor: constructor.clone(),
            })?;
        if args.len() != ctor.args.len() {
            return Err(SchemaError::WrongCount {
                owner: ctor.name.clone(),
                expected: ctor.args.len(),
                got: args.len(),
            });
        }

        let encoded = ctor
            .args
            .iter()
            .zip(args)
            .map(|(ty, arg)| self.encode(ty, arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(encode_variant(&ctor.name, encoded))
    }
}

fn mismatch(ty: &TypeExpr, value: &Value) -> SchemaError {
    mismatch_named(&ty.to_string(), value)
}

fn mismatch_named(expected: &str, value: &Value) -> SchemaError {
    SchemaError::Mismatch {
        expected: expected.to_string(),
        found: value.kind(),
    }
}
