//! Dynamically typed values for schema-driven codecs.

use rhizome_knot_sexp::Sexp;

use crate::Either;

/// A value of any type a [`Schema`](crate::Schema) can describe.
///
/// Records keep their fields and variants keep their arguments in declaration
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Char(char),
    Int(i128),
    Float(f64),
    Str(String),
    /// A raw S-expression, carried through untouched.
    Sexp(Sexp),
    List(Vec<Value>),
    Option(Option<Box<Value>>),
    Pair(Box<Value>, Box<Value>),
    Either(Either<Box<Value>, Box<Value>>),
    /// Distinct elements in first-seen order.
    Set(Vec<Value>),
    /// Entries with distinct keys in first-seen order.
    Map(Vec<(Value, Value)>),
    Record {
        name: String,
        fields: Vec<(String, Value)>,
    },
    Variant {
        union: String,
        constructor: String,
        args: Vec<Value>,
    },
}

impl Value {
    /// A short name for the kind of value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Sexp(_) => "sexp",
            Value::List(_) => "list",
            Value::Option(_) => "option",
            Value::Pair(..) => "pair",
            Value::Either(_) => "either",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Record { .. } => "record",
            Value::Variant { .. } => "variant",
        }
    }

    pub fn record(name: impl Into<String>, fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Record {
            name: name.into(),
            fields: fields.into_iter().collect(),
        }
    }

    pub fn variant(
        union: impl Into<String>,
        constructor: impl Into<String>,
        args: impl IntoIterator<Item = Value>,
    ) -> Self {
        Value::Variant {
            union: union.into(),
            constructor: constructor.into(),
            args: args.into_iter().collect(),
        }
    }

    /// The value of a record field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Builds a set, dropping repeated elements.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut distinct: Vec<Value> = Vec::new();
        for item in items {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Value::Set(distinct)
    }

    /// Builds a map; a repeated key replaces the earlier entry's value.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut distinct: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match distinct.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => distinct.push((key, value)),
            }
        }
        Value::Map(distinct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_drops_repeats() {
        let set = Value::set([Value::Int(2), Value::Int(1), Value::Int(2)]);
        assert_eq!(set, Value::Set(vec![Value::Int(2), Value::Int(1)]));
    }

    #[test]
    fn test_map_later_key_wins() {
        let map = Value::map([
            (Value::Str("a".into()), Value::Int(1)),
            (Value::Str("b".into()), Value::Int(2)),
            (Value::Str("a".into()), Value::Int(3)),
        ]);
        assert_eq!(
            map,
            Value::Map(vec![
                (Value::Str("a".into()), Value::Int(3)),
                (Value::Str("b".into()), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn test_field_lookup() {
        let point = Value::record(
            "Point",
            [("x".to_string(), Value::Int(1)), ("y".to_string(), Value::Int(2))],
        );
        assert_eq!(point.field("y"), Some(&Value::Int(2)));
        assert_eq!(point.field("z"), None);
        assert_eq!(Value::Unit.field("x"), None);
        assert_eq!(point.kind(), "record");
    }
}
