//! value representation
//!
//! Expressions evaluate to the following data types
//! - boolean (True/False)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8)
//! - list (of values, may nest and mix types)
//!
//! Additionally:
//! - there is no `null`/`None` value and no map type
//! - the only valid **implicit** conversion: every `integer` is also a `decimal` (`1 == 1.0`)
//! - booleans are not numbers: `True == 1` is false, so `True in [1]` is false as well
//! - integer literals are unsigned before negation, so `i64::MIN` has to be written as `-9223372036854775807 - 1`
//! - `False`, `0`, `0.0`, `""` and `[]` are falsy, every other value is truthy
//!
use serde::{
    de::{self, SeqAccess, Unexpected, Visitor},
    ser::SerializeSeq,
    Deserializer, Serializer,
};
use std::cmp::Ordering;
use std::fmt;

/// Variable bindings, ordered by first insertion
pub type Variables = indexmap::IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    List(Vec<Value>),
}

/// Discriminant of a [Value], used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    String,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Boolean => f.write_str("boolean"),
            ValueKind::Integer => f.write_str("integer"),
            ValueKind::Decimal => f.write_str("decimal"),
            ValueKind::String => f.write_str("string"),
            ValueKind::List => f.write_str("list"),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(value) => *value,
            Value::Integer(value) => *value != 0,
            Value::Decimal(value) => *value != 0.0,
            Value::String(value) => !value.is_empty(),
            Value::List(value) => !value.is_empty(),
        }
    }
}

/// Structural equality
///
/// Integers and decimals compare numerically. Values of different kinds are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Integer(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordering between values of compatible kinds
///
/// Lists compare element-wise: the first unequal pair decides, otherwise the shorter list is smaller.
/// Returns `None` for incompatible kinds.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Decimal(b)) => (*a as f64).partial_cmp(b),
            (Value::Decimal(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                match a.iter().zip(b).find(|(left, right)| left != right) {
                    Some((left, right)) => left.partial_cmp(right),
                    None => Some(a.len().cmp(&b.len())),
                }
            }
            _ => None,
        }
    }
}

/// Renders the value the way it would be written as a literal
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value:?}"),
            Value::String(value) => write!(f, "{value:?}"),
            Value::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
        }
    }
}

impl<'de> serde::de::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a boolean, number, string or list")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Boolean(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Value, E> {
        Ok(Value::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Value, E> {
        i64::try_from(value)
            .map(Value::Integer)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Value, E> {
        Ok(Value::Decimal(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element()? {
            values.push(value);
        }
        Ok(Value::List(values))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness() {
        let falsy: Vec<Value> = vec![
            false.into(),
            0.into(),
            0.0.into(),
            "".into(),
            Value::List(vec![]),
        ];
        assert!(falsy.iter().all(|value| !value.is_truthy()));

        let truthy: Vec<Value> = vec![
            true.into(),
            (-1).into(),
            0.5.into(),
            "0".into(),
            vec![false].into(),
        ];
        assert!(truthy.iter().all(Value::is_truthy));
    }

    #[test]
    fn numeric_equality_crosses_integer_and_decimal() {
        assert_eq!(Value::Integer(1), Value::Decimal(1.0));
        assert_ne!(Value::Boolean(true), Value::Integer(1));
        assert_ne!(Value::from("1"), Value::Integer(1));
    }

    #[test]
    fn list_ordering() {
        let short: Value = vec![1, 2].into();
        let long: Value = vec![1, 2, 0].into();
        let bigger: Value = vec![1, 3].into();

        assert_eq!(short.partial_cmp(&long), Some(Ordering::Less));
        assert_eq!(bigger.partial_cmp(&long), Some(Ordering::Greater));
        assert_eq!(
            Value::from(vec!["a"]).partial_cmp(&Value::from(vec![1])),
            None
        );
    }

    #[test]
    fn display_as_literal() {
        let value = Value::List(vec![
            12.into(),
            "abc".into(),
            Value::List(vec![false.into(), 1.5.into()]),
        ]);
        assert_eq!(value.to_string(), r#"[12, "abc", [False, 1.5]]"#);
    }

    #[test]
    fn deserialize_from_json() {
        let value: Value = serde_json::from_str(r#"[12, "abc", [false, "def"], 2.5]"#).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                12.into(),
                "abc".into(),
                Value::List(vec![false.into(), "def".into()]),
                2.5.into(),
            ])
        );

        assert!(serde_json::from_str::<Value>("null").is_err());
        assert!(serde_json::from_str::<Value>(r#"{"a": 1}"#).is_err());
        assert!(serde_json::from_str::<Value>("18446744073709551615").is_err());
    }
}
