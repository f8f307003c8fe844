//! # Parameter Values
//!
//! The untyped value model carried inside every [`ParamStore`].
//!
//! ## Typed vs untyped structs
//!
//! A struct built in code and stored through a facade setter is kept as
//! [`Value::Struct`], tagged with its type name. The same struct decoded from
//! the wire arrives as a plain [`Value::Store`]. Both encode identically; the
//! distinction only matters to list getters, which refuse lists mixing the two.

use crate::params::{ParamStore, StoreVisitor};
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null, distinct from an absent key.
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Nested, loosely typed store (decoded from the wire).
    Store(ParamStore),
    /// Struct constructed in code, tagged with its type name.
    Struct(StructValue),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in validation errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Store(_) => "store",
            Value::Struct(s) => s.type_name(),
            Value::List(_) => "list",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Fields of a nested store or typed struct.
    #[must_use]
    pub fn as_store(&self) -> Option<&ParamStore> {
        match self {
            Value::Store(store) => Some(store),
            Value::Struct(s) => Some(s.fields()),
            _ => None,
        }
    }
}

/// A struct value constructed in code.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    type_name: &'static str,
    fields: ParamStore,
}

impl StructValue {
    #[must_use]
    pub fn new(type_name: &'static str, fields: ParamStore) -> Self {
        Self { type_name, fields }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn fields(&self) -> &ParamStore {
        &self.fields
    }

    #[must_use]
    pub fn into_fields(self) -> ParamStore {
        self.fields
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<ParamStore> for Value {
    fn from(v: ParamStore) -> Self {
        Value::Store(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Store(store) => store.serialize(serializer),
            Value::Struct(s) => s.fields.serialize(serializer),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a parameter value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        // Integers beyond i64 keep their magnitude as floats.
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        StoreVisitor.visit_map(map).map(Value::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_nested() {
        let value: Value =
            serde_json::from_str(r#"{"a": [1, 2.5, "x", null, true], "b": {"c": 3}}"#).unwrap();
        let store = value.as_store().unwrap();

        assert_eq!(
            store.get("a"),
            Some(&Value::List(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::String("x".into()),
                Value::Null,
                Value::Bool(true),
            ]))
        );
        assert_eq!(
            store.get("b").and_then(Value::as_store).and_then(|s| s.get("c")),
            Some(&Value::Integer(3))
        );
    }

    #[test]
    fn test_struct_serializes_as_plain_object() {
        let mut fields = ParamStore::new();
        fields.insert("value", Value::from("icon.png"));
        let typed = Value::Struct(StructValue::new("Image", fields.clone()));

        assert_eq!(
            serde_json::to_string(&typed).unwrap(),
            serde_json::to_string(&Value::Store(fields)).unwrap()
        );
        assert_eq!(typed.type_name(), "Image");
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert!(matches!(value, Value::Float(_)));
    }
}
