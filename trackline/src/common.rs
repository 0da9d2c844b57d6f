//! Primitives shared by events, tracks and annotations.

use std::borrow::Cow;
use std::{fmt, hash};

/// A string that is either borrowed from static storage or owned.
///
/// Statically named and dynamically built event names unify here; once a
/// value is copied into an immutable [`Event`](crate::Event) record the
/// distinction no longer matters, so equality, ordering and hashing all go
/// through the string content.
#[derive(Clone, Eq)]
pub enum StringValue {
    /// Borrowed from `'static` storage, typically a literal.
    Static(&'static str),
    /// Built at runtime.
    Owned(Box<str>),
}

impl StringValue {
    /// Returns a reference to the underlying string.
    pub fn as_str(&self) -> &str {
        match self {
            StringValue::Static(s) => s,
            StringValue::Owned(s) => s,
        }
    }
}

impl fmt::Debug for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl PartialEq for StringValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialOrd for StringValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl hash::Hash for StringValue {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl From<&'static str> for StringValue {
    fn from(s: &'static str) -> Self {
        StringValue::Static(s)
    }
}

impl From<String> for StringValue {
    fn from(s: String) -> Self {
        StringValue::Owned(s.into_boxed_str())
    }
}

impl From<Cow<'static, str>> for StringValue {
    fn from(s: Cow<'static, str>) -> Self {
        match s {
            Cow::Borrowed(s) => StringValue::Static(s),
            Cow::Owned(s) => StringValue::Owned(s.into_boxed_str()),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StringValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The key half of an annotation [`KeyValue`] pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Key(StringValue);

impl Key {
    /// Create a new `Key`.
    pub fn new(value: impl Into<Key>) -> Self {
        value.into()
    }

    /// Create a new const `Key`.
    pub const fn from_static_str(value: &'static str) -> Self {
        Key(StringValue::Static(value))
    }

    /// Returns a reference to the underlying key name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&'static str> for Key {
    fn from(s: &'static str) -> Self {
        Key(StringValue::Static(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(StringValue::from(s))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The value half of an annotation [`KeyValue`] pair.
///
/// Annotations carry either an integer or a string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Integer value.
    Int(i64),
    /// String value.
    String(StringValue),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Value::String(StringValue::Static(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(StringValue::from(v))
    }
}

impl From<StringValue> for Value {
    fn from(v: StringValue) -> Self {
        Value::String(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => v.fmt(f),
            Value::String(v) => v.fmt(f),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::String(v) => serializer.serialize_str(v.as_str()),
        }
    }
}

/// One ordered key/value annotation on a recorded event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KeyValue {
    /// The annotation key.
    pub key: Key,
    /// The annotation value.
    pub value: Value,
}

impl KeyValue {
    /// Create a new `KeyValue` pair.
    pub fn new(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_value_equality_ignores_storage() {
        assert_eq!(
            StringValue::Static("DrawGame"),
            StringValue::from(String::from("DrawGame"))
        );
    }

    #[test]
    fn key_value_conversions() {
        let kv = KeyValue::new("player_number", 2);
        assert_eq!(kv.key.as_str(), "player_number");
        assert_eq!(kv.value, Value::Int(2));

        let kv = KeyValue::new("name", String::from("worker"));
        assert_eq!(kv.value, Value::String("worker".into()));
    }
}
