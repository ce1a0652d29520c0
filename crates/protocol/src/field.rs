//! Typed key/value fields
//!
//! A `Field` pairs a key with a `Value`. Fields keep their call order and
//! duplicate keys are rendered as given.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Serializable payload rendered as JSON
///
/// Implemented for every `Serialize + Send + Sync` type, so any serde value
/// can be attached to a record without converting it up front.
pub trait Reflect: Send + Sync {
    /// Write the JSON form of this value into `out`
    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()>;
}

impl<T> Reflect for T
where
    T: Serialize + Send + Sync,
{
    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        serde_json::to_writer(out, self)
    }
}

/// Field value
#[derive(Clone)]
pub enum Value {
    /// UTF-8 text, written raw
    Str(Cow<'static, str>),
    /// Arbitrary bytes, written raw
    ByteStr(Vec<u8>),
    /// Binary blob, written base64-encoded
    Binary(Vec<u8>),
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    F32(f32),
    /// Rendered through the configured duration encoder
    Duration(Duration),
    /// Rendered through the configured time encoder
    Time(DateTime<Local>),
    /// Bracket-delimited elements, separated by a single space
    Array(Vec<Value>),
    /// Brace-delimited `key=value` entries, each preceded by the line separator
    Object(Vec<Field>),
    /// JSON payload; `None` renders as `null`
    Reflected(Option<Arc<dyn Reflect>>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::ByteStr(b) => f.debug_tuple("ByteStr").field(b).finish(),
            Self::Binary(b) => f.debug_tuple("Binary").field(&b.len()).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Self::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Self::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Self::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Self::Duration(d) => f.debug_tuple("Duration").field(d).finish(),
            Self::Time(t) => f.debug_tuple("Time").field(t).finish(),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Object(fields) => f.debug_tuple("Object").field(fields).finish(),
            Self::Reflected(v) => f
                .debug_tuple("Reflected")
                .field(&v.as_ref().map(|_| ".."))
                .finish(),
        }
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Self::Str(Cow::Borrowed(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Cow::Owned(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I64(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U64(u64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::U64(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Self::Duration(v)
    }
}

impl From<DateTime<Local>> for Value {
    fn from(v: DateTime<Local>) -> Self {
        Self::Time(v)
    }
}

/// A key/value pair attached to a log record
#[derive(Debug, Clone)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    /// Create a field from any value convertible into `Value`
    #[inline]
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Text field
    #[inline]
    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, Value::Str(value.into()))
    }

    /// Raw byte-string field
    #[inline]
    pub fn byte_string(key: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, Value::ByteStr(value.into()))
    }

    /// Binary field, rendered base64
    #[inline]
    pub fn binary(key: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, Value::Binary(value.into()))
    }

    #[inline]
    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    #[inline]
    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, Value::I64(value))
    }

    #[inline]
    pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, Value::U64(value))
    }

    #[inline]
    pub fn float(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, Value::F64(value))
    }

    #[inline]
    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    #[inline]
    pub fn time(key: impl Into<Cow<'static, str>>, value: DateTime<Local>) -> Self {
        Self::new(key, Value::Time(value))
    }

    /// Nested array field
    pub fn array(key: impl Into<Cow<'static, str>>, items: Vec<Value>) -> Self {
        Self::new(key, Value::Array(items))
    }

    /// Nested object field
    pub fn object(key: impl Into<Cow<'static, str>>, fields: Vec<Field>) -> Self {
        Self::new(key, Value::Object(fields))
    }

    /// Serializable payload, rendered as JSON when the record is encoded
    pub fn any<T>(key: impl Into<Cow<'static, str>>, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::new(key, Value::Reflected(Some(Arc::new(value))))
    }

    /// Absent payload, rendered as `null`
    pub fn null(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, Value::Reflected(None))
    }

    /// Error rendered through its `Display` implementation
    pub fn error(key: impl Into<Cow<'static, str>>, err: &dyn fmt::Display) -> Self {
        Self::new(key, Value::Str(Cow::Owned(err.to_string())))
    }

    /// Field key
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Field value
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}
