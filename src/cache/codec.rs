//! Value Codec Module
//!
//! Converts typed cache values to bytes and back.
//!
//! Encoded values carry a one-byte discriminant followed by the payload, so a
//! stored `Text("42")` always comes back as text. Untagged input (for example a
//! value typed on a command line) can still be recovered on a best-effort basis
//! with [`CacheValue::infer`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Discriminants ==
const TAG_TEXT: u8 = b's';
const TAG_BYTES: u8 = b'b';
const TAG_INTEGER: u8 = b'i';
const TAG_UNSIGNED: u8 = b'u';
const TAG_FLOAT: u8 = b'f';
const TAG_BOOL: u8 = b't';
const TAG_STRUCTURED: u8 = b'j';

// == Cache Value ==
/// A value stored in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Text(String),
    Bytes(Vec<u8>),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    /// Any composite value, kept in its JSON form
    Structured(serde_json::Value),
}

impl CacheValue {
    /// Builds a structured value from anything serde can serialize.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(CacheValue::Structured(serde_json::to_value(value)?))
    }

    /// Converts the value into `T` through its JSON representation.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T> {
        let json = match self {
            CacheValue::Text(s) => serde_json::Value::String(s),
            CacheValue::Bytes(b) => serde_json::to_value(b)?,
            CacheValue::Integer(i) => serde_json::Value::from(i),
            CacheValue::Unsigned(u) => serde_json::Value::from(u),
            CacheValue::Float(f) => serde_json::Value::from(f),
            CacheValue::Bool(b) => serde_json::Value::Bool(b),
            CacheValue::Structured(v) => v,
        };
        Ok(serde_json::from_value(json)?)
    }

    /// Short name of the variant, used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Text(_) => "text",
            CacheValue::Bytes(_) => "bytes",
            CacheValue::Integer(_) => "integer",
            CacheValue::Unsigned(_) => "unsigned",
            CacheValue::Float(_) => "float",
            CacheValue::Bool(_) => "bool",
            CacheValue::Structured(_) => "structured",
        }
    }

    // == Infer ==
    /// Best-effort recovery of an untagged byte sequence.
    ///
    /// Precedence is integer, then float, then boolean (`t`, `true`, `True`,
    /// `TRUE` and the matching false forms), then JSON, and finally raw text.
    /// This is lossy: the text `"42"` comes back as `Integer(42)` and
    /// `"true"` as `Bool(true)`. Bytes that are not valid UTF-8 are returned as
    /// `Bytes`.
    pub fn infer(data: &[u8]) -> Self {
        let text = match std::str::from_utf8(data) {
            Ok(text) => text,
            Err(_) => return CacheValue::Bytes(data.to_vec()),
        };

        if let Ok(i) = text.parse::<i64>() {
            return CacheValue::Integer(i);
        }
        if let Ok(u) = text.parse::<u64>() {
            return CacheValue::Unsigned(u);
        }
        if let Ok(f) = text.parse::<f64>() {
            return CacheValue::Float(f);
        }
        match text {
            "t" | "T" | "true" | "True" | "TRUE" => return CacheValue::Bool(true),
            "f" | "F" | "false" | "False" | "FALSE" => return CacheValue::Bool(false),
            _ => {}
        }
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
            return CacheValue::Structured(json);
        }

        CacheValue::Text(text.to_string())
    }
}

// == Encode ==
/// Encodes a value into its tagged byte form.
pub fn encode(value: &CacheValue) -> Result<Vec<u8>> {
    let (tag, mut payload) = match value {
        CacheValue::Text(s) => (TAG_TEXT, s.as_bytes().to_vec()),
        CacheValue::Bytes(b) => (TAG_BYTES, b.clone()),
        CacheValue::Integer(i) => (TAG_INTEGER, i.to_string().into_bytes()),
        CacheValue::Unsigned(u) => (TAG_UNSIGNED, u.to_string().into_bytes()),
        CacheValue::Float(f) => (TAG_FLOAT, f.to_string().into_bytes()),
        CacheValue::Bool(b) => (TAG_BOOL, b.to_string().into_bytes()),
        CacheValue::Structured(v) => (TAG_STRUCTURED, serde_json::to_vec(v)?),
    };

    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(tag);
    out.append(&mut payload);
    Ok(out)
}

// == Decode ==
/// Decodes bytes produced by [`encode`].
pub fn decode(data: &[u8]) -> Result<CacheValue> {
    let (&tag, payload) = data
        .split_first()
        .ok_or_else(|| CacheError::Serialization("empty encoded value".to_string()))?;

    match tag {
        TAG_BYTES => Ok(CacheValue::Bytes(payload.to_vec())),
        TAG_STRUCTURED => Ok(CacheValue::Structured(serde_json::from_slice(payload)?)),
        TAG_TEXT => Ok(CacheValue::Text(payload_text(payload)?.to_string())),
        TAG_INTEGER => parse_payload(payload).map(CacheValue::Integer),
        TAG_UNSIGNED => parse_payload(payload).map(CacheValue::Unsigned),
        TAG_FLOAT => parse_payload(payload).map(CacheValue::Float),
        TAG_BOOL => parse_payload(payload).map(CacheValue::Bool),
        other => Err(CacheError::Serialization(format!(
            "unknown value discriminant 0x{:02x}",
            other
        ))),
    }
}

fn payload_text(payload: &[u8]) -> Result<&str> {
    std::str::from_utf8(payload)
        .map_err(|e| CacheError::Serialization(format!("payload is not UTF-8: {}", e)))
}

fn parse_payload<T>(payload: &[u8]) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let text = payload_text(payload)?;
    text.parse::<T>()
        .map_err(|e| CacheError::Serialization(format!("invalid payload {:?}: {}", text, e)))
}

// == Conversions ==
impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        CacheValue::Bytes(value)
    }
}

impl From<&[u8]> for CacheValue {
    fn from(value: &[u8]) -> Self {
        CacheValue::Bytes(value.to_vec())
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Bool(value)
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(value: serde_json::Value) -> Self {
        CacheValue::Structured(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CacheValue {
                fn from(value: $ty) -> Self {
                    CacheValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<isize> for CacheValue {
    fn from(value: isize) -> Self {
        CacheValue::Integer(value as i64)
    }
}

impl From<u64> for CacheValue {
    fn from(value: u64) -> Self {
        CacheValue::Unsigned(value)
    }
}

impl From<usize> for CacheValue {
    fn from(value: usize) -> Self {
        CacheValue::Unsigned(value as u64)
    }
}

impl From<f32> for CacheValue {
    fn from(value: f32) -> Self {
        CacheValue::Float(f64::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Float(value)
    }
}
