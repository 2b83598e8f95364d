//! Lenient numeric fields.
//!
//! Plex emits some numeric fields either as JSON numbers or as strings, and
//! sometimes as the empty string. The codecs here accept all three forms; an
//! empty string (or `null`) decodes to zero. Values always serialize back as
//! plain numbers.
//!
//! Use them through `#[serde(with = "crate::codec::string_int")]` or the
//! standalone `coerce_*` functions over a parsed [`serde_json::Value`].
//!
//! [`null_as_default`] covers the other fields: Plex sends `null` where it
//! means "unset", which decodes to the field's default.

use std::fmt;
use std::marker::PhantomData;

use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use serde_json::Value;

use crate::error::Error;

/// A numeric target the codecs can produce.
trait Lenient: Sized + Default + Copy {
    const TARGET: &'static str;

    fn from_i64(value: i64) -> Option<Self>;
    fn from_u64(value: u64) -> Option<Self>;
    fn from_f64(value: f64) -> Option<Self>;
    fn parse(text: &str) -> Option<Self>;
}

impl Lenient for i32 {
    const TARGET: &'static str = "i32";

    fn from_i64(value: i64) -> Option<Self> {
        i32::try_from(value).ok()
    }

    fn from_u64(value: u64) -> Option<Self> {
        i32::try_from(value).ok()
    }

    fn from_f64(_value: f64) -> Option<Self> {
        None
    }

    fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl Lenient for i64 {
    const TARGET: &'static str = "i64";

    fn from_i64(value: i64) -> Option<Self> {
        Some(value)
    }

    fn from_u64(value: u64) -> Option<Self> {
        i64::try_from(value).ok()
    }

    fn from_f64(_value: f64) -> Option<Self> {
        None
    }

    fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl Lenient for f32 {
    const TARGET: &'static str = "f32";

    fn from_i64(value: i64) -> Option<Self> {
        Some(value as f32)
    }

    fn from_u64(value: u64) -> Option<Self> {
        Some(value as f32)
    }

    fn from_f64(value: f64) -> Option<Self> {
        let narrowed = value as f32;
        narrowed.is_finite().then_some(narrowed)
    }

    fn parse(text: &str) -> Option<Self> {
        text.parse::<f64>().ok().and_then(Self::from_f64)
    }
}

fn coerce_text<T: Lenient>(text: &str) -> Option<T> {
    if text.is_empty() {
        return Some(T::default());
    }
    T::parse(text)
}

fn coerce_value<T: Lenient>(value: &Value) -> crate::Result<T> {
    let coerced = match value {
        Value::Null => Some(T::default()),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                T::from_i64(value)
            } else if let Some(value) = number.as_u64() {
                T::from_u64(value)
            } else {
                number.as_f64().and_then(T::from_f64)
            }
        }
        Value::String(text) => coerce_text(text),
        _ => None,
    };
    coerced.ok_or_else(|| Error::Coercion {
        value: value.to_string(),
        target: T::TARGET,
    })
}

/// Decodes a 32-bit integer from a number, a numeric string or `""`.
pub fn coerce_i32(value: &Value) -> crate::Result<i32> {
    coerce_value(value)
}

/// Decodes a 64-bit integer from a number, a numeric string or `""`.
pub fn coerce_i64(value: &Value) -> crate::Result<i64> {
    coerce_value(value)
}

/// Decodes a 32-bit float from a number, a numeric string or `""`.
pub fn coerce_f32(value: &Value) -> crate::Result<f32> {
    coerce_value(value)
}

struct LenientVisitor<T>(PhantomData<T>);

impl<T: Lenient> LenientVisitor<T> {
    fn reject<E: de::Error>(unexpected: de::Unexpected<'_>) -> E {
        E::invalid_value(unexpected, &Self(PhantomData))
    }
}

impl<'de, T: Lenient> Visitor<'de> for LenientVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a number or a string holding an {}", T::TARGET)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
        T::from_i64(value).ok_or_else(|| Self::reject(de::Unexpected::Signed(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
        T::from_u64(value).ok_or_else(|| Self::reject(de::Unexpected::Unsigned(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<T, E> {
        T::from_f64(value).ok_or_else(|| Self::reject(de::Unexpected::Float(value)))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
        coerce_text(value).ok_or_else(|| Self::reject(de::Unexpected::Str(value)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<T, E> {
        Ok(T::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<T, E> {
        Ok(T::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
        deserializer.deserialize_any(self)
    }
}

fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Lenient,
{
    deserializer.deserialize_any(LenientVisitor(PhantomData))
}

/// `#[serde(deserialize_with = "...")]` adapter that decodes an explicit
/// `null` as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `#[serde(with = "...")]` adapter for `i32` fields.
pub mod string_int {
    use serde::{Deserializer, Serializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        super::deserialize_lenient(deserializer)
    }

    pub fn serialize<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*value)
    }
}

/// `#[serde(with = "...")]` adapter for `i64` fields.
pub mod string_int64 {
    use serde::{Deserializer, Serializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        super::deserialize_lenient(deserializer)
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*value)
    }
}

/// `#[serde(with = "...")]` adapter for `f32` fields.
pub mod string_float32 {
    use serde::{Deserializer, Serializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        super::deserialize_lenient(deserializer)
    }

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(*value)
    }
}
