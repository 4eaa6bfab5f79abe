//! Derive-based decoding: `serde::Deserialize` impls driven through
//! `serde_path_to_error` so failures still name the JSON path.
//!
//! Derived struct impls also accept a JSON array (fields by position). Records
//! here are objects only, so every record position goes through `ObjectOnly`.
use std::fmt;
use std::marker::PhantomData;

use serde::de::value::MapAccessDeserializer;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::DecodeError;

/// Deserialize with JSON-path context in error messages. The document itself
/// must be a JSON object.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DecodeError> {
    let mut de = serde_json::Deserializer::from_str(src);
    let ObjectOnly(value) =
        serde_path_to_error::deserialize::<_, ObjectOnly<T>>(&mut de).map_err(into_decode_error)?;
    de.end()?;
    Ok(value)
}

pub fn from_value_with_path<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize::<_, ObjectOnly<T>>(value)
        .map(|ObjectOnly(value)| value)
        .map_err(into_decode_error)
}

/// `T` read from a JSON object and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectOnly<T>(pub T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ObjectOnly<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ObjectVisitor(PhantomData)).map(ObjectOnly)
    }
}

struct ObjectVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for ObjectVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<T, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map))
    }
}

/// `deserialize_with` helper for optional arrays of records.
pub fn optional_objects<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<ObjectOnly<T>>>::deserialize(deserializer)?;
    Ok(items.map(|items| items.into_iter().map(|ObjectOnly(item)| item).collect()))
}

fn into_decode_error(err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let path = err.path().to_string();
    let inner = err.into_inner();
    if inner.is_syntax() || inner.is_eof() || inner.is_io() {
        return DecodeError::Parse(inner);
    }
    DecodeError::Deserialize { path, message: inner.to_string() }
}
