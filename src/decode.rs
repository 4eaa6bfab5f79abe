//! Schema-driven decoding of a parsed JSON tree into records.
//!
//! Single recursive pass over the (read-only) input; the first failing field or
//! array element aborts the whole decode. Errors are path-qualified on the way
//! back up, so `details[1].language_code` names the exact spot.
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::{DecodeError, Path};
use crate::kind::JsonKind;
use crate::schema::{Field, Kind, RecordSchema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(Number),
    Bool(bool),
    Record(Record),
    Records(Vec<Record>),
}

/// One slot per schema field, keyed by field name; `None` marks an absent
/// optional field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: IndexMap<String, Option<FieldValue>>,
}

// ————————————————————————————————————————————————————————————————————————————
// DECODING
// ————————————————————————————————————————————————————————————————————————————

pub fn decode(value: &Value, schema: &RecordSchema) -> Result<Record, DecodeError> {
    let Value::Object(map) = value else {
        return Err(DecodeError::type_mismatch(Path::root(), JsonKind::Object, JsonKind::of(value)));
    };
    let mut fields = IndexMap::with_capacity(schema.fields.len());
    for field in &schema.fields {
        fields.insert(field.name.clone(), resolve_field(map, field)?);
    }
    tracing::trace!(record = %schema.name, fields = fields.len(), "decoded record");
    Ok(Record { type_name: schema.name.clone(), fields })
}

pub fn decode_array(value: &Value, schema: &RecordSchema) -> Result<Vec<Record>, DecodeError> {
    let Value::Array(items) = value else {
        return Err(DecodeError::type_mismatch(Path::root(), JsonKind::Array, JsonKind::of(value)));
    };
    let records = items
        .iter()
        .enumerate()
        .map(|(index, item)| decode(item, schema).map_err(|e| e.within_index(index)))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(record = %schema.name, len = records.len(), "decoded record array");
    Ok(records)
}

fn resolve_field(map: &Map<String, Value>, field: &Field) -> Result<Option<FieldValue>, DecodeError> {
    match map.get(&field.key) {
        None | Some(Value::Null) if field.required => {
            Err(DecodeError::MissingField { path: Path::key(&field.key) })
        }
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce(value, field).map(Some),
    }
}

/// No implicit conversion between kinds: a number is never read as a string.
fn coerce(value: &Value, field: &Field) -> Result<FieldValue, DecodeError> {
    let mismatch = || {
        DecodeError::type_mismatch(Path::key(&field.key), field.kind.expects(), JsonKind::of(value))
    };
    match (&field.kind, value) {
        (Kind::String, Value::String(s)) => Ok(FieldValue::String(s.clone())),
        (Kind::Number, Value::Number(n)) => Ok(FieldValue::Number(n.clone())),
        (Kind::Bool, Value::Bool(b)) => Ok(FieldValue::Bool(*b)),
        (Kind::Record(schema), Value::Object(_)) => decode(value, schema)
            .map(FieldValue::Record)
            .map_err(|e| e.within_key(&field.key)),
        (Kind::RecordArray(schema), Value::Array(_)) => decode_array(value, schema)
            .map(FieldValue::Records)
            .map_err(|e| e.within_key(&field.key)),
        _ => Err(mismatch()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ACCESSORS
// ————————————————————————————————————————————————————————————————————————————

impl Record {
    pub fn type_name(&self) -> &str { &self.type_name }

    /// Value of a present field. `None` for absent fields and for names the
    /// schema does not define.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    pub fn is_present(&self, name: &str) -> bool { self.get(name).is_some() }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<&Number> {
        match self.get(name)? {
            FieldValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        match self.get(name)? {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn records(&self, name: &str) -> Option<&[Record]> {
        match self.get(name)? {
            FieldValue::Records(rs) => Some(rs),
            _ => None,
        }
    }

    /// Every schema field in schema order, including absent ones.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
