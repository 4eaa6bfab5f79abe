//! Declarative record schemas.
//!
//! A `RecordSchema` is an ordered list of `Field`s, each naming the JSON key it
//! reads, the kind it expects, and whether absence (or `null`) is allowed.
//! Schemas are plain data interpreted by `crate::decode`; nothing here knows
//! about the concrete record types built on top of them.
use serde_json::{json, Map, Value};

use crate::kind::JsonKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    String,
    Number,
    Bool,
    /// nested object decoded with its own schema
    Record(Box<RecordSchema>),
    /// JSON array of homogeneous objects
    RecordArray(Box<RecordSchema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub key: String,
    pub kind: Kind,
    pub required: bool,      // absent or null is a `MissingField` error
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<Field>,  // documentation order only; lookups go by key
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Kind {
    pub fn record(schema: RecordSchema) -> Self { Kind::Record(Box::new(schema)) }
    pub fn record_array(schema: RecordSchema) -> Self { Kind::RecordArray(Box::new(schema)) }

    /// The JSON kind a value must have to be accepted for this field kind.
    pub fn expects(&self) -> JsonKind {
        match self {
            Kind::String => JsonKind::String,
            Kind::Number => JsonKind::Number,
            Kind::Bool => JsonKind::Bool,
            Kind::Record(_) => JsonKind::Object,
            Kind::RecordArray(_) => JsonKind::Array,
        }
    }

    fn describe(&self) -> Value {
        match self {
            Kind::Record(schema) => schema.describe(),
            Kind::RecordArray(schema) => json!({
                "type": "array",
                "items": schema.describe(),
            }),
            scalar => json!({ "type": scalar.expects().as_str() }),
        }
    }
}

impl Field {
    /// A field whose JSON key equals its name. Optional until `required()` is called.
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        let name = name.into();
        Self { key: name.clone(), name, kind, required: false }
    }
    /// Read the value from a JSON key that differs from the field name.
    pub fn from_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
    pub fn optional(self, name: impl Into<String>, kind: Kind) -> Self {
        self.field(Field::new(name, kind))
    }
    pub fn required(self, name: impl Into<String>, kind: Kind) -> Self {
        self.field(Field::new(name, kind).required())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Minimal JSON Schema–ish description. Optional fields are emitted as
    /// `oneOf [<kind>, null]`; nested schemas are inlined.
    pub fn describe(&self) -> Value {
        let mut props = Map::new();
        let mut required: Vec<Value> = Vec::new();
        for field in &self.fields {
            let core = field.kind.describe();
            if field.required {
                required.push(Value::from(field.key.clone()));
                props.insert(field.key.clone(), core);
            } else {
                props.insert(field.key.clone(), json!({ "oneOf": [core, { "type": "null" }] }));
            }
        }
        let mut o = json!({ "title": self.name, "type": "object", "properties": props });
        if !required.is_empty() {
            o["required"] = Value::Array(required);
        }
        o
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
