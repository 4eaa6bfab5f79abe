//! Typed records from JSON through declarative schemas.
//!
//! `serde_json` parses text into a `Value` tree; `decode` walks that tree with
//! a `RecordSchema` and yields immutable `Record`s or a path-qualified
//! `DecodeError`. `languages` builds the language-listing document on top.
pub mod kind;
pub mod schema;
pub mod error;
pub mod decode;
pub mod languages;
pub mod path_de;
pub mod jq_exec;
pub mod cli;

pub use decode::{decode, decode_array, FieldValue, Record};
pub use error::{DecodeError, Path, Segment};
pub use kind::JsonKind;
pub use languages::{decode_root, decode_root_value, decode_root_with, Detail, Header, Root, Strictness};
pub use schema::{Field, Kind, RecordSchema};
