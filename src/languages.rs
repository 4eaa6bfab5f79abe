//! The language-listing document: a `header` array naming the current language
//! and a `details` array listing the available ones.
//!
//! ```json
//! { "header":  [{ "current_language_code": "ru", "current_language_name": "Russian (Test)" }],
//!   "details": [{ "language_code": "en", "language_name": "English (English)" }] }
//! ```
//!
//! Both top-level arrays are optional, and an absent array stays distinct from
//! an empty one.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{decode, Record};
use crate::error::DecodeError;
use crate::schema::{Field, Kind, RecordSchema};

/// The document the demonstration CLI decodes when no input is given.
pub const SAMPLE: &str = r#"{
    "header": [{
        "current_language_code": "ru",
        "current_language_name": "Russian (Test)"
    }],
    "details": [{
        "language_code": "en",
        "language_name": "English (English)"
    }, {
        "language_code": "ru",
        "language_name": "Russian (Test)"
    }]
}"#;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub current_language_code: Option<String>,
    pub current_language_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub language_code: Option<String>,
    pub language_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    #[serde(default, deserialize_with = "crate::path_de::optional_objects")]
    pub header: Option<Vec<Header>>,
    #[serde(default, deserialize_with = "crate::path_de::optional_objects")]
    pub details: Option<Vec<Detail>>,
}

/// Whether `Header` and `Detail` fields may be absent or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    #[default]
    Lenient,
    /// every record field must be present and non-null
    Strict,
}

pub struct LanguageSchemas {
    pub header: RecordSchema,
    pub detail: RecordSchema,
    pub root: RecordSchema,
}

/// Built once per record type from a `Record` whose shape the schema already
/// guarantees, so conversion cannot fail.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Self;
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMAS
// ————————————————————————————————————————————————————————————————————————————

static LENIENT: Lazy<LanguageSchemas> = Lazy::new(|| LanguageSchemas::build(Strictness::Lenient));
static STRICT: Lazy<LanguageSchemas> = Lazy::new(|| LanguageSchemas::build(Strictness::Strict));

impl LanguageSchemas {
    pub fn get(strictness: Strictness) -> &'static LanguageSchemas {
        match strictness {
            Strictness::Lenient => &LENIENT,
            Strictness::Strict => &STRICT,
        }
    }

    fn build(strictness: Strictness) -> Self {
        let string = |name: &str| {
            let field = Field::new(name, Kind::String);
            match strictness {
                Strictness::Lenient => field,
                Strictness::Strict => field.required(),
            }
        };
        let header = RecordSchema::new("Header")
            .field(string("current_language_code"))
            .field(string("current_language_name"));
        let detail = RecordSchema::new("Detail")
            .field(string("language_code"))
            .field(string("language_name"));
        let root = RecordSchema::new("Root")
            .optional("header", Kind::record_array(header.clone()))
            .optional("details", Kind::record_array(detail.clone()));
        Self { header, detail, root }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSION
// ————————————————————————————————————————————————————————————————————————————

fn owned(record: &Record, name: &str) -> Option<String> {
    record.str(name).map(str::to_owned)
}

impl FromRecord for Header {
    fn from_record(record: &Record) -> Self {
        Header {
            current_language_code: owned(record, "current_language_code"),
            current_language_name: owned(record, "current_language_name"),
        }
    }
}

impl FromRecord for Detail {
    fn from_record(record: &Record) -> Self {
        Detail {
            language_code: owned(record, "language_code"),
            language_name: owned(record, "language_name"),
        }
    }
}

impl FromRecord for Root {
    fn from_record(record: &Record) -> Self {
        fn all<T: FromRecord>(records: &[Record]) -> Vec<T> {
            records.iter().map(T::from_record).collect()
        }
        Root {
            header: record.records("header").map(all::<Header>),
            details: record.records("details").map(all::<Detail>),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

pub fn decode_root(text: &str) -> Result<Root, DecodeError> {
    decode_root_with(text, Strictness::Lenient)
}

pub fn decode_root_with(text: &str, strictness: Strictness) -> Result<Root, DecodeError> {
    let value = serde_json::from_str::<Value>(text)?;
    decode_root_value(&value, strictness)
}

pub fn decode_root_value(value: &Value, strictness: Strictness) -> Result<Root, DecodeError> {
    let record = decode(value, &LanguageSchemas::get(strictness).root)?;
    let root = Root::from_record(&record);
    tracing::debug!(
        header = ?root.header.as_ref().map(Vec::len),
        details = ?root.details.as_ref().map(Vec::len),
        ?strictness,
        "decoded root"
    );
    Ok(root)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::JsonKind;
    use serde_json::json;

    fn header(code: &str, name: &str) -> Header {
        Header { current_language_code: Some(code.into()), current_language_name: Some(name.into()) }
    }

    fn detail(code: &str, name: &str) -> Detail {
        Detail { language_code: Some(code.into()), language_name: Some(name.into()) }
    }

    #[test]
    fn sample_document_decodes() {
        let root = decode_root(SAMPLE).unwrap();
        assert_eq!(root.header, Some(vec![header("ru", "Russian (Test)")]));
        assert_eq!(
            root.details,
            Some(vec![detail("en", "English (English)"), detail("ru", "Russian (Test)")])
        );
    }

    #[test]
    fn compact_document_decodes_verbatim() {
        let src = r#"{"header":[{"current_language_code":"ru","current_language_name":"Russian (Test)"}],"details":[{"language_code":"en","language_name":"English (English)"},{"language_code":"ru","language_name":"Russian (Test)"}]}"#;
        assert_eq!(decode_root(src).unwrap(), decode_root(SAMPLE).unwrap());
    }

    #[test]
    fn null_language_code_is_absent_not_empty() {
        let root = decode_root(r#"{"details":[{"language_code":null,"language_name":"English"}]}"#).unwrap();
        let details = root.details.unwrap();
        let d = &details[0];
        assert_eq!(d.language_code, None);
        assert_eq!(d.language_name.as_deref(), Some("English"));
    }

    #[test]
    fn missing_header_differs_from_empty_header() {
        let missing = decode_root(r#"{"details":[]}"#).unwrap();
        assert_eq!(missing.header, None);
        assert_eq!(missing.details, Some(vec![]));

        let empty = decode_root(r#"{"header":[],"details":[]}"#).unwrap();
        assert_eq!(empty.header, Some(vec![]));

        let null = decode_root(r#"{"header":null}"#).unwrap();
        assert_eq!(null.header, None);
        assert_eq!(null.details, None);
    }

    #[test]
    fn non_object_detail_mismatch_names_index() {
        let err = decode_root(r#"{"details":[{"language_code":"en"},7]}"#).unwrap_err();
        match err {
            DecodeError::TypeMismatch { path, expected, actual } => {
                assert_eq!(path.to_string(), "details[1]");
                assert_eq!(expected, JsonKind::Object);
                assert_eq!(actual, JsonKind::Number);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_string_is_array_mismatch() {
        let err = decode_root(r#"{"header":"not-an-array","details":[]}"#).unwrap_err();
        match err {
            DecodeError::TypeMismatch { path, expected, actual } => {
                assert_eq!(path.to_string(), "header");
                assert_eq!(expected, JsonKind::Array);
                assert_eq!(actual, JsonKind::String);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extra_keys_are_ignored() {
        let src = r#"{"version":2,"header":[{"current_language_code":"de","flag":"🇩🇪"}]}"#;
        let root = decode_root(src).unwrap();
        let header = root.header.unwrap();
        assert_eq!(header[0].current_language_code.as_deref(), Some("de"));
    }

    #[test]
    fn malformed_text_is_parse_error() {
        assert!(matches!(decode_root(r#"{"header": ["#), Err(DecodeError::Parse(_))));
    }

    #[test]
    fn strict_mode_requires_record_fields() {
        let src = r#"{"header":[{"current_language_code":"ru","current_language_name":"Russian"}],
                     "details":[{"language_code":"en"}]}"#;
        assert!(decode_root_with(src, Strictness::Lenient).is_ok());
        let err = decode_root_with(src, Strictness::Strict).unwrap_err();
        assert!(matches!(&err, DecodeError::MissingField { .. }));
        assert_eq!(err.path().unwrap().to_string(), "details[0].language_name");
    }

    #[test]
    fn strict_mode_keeps_top_level_arrays_optional() {
        assert_eq!(decode_root_with("{}", Strictness::Strict).unwrap(), Root::default());
    }

    #[test]
    fn decode_root_value_matches_text_path() {
        let v = json!({ "header": [{ "current_language_code": "ru" }] });
        let from_value = decode_root_value(&v, Strictness::Lenient).unwrap();
        assert_eq!(from_value, decode_root(&v.to_string()).unwrap());
    }

    #[test]
    fn schemas_are_shared_statics() {
        let a = LanguageSchemas::get(Strictness::Strict) as *const _;
        let b = LanguageSchemas::get(Strictness::Strict) as *const _;
        assert_eq!(a, b);
        assert!(LanguageSchemas::get(Strictness::Strict).detail.fields.iter().all(|f| f.required));
        assert!(LanguageSchemas::get(Strictness::Lenient).header.fields.iter().all(|f| !f.required));
    }
}
