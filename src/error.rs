use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

use crate::kind::JsonKind;

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Location inside a document, rendered as `details[1].language_code`.
/// The empty path is the document root and renders as `$`. Keys that would
/// read as path syntax are quoted in brackets: `meta["a.b"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(VecDeque<Segment>);

impl Path {
    pub fn root() -> Self { Self::default() }

    pub fn key(key: impl Into<String>) -> Self {
        let mut path = Self::root();
        path.0.push_back(Segment::Key(key.into()));
        path
    }

    pub fn is_root(&self) -> bool { self.0.is_empty() }

    fn prepend(&mut self, segment: Segment) { self.0.push_front(segment); }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if !is_plain_key(key) => {
                    write!(f, "[{}]", serde_json::Value::from(key.as_str()))?
                }
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['.', '[', ']', '"']) && key != "$"
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("type mismatch at {path}: expected {expected}, found {actual}")]
    TypeMismatch { path: Path, expected: JsonKind, actual: JsonKind },

    #[error("missing required field {path}")]
    MissingField { path: Path },

    /// Failure from the derive-based path (`crate::path_de`).
    #[error("at JSON path {path} → {message}")]
    Deserialize { path: String, message: String },
}

impl DecodeError {
    pub fn type_mismatch(path: Path, expected: JsonKind, actual: JsonKind) -> Self {
        DecodeError::TypeMismatch { path, expected, actual }
    }

    /// Qualify the error with the object key it was found under.
    pub fn within_key(self, key: &str) -> Self {
        self.prepend(Segment::Key(key.to_owned()))
    }

    /// Qualify the error with the array index it was found at.
    pub fn within_index(self, index: usize) -> Self {
        self.prepend(Segment::Index(index))
    }

    fn prepend(mut self, segment: Segment) -> Self {
        match &mut self {
            DecodeError::TypeMismatch { path, .. } | DecodeError::MissingField { path } => {
                path.prepend(segment);
            }
            DecodeError::Parse(_) | DecodeError::Deserialize { .. } => {}
        }
        self
    }

    /// Location of the failure, if the error carries a structured one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DecodeError::TypeMismatch { path, .. } | DecodeError::MissingField { path } => Some(path),
            DecodeError::Parse(_) | DecodeError::Deserialize { .. } => None,
        }
    }
}
