//! Minimal CLI: load documents → decode → (text | json), or print the schema.
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::error::DecodeError;
use crate::languages::{self, LanguageSchemas, Root, Strictness};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode language-listing JSON documents into typed records
#[derive(Parser, Debug)]
#[command(name = "json-records", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode documents and print their records
    Decode(DecodeOut),
    /// print the JSON-schema-ish description of a record
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// Literal paths or quoted glob patterns. The built-in sample is decoded when omitted.
    #[arg(long, short, num_args = 1..)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// require every header/detail field to be present and non-null
    #[arg(long)]
    strict: bool,

    /// decode through the serde derive path instead of the schema decoder
    #[arg(long, conflicts_with = "strict")]
    derive: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    /// describe the strict variant of the schema
    #[arg(long)]
    strict: bool,

    /// which record to describe
    #[arg(long, value_enum, default_value_t = RecordName::Root)]
    record: RecordName,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RecordName {
    Root,
    Header,
    Detail,
}

/// One document plus where it came from (`file.json`, `file.ndjson:3`, ...).
/// Text that is not JSON stays here as that document's parse failure.
#[derive(Debug)]
struct Document {
    origin: String,
    parsed: Result<Value, DecodeError>,
}

#[derive(Debug)]
struct Outcome {
    origin: String,
    result: Result<Root, DecodeError>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        if self.input.is_empty() {
            return self.expand("<sample>", languages::SAMPLE);
        }
        let mut documents = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {origin}"))?;
            documents.extend(self.expand(&origin, &source)?);
        }
        tracing::info!(documents = documents.len(), "loaded input");
        Ok(documents)
    }

    /// Parse one source text and apply NDJSON splitting, JSON pointer and jq.
    fn expand(&self, origin: &str, source: &str) -> Result<Vec<Document>> {
        let raw: Vec<(String, &str)> = if self.ndjson {
            source
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| (format!("{origin}:{}", i + 1), line))
                .collect()
        } else {
            vec![(origin.to_string(), source)]
        };

        let mut documents = Vec::new();
        for (origin, text) in raw {
            let value = match serde_json::from_str::<Value>(text) {
                Ok(value) => value,
                Err(error) => {
                    documents.push(Document { origin, parsed: Err(DecodeError::Parse(error)) });
                    continue;
                }
            };
            let value = match self.json_pointer.as_deref() {
                None => value,
                Some(pointer) => value
                    .pointer(pointer)
                    .cloned()
                    .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {origin}"))?,
            };
            match self.jq_expr.as_deref() {
                None => documents.push(Document { origin, parsed: Ok(value) }),
                Some(jq_expr) => {
                    let outputs = crate::jq_exec::run_jaq(jq_expr, &value)
                        .with_context(|| format!("failed to apply jq expression ({origin})"))?;
                    let single = outputs.len() == 1;
                    for (i, value) in outputs.into_iter().enumerate() {
                        let origin = if single {
                            origin.clone()
                        } else {
                            format!("{origin}#{i}")
                        };
                        documents.push(Document { origin, parsed: Ok(value) });
                    }
                }
            }
        }
        Ok(documents)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Schema(target) => {
                let schemas = LanguageSchemas::get(strictness(target.strict));
                let schema = match target.record {
                    RecordName::Root => &schemas.root,
                    RecordName::Header => &schemas.header,
                    RecordName::Detail => &schemas.detail,
                };
                let schema_src = serde_json::to_string_pretty(&schema.describe())?;
                emit(target.out.as_ref(), &schema_src)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Decode(target) => {
                let documents = target.input_settings.load_documents()?;
                let outcomes = decode_documents(documents, strictness(target.strict), target.derive);

                let failed = report_failures(&outcomes);
                let rendered = match target.format {
                    Format::Text => render_text(&outcomes),
                    Format::Json => serde_json::to_string_pretty(&render_json(&outcomes))?,
                };
                emit(target.out.as_ref(), &rendered)?;

                if failed == 0 {
                    Ok(ExitCode::SUCCESS)
                } else {
                    eprintln!("{}", format!("{failed} of {} documents failed", outcomes.len()).red());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn strictness(strict: bool) -> Strictness {
    if strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    }
}

fn decode_value(value: &Value, strictness: Strictness, derive: bool) -> Result<Root, DecodeError> {
    if derive {
        crate::path_de::from_value_with_path::<Root>(value)
    } else {
        languages::decode_root_value(value, strictness)
    }
}

/// Decodes in parallel; outcomes keep the order of `documents`.
fn decode_documents(documents: Vec<Document>, strictness: Strictness, derive: bool) -> Vec<Outcome> {
    documents
        .into_par_iter()
        .map(|doc| Outcome {
            result: doc.parsed.and_then(|value| decode_value(&value, strictness, derive)),
            origin: doc.origin,
        })
        .collect()
}

fn report_failures(outcomes: &[Outcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        if let Err(error) = &outcome.result {
            failed += 1;
            tracing::warn!(origin = %outcome.origin, %error, "decode failed");
            eprintln!("{} {}: {error}", "❌".red(), outcome.origin);
        }
    }
    failed
}

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn render_text(outcomes: &[Outcome]) -> String {
    let mut s = String::new();
    for outcome in outcomes {
        let Ok(root) = &outcome.result else { continue };
        let _ = writeln!(s, "# {}", outcome.origin);
        for h in root.header.iter().flatten() {
            let _ = writeln!(s, "{h:?}");
            let _ = writeln!(s, "  current_language_code: {}", show(&h.current_language_code));
            let _ = writeln!(s, "  current_language_name: {}", show(&h.current_language_name));
        }
        for d in root.details.iter().flatten() {
            let _ = writeln!(s, "{d:?}");
            let _ = writeln!(s, "  language_code: {}", show(&d.language_code));
            let _ = writeln!(s, "  language_name: {}", show(&d.language_name));
        }
    }
    s
}

fn render_json(outcomes: &[Outcome]) -> Value {
    let entries = outcomes.iter().map(|outcome| match &outcome.result {
        Ok(root) => json!({ "source": outcome.origin, "root": root }),
        Err(error) => json!({
            "source": outcome.origin,
            "error": error.to_string(),
            "path": error.path().map(|p| p.to_string()),
        }),
    });
    Value::Array(entries.collect())
}

fn emit(out: Option<&PathBuf>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> InputSettings {
        InputSettings { ndjson: false, json_pointer: None, jq_expr: None, input: Vec::new() }
    }

    fn decode_lenient(documents: Vec<Document>) -> Vec<Outcome> {
        decode_documents(documents, Strictness::Lenient, false)
    }

    #[test]
    fn no_input_means_sample() {
        let docs = settings().load_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].origin, "<sample>");
        let outcomes = decode_documents(docs, Strictness::Strict, false);
        assert!(outcomes[0].result.is_ok());
    }

    #[test]
    fn ndjson_lines_become_documents() {
        let s = InputSettings { ndjson: true, ..settings() };
        let docs = s.expand("in.ndjson", "{\"header\":[]}\n\n{\"details\":[]}\n").unwrap();
        let origins: Vec<_> = docs.iter().map(|d| d.origin.as_str()).collect();
        assert_eq!(origins, ["in.ndjson:1", "in.ndjson:3"]);
    }

    #[test]
    fn json_pointer_selects_subdocument() {
        let s = InputSettings { json_pointer: Some("/data/0".into()), ..settings() };
        let docs = s.expand("x", r#"{"data":[{"header":[]}]}"#).unwrap();
        assert_eq!(docs[0].parsed.as_ref().ok(), Some(&json!({ "header": [] })));
        assert!(s.expand("x", r#"{"data":[]}"#).is_err());
    }

    #[test]
    fn malformed_line_fails_alone_and_in_place() {
        let s = InputSettings { ndjson: true, ..settings() };
        let docs = s.expand("in", "{\"header\":[]}\n{").unwrap();
        let outcomes = decode_lenient(docs);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].result.as_ref().unwrap().header, Some(vec![]));
        assert!(matches!(outcomes[1].result, Err(DecodeError::Parse(_))));
        assert_eq!(outcomes[1].origin, "in:2");

        assert_eq!(report_failures(&outcomes), 1);
        let out = render_json(&outcomes);
        assert_eq!(out[0]["root"]["header"], json!([]));
        assert!(out[1]["error"].as_str().unwrap().starts_with("malformed JSON"));
        assert!(render_text(&outcomes).contains("# in:1\n"));
    }

    #[test]
    fn malformed_file_is_one_failed_document() {
        let docs = settings().expand("broken.json", "{").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].origin, "broken.json");
        assert!(matches!(docs[0].parsed, Err(DecodeError::Parse(_))));
    }

    #[test]
    fn text_rendering_marks_absent_fields() {
        let docs = settings()
            .expand("x", r#"{"details":[{"language_code":"en","language_name":null}]}"#)
            .unwrap();
        let text = render_text(&decode_lenient(docs));
        assert!(text.contains("  language_code: en\n"));
        assert!(text.contains("  language_name: -\n"));
    }

    #[test]
    fn json_rendering_keeps_failures_in_place() {
        let s = InputSettings { ndjson: true, ..settings() };
        let docs = s.expand("in", "{\"header\":\"oops\"}\n{\"header\":[]}").unwrap();
        let outcomes = decode_lenient(docs);
        let out = render_json(&outcomes);
        assert_eq!(out[0]["path"], "header");
        assert_eq!(out[1]["root"]["header"], json!([]));
        assert_eq!(report_failures(&outcomes), 1);
    }

    #[test]
    fn derive_path_rejects_array_shaped_records() {
        let docs = settings().expand("x", r#"{"details":[["en","English"]]}"#).unwrap();
        let outcomes = decode_documents(docs, Strictness::Lenient, true);
        assert!(outcomes[0].result.is_err());
    }

    #[test]
    fn cli_parses_decode_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "json-records", "decode", "--strict", "--format", "json", "-i", "a.json", "b.json",
        ])
        .unwrap();
        match cli.cmd {
            Command::Decode(d) => {
                assert!(d.strict);
                assert_eq!(d.format, Format::Json);
                assert_eq!(d.input_settings.input, ["a.json", "b.json"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(CommandLineInterface::try_parse_from(["json-records", "decode", "--strict", "--derive"]).is_err());
    }

    #[test]
    fn schema_command_selects_record() {
        let cli = CommandLineInterface::try_parse_from(["json-records", "schema", "--record", "detail"]).unwrap();
        match cli.cmd {
            Command::Schema(s) => {
                assert_eq!(s.record, RecordName::Detail);
                assert!(!s.strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn literal_paths_pass_through_unresolved() {
        let paths = resolve_file_path_patterns(["does/not/exist.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("does/not/exist.json")]);
        assert!(resolve_file_path_patterns(["no-such-dir-*/x.json"]).is_err());
    }
}
