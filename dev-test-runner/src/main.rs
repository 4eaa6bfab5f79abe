//! Runs both decoders over `fixtures/`.
//!
//! - `ok_*.json`: the schema decoder and the derive path must both succeed and agree.
//! - `err_*.json`: both must fail; a sibling `.path` file pins the error location.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use json_records::{decode_root, path_de, DecodeError, Root};

fn check_ok(source: &str) -> Result<(), String> {
    let schema = decode_root(source).map_err(|e| format!("schema decoder: {e}"))?;
    let derived = path_de::from_str_with_path::<Root>(source).map_err(|e| format!("derive path: {e}"))?;
    if schema != derived {
        return Err(format!("decoders disagree:\n  schema:  {schema:?}\n  derived: {derived:?}"));
    }
    Ok(())
}

/// Structured location of a failure from either decoder.
fn location(error: &DecodeError) -> Option<String> {
    match error {
        DecodeError::Deserialize { path, .. } => Some(path.clone()),
        other => other.path().map(|p| p.to_string()),
    }
}

fn check_err(source: &str, expected_path: Option<String>) -> Result<(), String> {
    let schema = match decode_root(source) {
        Ok(root) => return Err(format!("schema decoder: expected failure, decoded {root:?}")),
        Err(error) => error,
    };
    let derived = match path_de::from_str_with_path::<Root>(source) {
        Ok(root) => return Err(format!("derive path: expected failure, decoded {root:?}")),
        Err(error) => error,
    };
    let Some(expected) = expected_path else { return Ok(()) };
    for (decoder, error) in [("schema decoder", &schema), ("derive path", &derived)] {
        if location(error).as_deref() != Some(expected.as_str()) {
            return Err(format!("{decoder}: expected error at {expected}, got: {error}"));
        }
    }
    Ok(())
}

fn expected_path(fixture: &Path) -> Option<String> {
    let source = std::fs::read_to_string(fixture.with_extension("path")).ok()?;
    source.lines().next().map(|l| l.trim().to_string())
}

fn run_fixture(fixture: &Path) -> Result<(), String> {
    let source = std::fs::read_to_string(fixture).map_err(|e| format!("read failed: {e}"))?;
    let name = fixture.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name.starts_with("ok_") {
        check_ok(&source)
    } else if name.starts_with("err_") {
        check_err(&source, expected_path(fixture))
    } else {
        Err("fixture name must start with ok_ or err_".into())
    }
}

fn main() -> ExitCode {
    let dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("fixtures"));
    let pattern = format!("{}/*.json", dir.display());
    let fixtures: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(error) => {
            eprintln!("bad fixture pattern {pattern}: {error}");
            return ExitCode::FAILURE;
        }
    };
    if fixtures.is_empty() {
        eprintln!("no fixtures under {}", dir.display());
        return ExitCode::FAILURE;
    }

    let mut failed = 0;
    for fixture in &fixtures {
        match run_fixture(fixture) {
            Ok(()) => eprintln!("{} {}", "✅".green(), fixture.display()),
            Err(reason) => {
                failed += 1;
                eprintln!("{} {}: {reason}", "❌".red(), fixture.display());
            }
        }
    }
    eprintln!("{} passed, {} failed", fixtures.len() - failed, failed);
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
