//! Encoding of the history document in the layout chart pages read.
//!
//! Two framings of the same JSON are supported: the bare document, and the
//! `window.BENCHMARK_DATA = ...` script form served next to the chart page.
//! Decoding accepts either, so older stores keep loading. Fields this version
//! does not know are carried in each record's extension map and written back.

use crate::consts::DATA_JS_PREFIX;
use crate::exceptions::BenchError;
use crate::fs::atomic_write_text;
use crate::models::BenchmarkData;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Js,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("js") => Format::Js,
            _ => Format::Json,
        }
    }
}

impl FromStr for Format {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "js" => Ok(Format::Js),
            "json" => Ok(Format::Json),
            other => Err(BenchError::InvalidInput(format!(
                "Unknown format '{}'. Expected 'js' or 'json'.",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Js => write!(f, "js"),
            Format::Json => write!(f, "json"),
        }
    }
}

pub fn encode(data: &BenchmarkData, format: Format) -> Result<String, BenchError> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(match format {
        Format::Js => format!("{}{}\n", DATA_JS_PREFIX, json),
        Format::Json => format!("{}\n", json),
    })
}

pub fn decode(text: &str) -> Result<BenchmarkData, BenchError> {
    serde_json::from_str(strip_script_wrapper(text)).map_err(|e| BenchError::Schema(e.to_string()))
}

pub fn export_file(data: &BenchmarkData, path: &Path, format: Format) -> Result<(), BenchError> {
    atomic_write_text(path, &encode(data, format)?)
}

pub fn import_file(path: &Path) -> Result<BenchmarkData, BenchError> {
    decode(&std::fs::read_to_string(path)?)
}

fn strip_script_wrapper(text: &str) -> &str {
    let trimmed = text.trim();
    let assignment = DATA_JS_PREFIX.trim_end().trim_end_matches('=').trim_end();

    let body = match trimmed.strip_prefix(assignment) {
        Some(rest) => {
            let rest = rest.trim_start();
            rest.strip_prefix('=').unwrap_or(rest)
        }
        None => trimmed,
    };

    body.trim().trim_end_matches(';').trim_end()
}

