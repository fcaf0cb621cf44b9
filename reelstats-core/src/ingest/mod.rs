//! Ingestion layer for scraped record dumps
//!
//! Reads the files produced by the scraping side (a JSON array, or one
//! JSON object per line) and turns them into normalized [`VideoRecord`]s.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌──────────────┐     ┌────────────┐
//! │  Record dumps   │ ──► │ load_values  │ ──► │  normalize   │ ──► │ analytics  │
//! │ (.json/.jsonl)  │     │ (loose JSON) │     │ (alias table │     │            │
//! └─────────────────┘     └──────────────┘     │  + dedup)    │     └────────────┘
//!                                              └──────────────┘
//! ```
//!
//! Malformed lines are skipped and counted, never fatal. The only error
//! this layer returns is failing to read a file at all.
//!
//! [`VideoRecord`]: crate::types::VideoRecord

pub mod normalize;

pub use normalize::{coerce, normalize, parse_count, parse_timestamp, Normalized};

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Counters describing how a source was read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Files read
    pub files_read: usize,
    /// Non-blank lines seen in JSON-Lines input (0 for JSON arrays)
    pub lines_total: usize,
    /// Non-blank lines that did not parse as JSON
    pub lines_skipped: usize,
    /// JSON values handed to the normalizer
    pub values_loaded: usize,
}

impl LoadReport {
    fn absorb(&mut self, other: LoadReport) {
        self.files_read += other.files_read;
        self.lines_total += other.lines_total;
        self.lines_skipped += other.lines_skipped;
        self.values_loaded += other.values_loaded;
    }
}

/// Loose values read from one or more sources.
#[derive(Debug, Default)]
pub struct LoadedValues {
    pub values: Vec<Value>,
    pub report: LoadReport,
}

/// Normalized records plus the counters from both stages.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub normalized: Normalized,
    pub report: LoadReport,
}

/// Parse the text of a record dump.
///
/// A document starting with `[` is first tried as a single JSON array;
/// anything else (or an array that fails to parse) is read as JSON-Lines.
pub fn parse_values(text: &str) -> LoadedValues {
    let mut report = LoadReport::default();

    if text.trim().is_empty() {
        return LoadedValues {
            values: Vec::new(),
            report,
        };
    }

    if text.trim_start().starts_with('[') {
        if let Ok(Value::Array(values)) = serde_json::from_str::<Value>(text) {
            report.values_loaded = values.len();
            return LoadedValues { values, report };
        }
        tracing::debug!("Input looks like a JSON array but did not parse, trying JSON-Lines");
    }

    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.lines_total += 1;
        match serde_json::from_str::<Value>(line) {
            Ok(value) => values.push(value),
            Err(e) => {
                report.lines_skipped += 1;
                tracing::debug!(line = idx + 1, error = %e, "Skipping unparseable line");
            }
        }
    }

    report.values_loaded = values.len();
    LoadedValues { values, report }
}

/// Read and parse one record dump.
pub fn load_values(path: &Path) -> Result<LoadedValues> {
    let bytes = std::fs::read(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let mut loaded = parse_values(&text);
    loaded.report.files_read = 1;

    if loaded.report.lines_skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped = loaded.report.lines_skipped,
            total = loaded.report.lines_total,
            "Skipped malformed lines"
        );
    }
    tracing::info!(
        path = %path.display(),
        values = loaded.report.values_loaded,
        "Loaded record dump"
    );

    Ok(loaded)
}

/// Load several dumps and normalize them as one collection.
///
/// Deduplication spans files: a video seen in an earlier file wins.
pub fn load_records(paths: &[PathBuf]) -> Result<LoadedRecords> {
    let mut values = Vec::new();
    let mut report = LoadReport::default();

    for path in paths {
        let loaded = load_values(path)?;
        report.absorb(loaded.report);
        values.extend(loaded.values);
    }

    let normalized = normalize(&values);
    Ok(LoadedRecords { normalized, report })
}

/// Expand a glob pattern into the matching files, sorted by path.
pub fn discover_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|e| Error::Input(format!("invalid glob pattern {:?}: {}", pattern, e)))?;

    let mut files: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

/// Resolve a CLI input argument: a plain path, or a glob pattern.
///
/// A glob that matches nothing is an error, so a typo does not silently
/// produce an empty analysis.
pub fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>> {
    if !input.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(input)]);
    }

    let files = discover_files(input)?;
    if files.is_empty() {
        return Err(Error::Input(format!("no files match {:?}", input)));
    }
    Ok(files)
}
