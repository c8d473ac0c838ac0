//! Dataset Ingest Layer
//!
//! This is where datasets enter the pipeline. A dataset is a JSONL file: one
//! JSON record per line. We read it leniently, fingerprint every record, and
//! hand back a [`Collection`] that downstream stages compare by fingerprint.
//!
//! ## What we do here
//!
//! - **Load leniently** - Malformed lines (bad JSON, bad UTF-8) are dropped and
//!   counted. Blank lines are skipped. Nothing aborts the load except I/O.
//! - **Cap rows** - `max_rows` keeps the first N records, the way scoring
//!   only ever looks at a fixed prefix.
//! - **Write and sort** - [`write_collection`] emits JSONL, [`sort_file`]
//!   reorders a file by fingerprint in place.
//! - **Discover participants** - [`discover_participants`] lists the
//!   `miner_<uid>` directories under a data root.
//!
//! ## Example
//!
//! ```
//! use ingest::{parse_jsonl, LoadConfig};
//!
//! let input = "{\"text\":\"a\"}\nnot json\n\n{\"text\":\"b\"}\n";
//! let loaded = parse_jsonl(input.as_bytes(), "miner_1", &LoadConfig::default()).unwrap();
//!
//! assert_eq!(loaded.collection.len(), 2);
//! assert_eq!(loaded.report.dropped_lines, 1);
//! assert_eq!(loaded.report.blank_lines, 1);
//! ```
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn, Level};

mod config;
mod discovery;
mod error;
mod types;
mod writer;

pub use crate::config::{
    ConfigError, DiscoveryConfig, LoadConfig, DEFAULT_DATA_FILE, DEFAULT_PARTICIPANT_PREFIX,
};
pub use crate::discovery::{discover_participants, ParticipantDir};
pub use crate::error::IngestError;
pub use crate::types::{Collection, LoadReport, LoadedCollection, Record};
pub use crate::writer::{sort_file, write_collection};

/// Parse JSONL from any buffered reader into a collection.
///
/// Lines are read as raw bytes so one line of invalid UTF-8 is dropped like
/// any other malformed line instead of failing the whole read.
pub fn parse_jsonl<R: BufRead>(
    mut reader: R,
    id: &str,
    cfg: &LoadConfig,
) -> Result<LoadedCollection, IngestError> {
    cfg.validate()?;

    let mut report = LoadReport::default();
    let mut records: Vec<Value> = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| IngestError::io(Path::new(id), err))?;
        if read == 0 {
            break;
        }
        report.total_lines += 1;

        let Ok(line) = std::str::from_utf8(&buf) else {
            report.dropped_lines += 1;
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            report.blank_lines += 1;
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => records.push(value),
            Err(_) => report.dropped_lines += 1,
        }
    }

    if let Some(max) = cfg.max_rows {
        if records.len() > max {
            report.truncated_records = records.len() - max;
            records.truncate(max);
        }
    }

    Ok(LoadedCollection {
        collection: Collection::from_records(id, records),
        report,
    })
}

/// Load a JSONL file from disk.
///
/// A missing file is [`IngestError::NotFound`]; callers iterating over
/// participants usually treat that as a skip.
pub fn load_collection(
    path: &Path,
    id: &str,
    cfg: &LoadConfig,
) -> Result<LoadedCollection, IngestError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "ingest.load", id = %id, path = %path.display());
    let _guard = span.enter();

    let result = File::open(path)
        .map_err(|err| IngestError::io(path, err))
        .and_then(|file| parse_jsonl(BufReader::new(file), id, cfg));

    let elapsed_micros = start.elapsed().as_micros();
    match result {
        Ok(loaded) => {
            if loaded.report.has_drops() {
                warn!(
                    dropped_lines = loaded.report.dropped_lines,
                    "malformed_lines_dropped"
                );
            }
            info!(
                records = loaded.collection.len(),
                distinct = loaded.collection.distinct_len(),
                blank_lines = loaded.report.blank_lines,
                truncated_records = loaded.report.truncated_records,
                elapsed_micros,
                "load_success"
            );
            Ok(loaded)
        }
        Err(err) => {
            warn!(error = %err, elapsed_micros, "load_failure");
            Err(err)
        }
    }
}
