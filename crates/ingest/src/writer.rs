//! JSONL output: writing selections and re-sorting files in place.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use canonical::fingerprint;
use serde_json::Value;
use tracing::info;

use crate::error::IngestError;
use crate::types::Record;

/// Write records as JSONL: one record per line, UTF-8, newline-terminated.
///
/// Parent directories are created as needed. An existing file is replaced.
pub fn write_collection(path: &Path, records: &[Record]) -> Result<(), IngestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| IngestError::io(parent, err))?;
        }
    }

    let file = File::create(path).map_err(|err| IngestError::io(path, err))?;
    let mut out = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut out, record).map_err(|err| IngestError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        out.write_all(b"\n").map_err(|err| IngestError::io(path, err))?;
    }
    out.flush().map_err(|err| IngestError::io(path, err))?;

    info!(path = %path.display(), records = records.len(), "write_success");
    Ok(())
}

/// Rewrite a JSONL file with its records ordered by fingerprint.
///
/// Parsing is strict: a single malformed line aborts the operation and the
/// file is left untouched. Blank lines are discarded. Returns the number of
/// records written; an empty file is left as is and reports `0`.
pub fn sort_file(path: &Path) -> Result<usize, IngestError> {
    let content = fs::read_to_string(path).map_err(|err| IngestError::io(path, err))?;

    let mut keyed = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(trimmed).map_err(|err| IngestError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
                message: err.to_string(),
            })?;
        keyed.push((fingerprint(&value), value));
    }

    if keyed.is_empty() {
        return Ok(0);
    }

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    let records: Vec<Record> = keyed.into_iter().map(|(_, value)| value).collect();
    write_collection(path, &records)?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_one_record_per_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out/nested/data.jsonl");
        write_collection(&path, &[json!({"a": 1}), json!({"b": "ü"})]).expect("write");

        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text, "{\"a\":1}\n{\"b\":\"ü\"}\n");
    }

    #[test]
    fn sort_orders_by_fingerprint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.jsonl");
        fs::write(&path, "{\"k\":\"c\"}\n\n{\"k\":\"a\"}\n{\"k\":\"b\"}\n").expect("seed");

        assert_eq!(sort_file(&path).expect("sort"), 3);
        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text, "{\"k\":\"a\"}\n{\"k\":\"b\"}\n{\"k\":\"c\"}\n");
    }

    #[test]
    fn sort_is_strict_and_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.jsonl");
        let original = "{\"k\":2}\nnot json\n{\"k\":1}\n";
        fs::write(&path, original).expect("seed");

        let err = sort_file(&path).expect_err("malformed line must fail");
        assert!(matches!(err, IngestError::MalformedLine { line: 2, .. }));
        assert_eq!(fs::read_to_string(&path).expect("read"), original);
    }

    #[test]
    fn sort_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = sort_file(&dir.path().join("missing.jsonl")).expect_err("missing");
        assert!(err.is_not_found());
    }

    #[test]
    fn sort_empty_file_reports_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.jsonl");
        fs::write(&path, "").expect("seed");
        assert_eq!(sort_file(&path).expect("sort"), 0);
    }
}
