//! Participant directory discovery.
//!
//! A data directory holds one subdirectory per participant, named
//! `<prefix><uid>` (for example `miner_17`), each expected to contain the
//! dataset file. Discovery never reads the datasets themselves.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::error::IngestError;

/// One participant submission directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantDir {
    /// Directory name, used as the participant id.
    pub id: String,
    /// Numeric suffix after the prefix, when it parses as one.
    pub uid: Option<u64>,
    pub dir: PathBuf,
    pub data_file: PathBuf,
    /// Whether `data_file` exists at discovery time.
    pub has_data: bool,
}

/// List participant directories under `root`, sorted by id.
///
/// Entries that are not directories or do not carry the configured prefix
/// are ignored. A missing `root` is reported as [`IngestError::NotFound`].
pub fn discover_participants(
    root: &Path,
    cfg: &DiscoveryConfig,
) -> Result<Vec<ParticipantDir>, IngestError> {
    cfg.validate()?;

    let entries = fs::read_dir(root).map_err(|err| IngestError::io(root, err))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| IngestError::io(root, err))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(cfg.prefix.as_str()) else {
            continue;
        };

        let uid = suffix.parse::<u64>().ok();
        let data_file = dir.join(&cfg.data_file);
        let has_data = data_file.is_file();
        found.push(ParticipantDir {
            id: name,
            uid,
            dir,
            data_file,
            has_data,
        });
    }

    found.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(root = %root.display(), participants = found.len(), "discovery_complete");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_prefixed_dirs_sorted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for name in ["miner_2", "miner_10", "other", "miner_x"] {
            fs::create_dir(tmp.path().join(name)).expect("mkdir");
        }
        fs::write(tmp.path().join("miner_2/data.jsonl"), "{}\n").expect("write");
        fs::write(tmp.path().join("miner_file"), "").expect("write");

        let found = discover_participants(tmp.path(), &DiscoveryConfig::default()).expect("ok");
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["miner_10", "miner_2", "miner_x"]);

        let two = &found[1];
        assert_eq!(two.uid, Some(2));
        assert!(two.has_data);
        assert!(!found[0].has_data);
        assert_eq!(found[2].uid, None);
    }

    #[test]
    fn missing_root_is_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = discover_participants(&tmp.path().join("nope"), &DiscoveryConfig::default())
            .expect_err("missing root");
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_config_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = DiscoveryConfig {
            prefix: String::new(),
            ..Default::default()
        };
        let err = discover_participants(tmp.path(), &cfg).expect_err("bad config");
        assert!(matches!(err, IngestError::InvalidConfig(_)));
    }
}
