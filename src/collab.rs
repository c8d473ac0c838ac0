//! External collaborators: participant metadata and dataset retrieval.
//!
//! The scoring network and the dataset host sit behind two traits,
//! [`MetadataService`] and [`DatasetFetcher`]. The offline implementations
//! here read a YAML manifest and copy from a local mirror laid out as
//! `<mirror>/<namespace>/<commit>/*.jsonl`.
//!
//! ## Manifest format
//!
//! ```yaml
//! reference:
//!   namespace: "org/eval-set"
//!   commit: "9f1c2e"
//! participants:
//!   - uid: 17
//!     hotkey: "5F3sa2TJ"
//!     owner: "5CiPPseX"
//!     dataset:
//!       namespace: "someone/dataset"
//!       commit: "a1b2c3"
//!   - uid: 18
//!     hotkey: "5HGjWAeF"
//!     owner: "5CiPPseX"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ingest::DEFAULT_DATA_FILE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised by collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollabError {
    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("dataset not available: {0}")]
    Unavailable(String),

    #[error("i/o error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The fetch finished but left no dataset file behind.
    #[error("no jsonl file in {0}")]
    MissingData(PathBuf),
}

impl CollabError {
    fn io(path: &Path, err: std::io::Error) -> Self {
        CollabError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub uid: u64,
    pub hotkey: String,
    /// Controlling account; several participants can share one.
    pub owner: String,
}

/// Where a dataset revision lives on the dataset host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLocator {
    pub namespace: String,
    pub commit: String,
}

impl std::fmt::Display for DatasetLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.namespace, self.commit)
    }
}

/// Source of participant metadata.
pub trait MetadataService {
    fn participants(&self) -> Result<Vec<ParticipantInfo>, CollabError>;

    /// `Ok(None)` when the participant has not published a dataset.
    fn dataset_for(&self, participant: &ParticipantInfo)
        -> Result<Option<DatasetLocator>, CollabError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded,
    /// The target already held a dataset and `force` was off.
    AlreadyPresent,
}

/// Materializes a dataset revision as `<target_dir>/data.jsonl`.
pub trait DatasetFetcher {
    fn fetch(
        &self,
        locator: &DatasetLocator,
        target_dir: &Path,
        force: bool,
    ) -> Result<FetchOutcome, CollabError>;
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    #[serde(flatten)]
    info: ParticipantInfo,
    #[serde(default)]
    dataset: Option<DatasetLocator>,
}

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    #[serde(default)]
    reference: Option<DatasetLocator>,
    #[serde(default)]
    participants: Vec<ManifestEntry>,
}

/// [`MetadataService`] backed by a YAML (or JSON) manifest file.
#[derive(Debug, Clone)]
pub struct ManifestMetadataService {
    manifest: Manifest,
}

impl ManifestMetadataService {
    pub fn from_file(path: &Path) -> Result<Self, CollabError> {
        let text = fs::read_to_string(path).map_err(|err| CollabError::io(path, err))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, CollabError> {
        let manifest: Manifest =
            serde_yaml::from_str(text).map_err(|err| CollabError::Manifest(err.to_string()))?;
        let mut uids: Vec<u64> = manifest.participants.iter().map(|e| e.info.uid).collect();
        uids.sort_unstable();
        if let Some(w) = uids.windows(2).find(|w| w[0] == w[1]) {
            return Err(CollabError::Manifest(format!("duplicate uid {}", w[0])));
        }
        Ok(Self { manifest })
    }

    /// Locator of the reference (evaluation) dataset, if the manifest names one.
    pub fn reference(&self) -> Option<&DatasetLocator> {
        self.manifest.reference.as_ref()
    }
}

impl MetadataService for ManifestMetadataService {
    fn participants(&self) -> Result<Vec<ParticipantInfo>, CollabError> {
        Ok(self
            .manifest
            .participants
            .iter()
            .map(|e| e.info.clone())
            .collect())
    }

    fn dataset_for(
        &self,
        participant: &ParticipantInfo,
    ) -> Result<Option<DatasetLocator>, CollabError> {
        Ok(self
            .manifest
            .participants
            .iter()
            .find(|e| e.info.uid == participant.uid)
            .and_then(|e| e.dataset.clone()))
    }
}

/// [`DatasetFetcher`] copying from a local mirror directory.
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    root: PathBuf,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn source_dir(&self, locator: &DatasetLocator) -> PathBuf {
        self.root.join(&locator.namespace).join(&locator.commit)
    }
}

impl DatasetFetcher for MirrorFetcher {
    fn fetch(
        &self,
        locator: &DatasetLocator,
        target_dir: &Path,
        force: bool,
    ) -> Result<FetchOutcome, CollabError> {
        let target = target_dir.join(DEFAULT_DATA_FILE);
        if target.is_file() && !force {
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let source = self.source_dir(locator);
        if !source.is_dir() {
            return Err(CollabError::Unavailable(locator.to_string()));
        }
        let files = jsonl_files(&source)?;
        if files.is_empty() {
            return Err(CollabError::MissingData(source));
        }

        fs::create_dir_all(target_dir).map_err(|err| CollabError::io(target_dir, err))?;
        // Leftovers from an earlier commit would win the rename below.
        for stale in jsonl_files(target_dir)? {
            fs::remove_file(&stale).map_err(|err| CollabError::io(&stale, err))?;
        }
        for file in &files {
            if let Some(name) = file.file_name() {
                let dest = target_dir.join(name);
                fs::copy(file, &dest).map_err(|err| CollabError::io(&dest, err))?;
            }
        }
        normalize_jsonl_name(target_dir)?
            .ok_or_else(|| CollabError::MissingData(target_dir.to_path_buf()))?;
        Ok(FetchOutcome::Downloaded)
    }
}

fn jsonl_files(dir: &Path) -> Result<Vec<PathBuf>, CollabError> {
    let entries = fs::read_dir(dir).map_err(|err| CollabError::io(dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| CollabError::io(dir, err))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Make sure `dir` holds its dataset as `data.jsonl`.
///
/// An existing `data.jsonl` is kept. Otherwise the first `*.jsonl` file by
/// name is renamed. Returns the final path, or `None` when there is no
/// JSONL file at all.
pub fn normalize_jsonl_name(dir: &Path) -> Result<Option<PathBuf>, CollabError> {
    let target = dir.join(DEFAULT_DATA_FILE);
    if target.is_file() {
        return Ok(Some(target));
    }
    let Some(first) = jsonl_files(dir)?.into_iter().next() else {
        return Ok(None);
    };
    fs::rename(&first, &target).map_err(|err| CollabError::io(&first, err))?;
    info!(from = %first.display(), to = %target.display(), "dataset_renamed");
    Ok(Some(target))
}

/// Which participants to sync and where.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Only participants controlled by this owner.
    pub owner: Option<String>,
    pub force: bool,
    /// Directory name prefix, e.g. `miner_` for `miner_17`.
    pub prefix: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            owner: None,
            force: false,
            prefix: ingest::DEFAULT_PARTICIPANT_PREFIX.to_string(),
        }
    }
}

/// Per-run counts from [`sync_participants`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Participants considered after the owner filter.
    pub total: usize,
    /// Fetched now or already on disk.
    pub downloaded: usize,
    pub failed: usize,
    /// No published dataset.
    pub skipped: usize,
    /// `(uid, error)` for every failure.
    pub failures: Vec<(u64, String)>,
}

/// Fetch every participant's dataset into `<out_dir>/<prefix><uid>/`.
///
/// Only listing the participants can fail the call. A failure for one
/// participant is logged, counted and the batch moves on.
pub fn sync_participants(
    metadata: &dyn MetadataService,
    fetcher: &dyn DatasetFetcher,
    out_dir: &Path,
    options: &SyncOptions,
) -> Result<SyncSummary, CollabError> {
    let start = Instant::now();
    let participants: Vec<ParticipantInfo> = metadata
        .participants()?
        .into_iter()
        .filter(|p| options.owner.as_ref().map_or(true, |owner| &p.owner == owner))
        .collect();

    let mut summary = SyncSummary {
        total: participants.len(),
        ..Default::default()
    };

    for participant in &participants {
        let uid = participant.uid;
        let locator = match metadata.dataset_for(participant) {
            Ok(Some(locator)) => locator,
            Ok(None) => {
                warn!(uid, "participant_skipped");
                summary.skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(uid, error = %err, "sync_failure");
                summary.failed += 1;
                summary.failures.push((uid, err.to_string()));
                continue;
            }
        };

        let dir = out_dir.join(format!("{}{}", options.prefix, uid));
        match fetcher.fetch(&locator, &dir, options.force) {
            Ok(outcome) => {
                info!(uid, dataset = %locator, outcome = ?outcome, "sync_success");
                summary.downloaded += 1;
            }
            Err(err) => {
                warn!(uid, dataset = %locator, error = %err, "sync_failure");
                summary.failed += 1;
                summary.failures.push((uid, err.to_string()));
            }
        }
    }

    info!(
        total = summary.total,
        downloaded = summary.downloaded,
        failed = summary.failed,
        skipped = summary.skipped,
        elapsed_micros = start.elapsed().as_micros(),
        "sync_complete"
    );
    Ok(summary)
}

/// Fetch the reference dataset into `dir` and normalize its file name.
pub fn sync_reference(
    fetcher: &dyn DatasetFetcher,
    locator: &DatasetLocator,
    dir: &Path,
    force: bool,
) -> Result<FetchOutcome, CollabError> {
    let outcome = fetcher.fetch(locator, dir, force)?;
    info!(dataset = %locator, outcome = ?outcome, "reference_synced");
    Ok(outcome)
}
