//! Workspace umbrella crate for Dataset Fingerprinting (DSFP).
//!
//! This crate stitches the component crates into the batch pipelines the
//! `dsfp` binary runs: load every participant under a data directory, load
//! the reference set, then check, compare, analyze, or build a submission.
//! Every pipeline takes an explicit [`DsfpConfig`]; nothing is global.

pub mod collab;
pub mod config;
pub mod report;

pub use canonical::{fingerprint, ContentHash, Fingerprint, FINGERPRINT_VERSION};
pub use index::{
    analyze_usage, GoldenEntry, IndexError, ReferenceIndex, UsageFrequency, UsedEntries,
};
pub use ingest::{
    discover_participants, load_collection, sort_file, write_collection, Collection, IngestError,
    LoadConfig, LoadReport, ParticipantDir,
};
pub use matcher::{
    check_against_reference, cluster_matrix, ClusterStrategy, ClusterSummary, ConformanceCheck,
    ConformanceStatus, ConformanceSummary, DuplicateCluster, MatchError, OwnComparison,
    ParticipantAnalysis, SimilarityMatrix,
};
pub use selector::{
    select_golden, select_unique, verify_overlap, OverlapVerification, Selection, SelectorError,
    UniqueSelection,
};

pub use crate::collab::{
    normalize_jsonl_name, sync_participants, sync_reference, CollabError, DatasetFetcher,
    DatasetLocator, FetchOutcome, ManifestMetadataService, MetadataService, MirrorFetcher,
    ParticipantInfo, SyncOptions, SyncSummary,
};
pub use crate::config::{ConfigLoadError, DsfpConfig};

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, info_span, warn};

/// Identifier given to the reference collection.
pub const REFERENCE_ID: &str = "reference";

/// Number of most-used reference positions kept by [`analyze`].
pub const DEFAULT_TOP_POSITIONS: usize = 20;

/// Errors that can occur while running a pipeline.
#[derive(Debug)]
pub enum PipelineError {
    Ingest(IngestError),
    Index(IndexError),
    Match(MatchError),
    Selector(SelectorError),
    Config(ConfigLoadError),
    Collab(CollabError),
    /// Nothing under the data directory could be loaded.
    NoParticipants(PathBuf),
    /// A requested participant id was not loaded.
    UnknownParticipant(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "ingest failure: {err}"),
            PipelineError::Index(err) => write!(f, "usage analysis failure: {err}"),
            PipelineError::Match(err) => write!(f, "matching failure: {err}"),
            PipelineError::Selector(err) => write!(f, "selection failure: {err}"),
            PipelineError::Config(err) => write!(f, "configuration failure: {err}"),
            PipelineError::Collab(err) => write!(f, "collaborator failure: {err}"),
            PipelineError::NoParticipants(dir) => {
                write!(f, "no participant datasets under {}", dir.display())
            }
            PipelineError::UnknownParticipant(id) => write!(f, "participant {id} not loaded"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Index(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::Selector(err) => Some(err),
            PipelineError::Config(err) => Some(err),
            PipelineError::Collab(err) => Some(err),
            PipelineError::NoParticipants(_) | PipelineError::UnknownParticipant(_) => None,
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

impl From<SelectorError> for PipelineError {
    fn from(value: SelectorError) -> Self {
        PipelineError::Selector(value)
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

impl From<CollabError> for PipelineError {
    fn from(value: CollabError) -> Self {
        PipelineError::Collab(value)
    }
}

/// Participants loaded from a data directory.
#[derive(Debug, Clone, Default)]
pub struct ParticipantSet {
    /// Loaded collections, in id order.
    pub collections: Vec<Collection>,
    /// Participant directories without a data file.
    pub skipped: Vec<String>,
    /// `(id, error)` for data files that exist but could not be read.
    pub failed: Vec<(String, String)>,
    /// Malformed lines dropped across all loaded files.
    pub dropped_lines: usize,
}

impl ParticipantSet {
    pub fn ids(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id() == id)
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            loaded: self.collections.len(),
            skipped: self.skipped.clone(),
            failed: self.failed.clone(),
            dropped_lines: self.dropped_lines,
        }
    }
}

/// The participant bookkeeping every pipeline reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub dropped_lines: usize,
}

/// Load every participant under `data_dir`.
///
/// A directory without a data file is skipped and a file that cannot be read
/// is recorded as failed; neither stops the run. Only a missing or unreadable
/// `data_dir` is an error.
pub fn load_participants(
    data_dir: &Path,
    cfg: &DsfpConfig,
) -> Result<ParticipantSet, PipelineError> {
    let start = Instant::now();
    let dirs = discover_participants(data_dir, &cfg.discovery_config())?;
    let load_cfg = cfg.load_config();

    let mut set = ParticipantSet::default();
    for dir in dirs {
        if !dir.has_data {
            info!(participant = %dir.id, "participant_skipped");
            set.skipped.push(dir.id);
            continue;
        }
        match load_collection(&dir.data_file, &dir.id, &load_cfg) {
            Ok(loaded) => {
                set.dropped_lines += loaded.report.dropped_lines;
                set.collections.push(loaded.collection);
            }
            Err(err) if err.is_not_found() => {
                info!(participant = %dir.id, "participant_skipped");
                set.skipped.push(dir.id);
            }
            Err(err) => {
                warn!(participant = %dir.id, error = %err, "participant_failed");
                set.failed.push((dir.id, err.to_string()));
            }
        }
    }

    info!(
        loaded = set.collections.len(),
        skipped = set.skipped.len(),
        failed = set.failed.len(),
        dropped_lines = set.dropped_lines,
        elapsed_micros = start.elapsed().as_micros(),
        "participants_loaded"
    );
    Ok(set)
}

/// Load the reference set. It is never truncated by `max_rows`.
pub fn load_reference(path: &Path) -> Result<Collection, PipelineError> {
    let loaded = load_collection(path, REFERENCE_ID, &LoadConfig::default())?;
    Ok(loaded.collection)
}

fn require_participants(set: &ParticipantSet, data_dir: &Path) -> Result<(), PipelineError> {
    if set.collections.is_empty() {
        return Err(PipelineError::NoParticipants(data_dir.to_path_buf()));
    }
    Ok(())
}

/// Result of [`check`].
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub participants: LoadSummary,
    pub reference_len: usize,
    pub duplicate_threshold: usize,
    pub checks: Vec<ConformanceCheck>,
    pub summary: ConformanceSummary,
}

/// Classify every participant against the reference set.
pub fn check(
    data_dir: &Path,
    reference_path: &Path,
    cfg: &DsfpConfig,
) -> Result<CheckOutcome, PipelineError> {
    let _span = info_span!("pipeline.check").entered();
    let reference = load_reference(reference_path)?;
    let participants = load_participants(data_dir, cfg)?;
    let threshold = cfg.matcher.duplicate_threshold;

    let checks: Vec<ConformanceCheck> = participants
        .collections
        .iter()
        .map(|c| check_against_reference(c, &reference, threshold))
        .collect();
    let summary = ConformanceSummary::from_checks(&checks);

    Ok(CheckOutcome {
        participants: participants.summary(),
        reference_len: reference.len(),
        duplicate_threshold: threshold,
        checks,
        summary,
    })
}

/// Result of [`compare`].
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub participants: LoadSummary,
    pub reference_len: usize,
    pub duplicate_threshold: usize,
    pub strategy: ClusterStrategy,
    pub conformance: Vec<ConformanceCheck>,
    pub matrix: SimilarityMatrix,
    pub clusters: Vec<DuplicateCluster>,
    pub summary: ClusterSummary,
}

impl CompareOutcome {
    /// Participants holding records that are not in the reference set.
    pub fn outside_reference(&self) -> Vec<&str> {
        self.conformance
            .iter()
            .filter(|c| !c.within_reference())
            .map(|c| c.id.as_str())
            .collect()
    }
}

/// Check participants against the reference, then against each other.
pub fn compare(
    data_dir: &Path,
    reference_path: &Path,
    cfg: &DsfpConfig,
) -> Result<CompareOutcome, PipelineError> {
    let _span = info_span!("pipeline.compare").entered();
    let reference = load_reference(reference_path)?;
    let participants = load_participants(data_dir, cfg)?;
    require_participants(&participants, data_dir)?;

    let match_cfg = cfg.match_config();
    match_cfg.validate()?;
    let threshold = match_cfg.duplicate_threshold;

    let conformance = participants
        .collections
        .iter()
        .map(|c| check_against_reference(c, &reference, threshold))
        .collect();
    let matrix = SimilarityMatrix::build(&participants.collections, match_cfg.use_parallel)?;
    let clusters = cluster_matrix(&matrix, threshold, match_cfg.strategy);
    let summary = ClusterSummary::from_clusters(&clusters);

    Ok(CompareOutcome {
        participants: participants.summary(),
        reference_len: reference.len(),
        duplicate_threshold: threshold,
        strategy: match_cfg.strategy,
        conformance,
        matrix,
        clusters,
        summary,
    })
}

/// Which participants [`analyze`] and [`golden`] look at.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Participants whose usage is analyzed. `None` means every loaded
    /// participant that is not listed in `own`.
    pub analyzed: Option<Vec<String>>,
    /// Participants compared against the analyzed set.
    pub own: Vec<String>,
}

fn analyzed_subset(set: &ParticipantSet, options: &AnalyzeOptions) -> Vec<Collection> {
    let chosen: Vec<&Collection> = match &options.analyzed {
        Some(ids) => {
            let mut chosen = Vec::with_capacity(ids.len());
            for id in ids {
                match set.get(id) {
                    Some(c) => chosen.push(c),
                    // Listed but absent on disk: the usage denominator only
                    // counts what was actually loaded.
                    None => warn!(participant = %id, "analyzed_participant_missing"),
                }
            }
            chosen
        }
        None => set
            .collections
            .iter()
            .filter(|c| !options.own.iter().any(|own| own == c.id()))
            .collect(),
    };
    chosen.into_iter().cloned().collect()
}

/// Result of [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub participants: LoadSummary,
    pub reference_len: usize,
    pub analyzed_count: usize,
    pub analysis: ParticipantAnalysis,
    pub most_used: Vec<GoldenEntry>,
    pub min_usage_fraction: f64,
    pub min_count: usize,
    pub golden: Vec<GoldenEntry>,
    pub own: Vec<OwnComparison>,
}

/// Profile the analyzed participants and find the golden entries.
pub fn analyze(
    data_dir: &Path,
    reference_path: &Path,
    cfg: &DsfpConfig,
    options: &AnalyzeOptions,
) -> Result<AnalyzeOutcome, PipelineError> {
    let _span = info_span!("pipeline.analyze").entered();
    let reference = load_reference(reference_path)?;
    let participants = load_participants(data_dir, cfg)?;
    let analyzed = analyzed_subset(&participants, options);

    let index = ReferenceIndex::build(&reference);
    let analysis = matcher::analyze_participants(&analyzed, &index);
    let usage = analyze_usage(&index, &analyzed);
    let fraction = cfg.golden.min_usage_fraction;
    let min_count = usage.min_count(fraction)?;
    let golden = usage.golden_entries(fraction)?;

    let mut own = Vec::with_capacity(options.own.len());
    for id in &options.own {
        let collection = participants
            .get(id)
            .ok_or_else(|| PipelineError::UnknownParticipant(id.clone()))?;
        own.push(matcher::compare_own(collection, &analysis, &index));
    }

    Ok(AnalyzeOutcome {
        participants: participants.summary(),
        reference_len: reference.len(),
        analyzed_count: usage.analyzed_count(),
        most_used: usage.most_used(DEFAULT_TOP_POSITIONS),
        analysis,
        min_usage_fraction: fraction,
        min_count,
        golden,
        own,
    })
}

/// Result of [`golden`].
#[derive(Debug, Clone)]
pub struct GoldenOutcome {
    pub participants: LoadSummary,
    pub reference_len: usize,
    pub analyzed_count: usize,
    pub min_count: usize,
    pub golden_available: usize,
    pub used_entries: usize,
    pub duplicate_threshold: usize,
    pub selection: Selection,
    pub verification: OverlapVerification,
    pub output: PathBuf,
}

/// Build a golden-first submission and write it to `output`.
///
/// Usage is counted over the analyzed participants; the used-entry set and
/// the final overlap check cover every loaded participant.
pub fn golden(
    data_dir: &Path,
    reference_path: &Path,
    output: &Path,
    cfg: &DsfpConfig,
    options: &AnalyzeOptions,
) -> Result<GoldenOutcome, PipelineError> {
    let _span = info_span!("pipeline.golden").entered();
    let reference = load_reference(reference_path)?;
    let participants = load_participants(data_dir, cfg)?;
    let analyzed = analyzed_subset(&participants, options);

    let index = ReferenceIndex::build(&reference);
    let usage = analyze_usage(&index, &analyzed);
    let fraction = cfg.golden.min_usage_fraction;
    let min_count = usage.min_count(fraction)?;
    let golden_entries = usage.golden_entries(fraction)?;
    let used = UsedEntries::from_collections(&participants.collections);

    let selector_cfg = cfg.selector_config();
    let selection = select_golden(&reference, &golden_entries, &used, &selector_cfg)?;
    write_collection(output, &selection.records)?;

    let chosen = Collection::from_records(output.display().to_string(), selection.records.clone());
    let verification = verify_overlap(
        &chosen,
        &participants.collections,
        selector_cfg.duplicate_threshold,
    );

    Ok(GoldenOutcome {
        participants: participants.summary(),
        reference_len: reference.len(),
        analyzed_count: usage.analyzed_count(),
        min_count,
        golden_available: golden_entries.len(),
        used_entries: used.len(),
        duplicate_threshold: selector_cfg.duplicate_threshold,
        selection,
        verification,
        output: output.to_path_buf(),
    })
}

/// Result of [`unique`].
#[derive(Debug, Clone)]
pub struct UniqueOutcome {
    pub participants: LoadSummary,
    pub reference_len: usize,
    pub duplicate_threshold: usize,
    pub selection: UniqueSelection,
    pub verification: OverlapVerification,
    pub output: PathBuf,
}

/// Build a submission that stays clear of every participant and write it.
pub fn unique(
    data_dir: &Path,
    reference_path: &Path,
    output: &Path,
    cfg: &DsfpConfig,
) -> Result<UniqueOutcome, PipelineError> {
    let _span = info_span!("pipeline.unique").entered();
    let reference = load_reference(reference_path)?;
    let participants = load_participants(data_dir, cfg)?;

    let unique_cfg = cfg.unique_config();
    let selection = select_unique(&reference, &participants.collections, &unique_cfg)?;
    write_collection(output, &selection.records)?;

    let chosen = Collection::from_records(output.display().to_string(), selection.records.clone());
    let verification = verify_overlap(
        &chosen,
        &participants.collections,
        unique_cfg.duplicate_threshold,
    );

    Ok(UniqueOutcome {
        participants: participants.summary(),
        reference_len: reference.len(),
        duplicate_threshold: unique_cfg.duplicate_threshold,
        selection,
        verification,
        output: output.to_path_buf(),
    })
}

/// Result of [`sort_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSummary {
    pub total: usize,
    /// `(id, records)` for every rewritten file.
    pub sorted: Vec<(String, usize)>,
    /// Data files with no records; left as they are.
    pub empty: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Sort every participant's data file by fingerprint, in place.
///
/// Sorting is strict: a file with one malformed line is reported as failed
/// and left untouched.
pub fn sort_all(data_dir: &Path, cfg: &DsfpConfig) -> Result<SortSummary, PipelineError> {
    let _span = info_span!("pipeline.sort").entered();
    let dirs = discover_participants(data_dir, &cfg.discovery_config())?;

    let mut summary = SortSummary {
        total: dirs.len(),
        ..Default::default()
    };
    for dir in dirs {
        if !dir.has_data {
            info!(participant = %dir.id, "participant_skipped");
            summary.skipped.push(dir.id);
            continue;
        }
        match sort_file(&dir.data_file) {
            Ok(0) => summary.empty.push(dir.id),
            Ok(n) => summary.sorted.push((dir.id, n)),
            Err(err) => {
                warn!(participant = %dir.id, error = %err, "sort_failure");
                summary.failed.push((dir.id, err.to_string()));
            }
        }
    }

    info!(
        total = summary.total,
        sorted = summary.sorted.len(),
        failed = summary.failed.len(),
        skipped = summary.skipped.len(),
        "sort_complete"
    );
    Ok(summary)
}
