use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dsfp::collab::{sync_participants, sync_reference, ManifestMetadataService, MirrorFetcher};
use dsfp::config::LoggingYamlConfig;
use dsfp::{report, AnalyzeOptions, ClusterStrategy, DsfpConfig, SyncOptions};

#[derive(Parser, Debug)]
#[command(
    name = "dsfp",
    version,
    about = "Duplicate detection and golden-entry selection for JSONL datasets"
)]
struct Cli {
    /// YAML configuration file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Directory holding one `miner_<uid>` directory per participant.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Reference (evaluation) dataset.
    #[arg(long, default_value = "data/eval_data/data.jsonl")]
    reference: PathBuf,

    /// Keep only the first N records of each participant dataset.
    #[arg(long)]
    max_rows: Option<usize>,

    /// Shared-record count above which two datasets are duplicates.
    #[arg(long)]
    threshold: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Greedy,
    Transitive,
}

impl From<StrategyArg> for ClusterStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Greedy => ClusterStrategy::Greedy,
            StrategyArg::Transitive => ClusterStrategy::Transitive,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check participants against the reference and against each other.
    Compare {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Compute the similarity matrix on all cores.
        #[arg(long)]
        parallel: bool,
    },
    /// Classify how much of each participant is copied from the reference.
    Check {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Profile participants and list golden reference entries.
    Analyze {
        #[command(flatten)]
        data: DataArgs,
        /// Participants to analyze (`miner_17` or `17`); default is all but `--own`.
        #[arg(long, value_delimiter = ',')]
        analyzed: Vec<String>,
        /// Your own participants, compared against the analyzed set.
        #[arg(long, value_delimiter = ',')]
        own: Vec<String>,
        #[arg(long)]
        min_usage_fraction: Option<f64>,
    },
    /// Build a submission that favours golden entries.
    Golden {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value = "data/golden_dataset/data.jsonl")]
        output: PathBuf,
        #[arg(long, value_delimiter = ',')]
        analyzed: Vec<String>,
        #[arg(long)]
        target_size: Option<usize>,
        #[arg(long)]
        min_usage_fraction: Option<f64>,
        #[arg(long)]
        max_reused_golden: Option<usize>,
        /// Allow the random fill to pick records participants already use.
        #[arg(long)]
        no_unique_check: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Build a submission from records no participant uses.
    Unique {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value = "data/unique_dataset/data.jsonl")]
        output: PathBuf,
        #[arg(long)]
        target_size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Sort every participant data file by record fingerprint, in place.
    Sort {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Fetch participant datasets listed in a manifest from a local mirror.
    Sync {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        mirror: PathBuf,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Only participants controlled by this owner.
        #[arg(long)]
        owner: Option<String>,
        /// Re-fetch datasets that are already present.
        #[arg(long)]
        force: bool,
        /// Also fetch the manifest's reference set into this directory.
        #[arg(long)]
        reference_dir: Option<PathBuf>,
    },
}

fn init_tracing(logging: &LoggingYamlConfig, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_data_args(cfg: &mut DsfpConfig, data: &DataArgs) {
    if let Some(max_rows) = data.max_rows {
        cfg.ingest.max_rows = Some(max_rows);
    }
    if let Some(threshold) = data.threshold {
        cfg.matcher.duplicate_threshold = threshold;
    }
}

/// Accept `17` as shorthand for `<prefix>17`.
fn participant_ids(prefix: &str, raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|id| {
            if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                format!("{prefix}{id}")
            } else {
                id.clone()
            }
        })
        .collect()
}

fn analyze_options(cfg: &DsfpConfig, analyzed: &[String], own: &[String]) -> AnalyzeOptions {
    let prefix = &cfg.ingest.participant_prefix;
    AnalyzeOptions {
        analyzed: (!analyzed.is_empty()).then(|| participant_ids(prefix, analyzed)),
        own: participant_ids(prefix, own),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => DsfpConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DsfpConfig::default(),
    };
    init_tracing(&cfg.logging, cli.json_logs || cfg.logging.json);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Compare {
            data,
            strategy,
            parallel,
        } => {
            apply_data_args(&mut cfg, &data);
            if let Some(strategy) = strategy {
                cfg.matcher.strategy = strategy.into();
            }
            cfg.matcher.use_parallel |= parallel;
            cfg.validate()?;
            let outcome = dsfp::compare(&data.data_dir, &data.reference, &cfg)?;
            report::write_compare(&mut out, &outcome)?;
        }
        Command::Check { data } => {
            apply_data_args(&mut cfg, &data);
            cfg.validate()?;
            let outcome = dsfp::check(&data.data_dir, &data.reference, &cfg)?;
            report::write_check(&mut out, &outcome)?;
        }
        Command::Analyze {
            data,
            analyzed,
            own,
            min_usage_fraction,
        } => {
            apply_data_args(&mut cfg, &data);
            if let Some(fraction) = min_usage_fraction {
                cfg.golden.min_usage_fraction = fraction;
            }
            cfg.validate()?;
            let options = analyze_options(&cfg, &analyzed, &own);
            let outcome = dsfp::analyze(&data.data_dir, &data.reference, &cfg, &options)?;
            report::write_analyze(&mut out, &outcome)?;
        }
        Command::Golden {
            data,
            output,
            analyzed,
            target_size,
            min_usage_fraction,
            max_reused_golden,
            no_unique_check,
            seed,
        } => {
            apply_data_args(&mut cfg, &data);
            if let Some(target_size) = target_size {
                cfg.golden.target_size = target_size;
            }
            if let Some(fraction) = min_usage_fraction {
                cfg.golden.min_usage_fraction = fraction;
            }
            if let Some(cap) = max_reused_golden {
                cfg.golden.max_reused_golden = cap;
            }
            if no_unique_check {
                cfg.golden.ensure_unique = false;
            }
            if seed.is_some() {
                cfg.golden.seed = seed;
            }
            cfg.validate()?;
            let options = analyze_options(&cfg, &analyzed, &[]);
            let outcome =
                dsfp::golden(&data.data_dir, &data.reference, &output, &cfg, &options)?;
            report::write_golden(&mut out, &outcome)?;
        }
        Command::Unique {
            data,
            output,
            target_size,
            seed,
        } => {
            apply_data_args(&mut cfg, &data);
            if let Some(target_size) = target_size {
                cfg.golden.target_size = target_size;
            }
            if seed.is_some() {
                cfg.golden.seed = seed;
            }
            cfg.validate()?;
            let outcome = dsfp::unique(&data.data_dir, &data.reference, &output, &cfg)?;
            report::write_unique(&mut out, &outcome)?;
        }
        Command::Sort { data_dir } => {
            let summary = dsfp::sort_all(&data_dir, &cfg)?;
            report::write_sort(&mut out, &summary)?;
        }
        Command::Sync {
            manifest,
            mirror,
            data_dir,
            owner,
            force,
            reference_dir,
        } => {
            let service = ManifestMetadataService::from_file(&manifest)
                .with_context(|| format!("loading manifest {}", manifest.display()))?;
            let fetcher = MirrorFetcher::new(mirror);

            if let Some(dir) = reference_dir {
                let Some(locator) = service.reference() else {
                    bail!("manifest {} names no reference dataset", manifest.display());
                };
                sync_reference(&fetcher, locator, &dir, force)?;
                writeln!(out, "Reference {locator} ready in {}", dir.display())?;
            }

            let options = SyncOptions {
                owner,
                force,
                prefix: cfg.ingest.participant_prefix.clone(),
            };
            let summary = sync_participants(&service, &fetcher, &data_dir, &options)?;
            report::write_sync(&mut out, &summary)?;
        }
    }

    out.flush()?;
    Ok(())
}
