//! Optimal Guide Finder - CRISPR guide selection
//!
//! Command-line entry point: parses arguments, sets up the output directory
//! and logging, then hands over to the run driver.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use optimal_guide_finder::app::{self, GenomeSource, RunConfig};
use optimal_guide_finder::logging::init_logging;
use optimal_guide_finder::{PurposeMode, RuleSetOneOracle, RunParams, ThreadCount};

#[derive(Parser)]
#[command(
    name = "optimal_guide_finder",
    version,
    about = "Find CRISPR guides in target genes and rank them by genome-wide off-target binding"
)]
struct Cli {
    /// Target genes FASTA (or guides, with --purpose g)
    #[arg(short = 't', long = "targets")]
    targets: PathBuf,

    /// Genome FASTA file(s)
    #[arg(
        short = 'g',
        long = "genome",
        num_args = 1..,
        required_unless_present = "genome_artifact",
        conflicts_with = "genome_artifact"
    )]
    genome: Vec<PathBuf>,

    /// Doubled genome written by an earlier run, used instead of --genome
    #[arg(long = "genome-artifact")]
    genome_artifact: Option<PathBuf>,

    /// Guides kept per gene by the on-target filter in interference mode [default: 10]
    #[arg(short = 'a', long = "azimuth-cutoff")]
    cutoff: Option<usize>,

    /// Output directory
    #[arg(short = 'o', long = "output", default_value = "output")]
    output: PathBuf,

    /// Purpose: i (interference), g (binding strength only), d (all guides) [default: d]
    #[arg(short = 'p', long = "purpose")]
    purpose: Option<PurposeMode>,

    /// Worker threads [default: all cores]
    #[arg(long = "threads")]
    threads: Option<usize>,

    /// Copy number per genome file, or one value for all files [default: 1]
    #[arg(short = 'c', long = "copy-number", num_args = 1..)]
    copy_numbers: Vec<usize>,

    /// JSON file with scanning, search and binding-model parameters
    #[arg(long = "params")]
    params: Option<PathBuf>,

    /// Only log warnings and errors to stderr
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let mut params = match &self.params {
            Some(path) => app::load_params(path)?,
            None => RunParams::default(),
        };
        if let Some(purpose) = self.purpose {
            params.purpose = purpose;
        }
        if let Some(cutoff) = self.cutoff {
            params.cutoff = cutoff;
        }
        if self.threads.is_some() {
            params.thread_count = ThreadCount::from(self.threads);
        }

        let genome = match self.genome_artifact {
            Some(path) => GenomeSource::Artifact(path),
            None => GenomeSource::Files {
                paths: self.genome,
                copy_numbers: self.copy_numbers,
            },
        };

        Ok(RunConfig {
            targets: self.targets,
            genome,
            output_dir: self.output,
            params,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create directory: {}", cli.output.display()))?;
    let log_path = init_logging(&cli.output, quiet)?;

    info!("=== Optimal Guide Finder {} ===", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());

    let result = cli
        .into_config()
        .and_then(|config| app::run(&config, &RuleSetOneOracle));
    match result {
        Ok(outcome) => {
            info!("Report: {}", outcome.report.display());
            info!("=== Finished ===");
            Ok(())
        }
        Err(err) => {
            error!("{err:#}");
            Err(err)
        }
    }
}
