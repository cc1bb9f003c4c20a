//! Run driver: loads inputs, runs the pipeline and writes every output file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;

use crate::analysis::{
    read_genome, read_genome_artifact, read_targets, resolve_copy_numbers, run_pipeline,
    write_genome_artifact, EfficiencyOracle, GenomeSequence, RunParams,
};
use crate::logging::LogSink;
use crate::report::{write_report, write_run_config, GENOME_ARTIFACT_FILE_NAME};

/// Where the genome comes from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenomeSource {
    /// FASTA files, each with its copy number
    Files {
        paths: Vec<PathBuf>,
        copy_numbers: Vec<usize>,
    },
    /// A doubled genome written by an earlier run
    Artifact(PathBuf),
}

/// Everything one run needs; serialized as `run_config.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub targets: PathBuf,
    pub genome: GenomeSource,
    pub output_dir: PathBuf,
    pub params: RunParams,
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: PathBuf,
    pub genome_artifact: PathBuf,
    pub records: usize,
    pub warnings: usize,
}

/// Load run parameters from a JSON file; missing fields take defaults
pub fn load_params(path: &Path) -> Result<RunParams> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter file: {}", path.display()))?;
    let params: RunParams = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse parameter file: {}", path.display()))?;
    params
        .validate()
        .with_context(|| format!("invalid parameter file: {}", path.display()))?;
    Ok(params)
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if let GenomeSource::Files {
            paths,
            copy_numbers,
        } = &self.genome
        {
            if paths.is_empty() {
                bail!("at least one genome file is required");
            }
            resolve_copy_numbers(copy_numbers, paths.len())?;
        }
        Ok(())
    }

    fn load_genome(&self) -> Result<GenomeSequence> {
        match &self.genome {
            GenomeSource::Files {
                paths,
                copy_numbers,
            } => {
                let genome = read_genome(paths, copy_numbers)?;
                info!(
                    "Genome: {} file(s), {} bp per strand after copy numbers",
                    paths.len(),
                    genome.forward_len()
                );
                Ok(genome)
            }
            GenomeSource::Artifact(path) => {
                let genome = read_genome_artifact(path)?;
                info!(
                    "Genome artifact: {} ({} bp per strand)",
                    path.display(),
                    genome.forward_len()
                );
                Ok(genome)
            }
        }
    }
}

/// Execute a configured run. The output directory must already exist.
pub fn run(config: &RunConfig, oracle: &dyn EfficiencyOracle) -> Result<RunOutcome> {
    let start = Instant::now();
    config.validate()?;
    let params = &config.params;

    info!("Purpose: {}", params.purpose.description());
    info!(
        "Guide length {}, PAM {}, up to {} mismatches",
        params.scan.guide_length, params.scan.pam, params.search.max_mismatches
    );

    let targets = read_targets(&config.targets)?;
    info!(
        "Targets: {} sequence(s) from {}",
        targets.len(),
        config.targets.display()
    );

    let genome = config.load_genome()?;
    let genome_artifact = config.output_dir.join(GENOME_ARTIFACT_FILE_NAME);
    write_genome_artifact(&genome, &genome_artifact)?;

    let sink = LogSink::new();
    let records = run_pipeline(&targets, &genome, oracle, params, &sink);

    let report = write_report(&records, &config.output_dir)?;
    write_run_config(config, &config.output_dir)?;

    info!(
        "Wrote {} guide(s) to {} in {:.1}s ({} warning(s))",
        records.len(),
        report.display(),
        start.elapsed().as_secs_f64(),
        sink.warning_count()
    );

    Ok(RunOutcome {
        report,
        genome_artifact,
        records: records.len(),
        warnings: sink.warning_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{OracleError, PurposeMode};
    use tempfile::TempDir;

    struct FlatOracle;

    impl EfficiencyOracle for FlatOracle {
        fn score(&self, windows: &[&str]) -> Vec<Result<f64, OracleError>> {
            windows.iter().map(|_| Ok(0.5)).collect()
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn config(dir: &Path, genome: GenomeSource) -> RunConfig {
        let params = RunParams {
            purpose: PurposeMode::BindingStrength,
            ..RunParams::default()
        };
        RunConfig {
            targets: write(dir, "guides.fa", ">g1\nGACGCATAAAGATGAGACGC\n"),
            genome,
            output_dir: dir.to_path_buf(),
            params,
        }
    }

    #[test]
    fn test_load_params_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "params.json",
            r#"{"cutoff": 3, "search": {"max_mismatches": 1}}"#,
        );
        let params = load_params(&path).unwrap();
        assert_eq!(params.cutoff, 3);
        assert_eq!(params.search.max_mismatches, 1);
        assert!(params.search.require_pam);
        assert_eq!(params.scan.guide_length, 20);
    }

    #[test]
    fn test_load_params_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let bad_json = write(dir.path(), "bad.json", "{ cutoff: ");
        assert!(load_params(&bad_json).is_err());

        let bad_pam = write(dir.path(), "pam.json", r#"{"scan": {"pam": "NXG"}}"#);
        let err = load_params(&bad_pam).unwrap_err();
        assert!(format!("{err:#}").contains("invalid character"));

        assert!(load_params(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_copy_number_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.fa", ">a\nACGT\n");
        let b = write(dir.path(), "b.fa", ">b\nACGT\n");
        let cfg = config(
            dir.path(),
            GenomeSource::Files {
                paths: vec![a, b],
                copy_numbers: vec![1, 2, 3],
            },
        );
        assert!(cfg.validate().is_err());
        assert!(run(&cfg, &FlatOracle).is_err());
    }

    #[test]
    fn test_run_writes_outputs_and_artifact_reloads() {
        let dir = TempDir::new().unwrap();
        let genome = write(
            dir.path(),
            "genome.fa",
            ">chr1\nTTGACGCATAAAGATGAGACGCTGGTTTT\n",
        );
        let cfg = config(
            dir.path(),
            GenomeSource::Files {
                paths: vec![genome],
                copy_numbers: vec![2],
            },
        );

        let outcome = run(&cfg, &FlatOracle).unwrap();
        assert_eq!(outcome.records, 1);
        assert!(outcome.report.exists());
        assert!(dir.path().join("run_config.json").exists());

        let report = fs::read_to_string(&outcome.report).unwrap();
        assert!(report.contains("g1,GACGCATAAAGATGAGACGC,,+,0,,2,2,"));

        let reuse = config(
            dir.path(),
            GenomeSource::Artifact(outcome.genome_artifact.clone()),
        );
        let again = run(&reuse, &FlatOracle).unwrap();
        assert_eq!(again.records, 1);
        assert_eq!(fs::read_to_string(&again.report).unwrap(), report);
    }
}
