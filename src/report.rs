//! Report output: the ranked guide table and the effective run configuration

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::GuideScoreRecord;
use crate::error::{Error, Result};

pub const REPORT_FILE_NAME: &str = "output.csv";
pub const RUN_CONFIG_FILE_NAME: &str = "run_config.json";
pub const GENOME_ARTIFACT_FILE_NAME: &str = "Run_Genome";

/// Sibling path a file is staged under before being renamed into place
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to a staging file, then rename it over `path`, so
/// readers never observe a partially written file.
fn write_atomically<F>(path: &Path, contents: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let staging = staging_path(path);
    let file = File::create(&staging).map_err(|e| Error::output_write(&staging, e))?;
    let mut writer = BufWriter::new(file);

    let written = contents(&mut writer).and_then(|_| writer.flush());
    drop(writer);
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(Error::output_write(path, e));
    }

    fs::rename(&staging, path).map_err(|e| Error::output_write(path, e))
}

/// Write the ranked records as `output.csv` in `output_dir`
pub fn write_report(records: &[GuideScoreRecord], output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(REPORT_FILE_NAME);
    write_atomically(&path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        if records.is_empty() {
            writer.write_record(REPORT_COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()
    })?;
    Ok(path)
}

/// Header row, also written when there are no records
pub const REPORT_COLUMNS: [&str; 10] = [
    "Gene/ORF Name",
    "Guide Sequence",
    "PAM",
    "Strand",
    "Position",
    "On-Target Score",
    "Exact Matches",
    "Off-Target Matches",
    "Entropy Score",
    "Rank in Target Gene",
];

/// Write any serializable configuration as pretty JSON to `run_config.json`
pub fn write_run_config<T: Serialize>(config: &T, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(RUN_CONFIG_FILE_NAME);
    write_atomically(&path, |out| {
        serde_json::to_writer_pretty(&mut *out, config)?;
        writeln!(out)
    })?;
    Ok(path)
}
