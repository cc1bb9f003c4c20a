//! FASTA input for targets and genomes, and the doubled-genome artifact

use bio::io::fasta;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use super::sequence::{GenomeSequence, NucleotideSequence, TargetGene};
use crate::error::{Error, Result};

/// Record id of the persisted doubled genome
pub const GENOME_ARTIFACT_ID: &str = "refgenome";
const GENOME_ARTIFACT_DESC: &str = "a reference background";

/// Parse every record of a FASTA stream. `source` is only used in errors.
pub fn parse_fasta_records<R: Read>(
    reader: R,
    source: &Path,
) -> Result<Vec<(String, NucleotideSequence)>> {
    let mut records = Vec::new();
    for result in fasta::Reader::new(reader).records() {
        let record = result.map_err(|e| Error::input_format(source, e))?;
        record
            .check()
            .map_err(|reason| Error::input_format(source, reason))?;
        records.push((record.id().to_string(), NucleotideSequence::new(record.seq())));
    }
    Ok(records)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::input_format(path, e))
}

/// Parse target genes. Names must be unique and at least one record present.
pub fn parse_targets<R: Read>(reader: R, source: &Path) -> Result<Vec<TargetGene>> {
    let records = parse_fasta_records(reader, source)?;
    if records.is_empty() {
        return Err(Error::input_format(source, "no sequences found"));
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(records.len());
    for (name, sequence) in records {
        if !seen.insert(name.clone()) {
            return Err(Error::input_format(
                source,
                format!("duplicate sequence name '{name}'"),
            ));
        }
        targets.push(TargetGene { name, sequence });
    }
    Ok(targets)
}

pub fn read_targets(path: &Path) -> Result<Vec<TargetGene>> {
    parse_targets(open(path)?, path)
}

/// Expand the user's copy numbers to one per genome file.
/// No values means 1 everywhere; a single value applies to every file.
pub fn resolve_copy_numbers(copy_numbers: &[usize], file_count: usize) -> Result<Vec<usize>> {
    match copy_numbers {
        [] => Ok(vec![1; file_count]),
        [n] => Ok(vec![*n; file_count]),
        many if many.len() == file_count => Ok(many.to_vec()),
        many => Err(Error::Config(format!(
            "got {} copy numbers for {} genome files",
            many.len(),
            file_count
        ))),
    }
}

/// Read every genome file and build the doubled genome. Copy number `i`
/// multiplies every record of file `i`.
pub fn read_genome(paths: &[PathBuf], copy_numbers: &[usize]) -> Result<GenomeSequence> {
    let copies = resolve_copy_numbers(copy_numbers, paths.len())?;

    let mut parts = Vec::new();
    for (path, &n) in paths.iter().zip(&copies) {
        let records = parse_fasta_records(open(path)?, path)?;
        if records.is_empty() {
            return Err(Error::input_format(path, "no sequences found"));
        }
        parts.extend(records.into_iter().map(|(_, seq)| (seq, n)));
    }

    Ok(GenomeSequence::from_parts(
        parts.iter().map(|(seq, n)| (seq, *n)),
    ))
}

/// Persist the doubled genome as a single-record FASTA file
pub fn write_genome_artifact(genome: &GenomeSequence, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::output_write(path, e))?;
    let mut writer = fasta::Writer::new(BufWriter::new(file));
    writer
        .write(GENOME_ARTIFACT_ID, Some(GENOME_ARTIFACT_DESC), genome.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::output_write(path, e))
}

/// Load a doubled genome written by [`write_genome_artifact`]
pub fn read_genome_artifact(path: &Path) -> Result<GenomeSequence> {
    let mut records = parse_fasta_records(open(path)?, path)?;
    if records.len() != 1 {
        return Err(Error::input_format(
            path,
            format!("expected one genome record, found {}", records.len()),
        ));
    }
    let (_, sequence) = records.remove(0);
    GenomeSequence::from_doubled(sequence).ok_or_else(|| {
        Error::input_format(
            path,
            "second half is not the reverse complement of the first",
        )
    })
}
