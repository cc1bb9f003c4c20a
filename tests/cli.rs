use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

const HEADER: &str = "Gene/ORF Name,Guide Sequence,PAM,Strand,Position,On-Target Score,\
Exact Matches,Off-Target Matches,Entropy Score,Rank in Target Gene";

// 20-nt guide at offset 4 followed by TGG, with 4 nt upstream and 3 nt downstream
const GENE: &str = "TTTTGACGCATAAAGATGAGACGCTGGTTTTACC";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn guide_finder() -> Command {
    Command::cargo_bin("optimal_guide_finder").unwrap()
}

#[test]
fn binding_strength_run_writes_all_outputs() {
    let dir = TempDir::new().unwrap();
    let guides = write(dir.path(), "guides.fa", ">g1\nGACGCATAAAGATGAGACGC\n");
    let genome = write(dir.path(), "genome.fa", &format!(">chr1\n{GENE}\n"));
    let out = dir.path().join("out");

    guide_finder()
        .arg("-t")
        .arg(&guides)
        .arg("-g")
        .arg(&genome)
        .args(["-c", "2", "-p", "g", "--threads", "2", "-q"])
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let report = fs::read_to_string(out.join("output.csv")).unwrap();
    let mut lines = report.lines();
    assert_eq!(lines.next().unwrap(), HEADER);
    let row = lines.next().unwrap();
    assert!(row.starts_with("g1,GACGCATAAAGATGAGACGC,,+,0,,2,2,"));
    assert!(row.ends_with(",1"));

    let artifact = fs::read_to_string(out.join("Run_Genome")).unwrap();
    assert!(artifact.starts_with(">refgenome a reference background\n"));
    assert!(out.join("run.log").exists());

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("run_config.json")).unwrap()).unwrap();
    assert_eq!(config["params"]["purpose"], "binding_strength");
}

#[test]
fn default_purpose_scores_with_builtin_model() {
    let dir = TempDir::new().unwrap();
    let targets = write(dir.path(), "targets.fa", &format!(">geneA\n{GENE}\n"));
    let genome = write(dir.path(), "genome.fa", &format!(">chr1\n{GENE}\n"));
    let out = dir.path().join("out");

    guide_finder()
        .arg("-t")
        .arg(&targets)
        .arg("-g")
        .arg(&genome)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let report = fs::read_to_string(out.join("output.csv")).unwrap();
    let row = report.lines().nth(1).unwrap();
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[0], "geneA");
    assert_eq!(fields[1], "GACGCATAAAGATGAGACGC");
    assert_eq!(fields[2], "TGG");
    let score: f64 = fields[5].parse().unwrap();
    assert!(score > 0.0 && score < 1.0);
    assert_eq!(fields[8], "0.0");
}

#[test]
fn genome_artifact_replaces_genome_files() {
    let dir = TempDir::new().unwrap();
    let guides = write(dir.path(), "guides.fa", ">g1\nGACGCATAAAGATGAGACGC\n");
    let genome = write(dir.path(), "genome.fa", &format!(">chr1\n{GENE}\n"));
    let first = dir.path().join("first");
    let second = dir.path().join("second");

    guide_finder()
        .arg("-t")
        .arg(&guides)
        .arg("-g")
        .arg(&genome)
        .args(["-p", "g"])
        .arg("-o")
        .arg(&first)
        .assert()
        .success();

    guide_finder()
        .arg("-t")
        .arg(&guides)
        .arg("--genome-artifact")
        .arg(first.join("Run_Genome"))
        .args(["-p", "g"])
        .arg("-o")
        .arg(&second)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(first.join("output.csv")).unwrap(),
        fs::read_to_string(second.join("output.csv")).unwrap()
    );
}

#[test]
fn rejects_bad_invocations() {
    let dir = TempDir::new().unwrap();
    let guides = write(dir.path(), "guides.fa", ">g1\nACGT\n");
    let genome = write(dir.path(), "genome.fa", ">chr1\nACGTAGG\n");
    let out = dir.path().join("out");

    // No genome at all
    guide_finder().arg("-t").arg(&guides).assert().failure();

    // Unknown purpose code
    guide_finder()
        .arg("-t")
        .arg(&guides)
        .arg("-g")
        .arg(&genome)
        .args(["-p", "x"])
        .arg("-o")
        .arg(&out)
        .assert()
        .failure();

    // More copy numbers than genome files
    guide_finder()
        .arg("-t")
        .arg(&guides)
        .arg("-g")
        .arg(&genome)
        .args(["-c", "1", "2"])
        .arg("-o")
        .arg(&out)
        .assert()
        .failure();

    // Malformed target file
    let broken = write(dir.path(), "broken.fa", "not a fasta file\n");
    guide_finder()
        .arg("-t")
        .arg(&broken)
        .arg("-g")
        .arg(&genome)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure();
}
