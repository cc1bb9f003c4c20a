//! Data types and run parameters for guide finding

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::iupac::is_iupac_code;
use crate::error::{Error, Result};

/// Strand a guide or a genome match lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
        }
    }
}

/// What the run is for. Selects which stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeMode {
    /// CRISPR interference: scan, score on-target, keep the top `cutoff` guides
    Interference,
    /// Each target record is already a guide; only off-target binding is scored
    BindingStrength,
    /// Every guide in the target, scored on-target but never truncated
    AllGuides,
}

impl Default for PurposeMode {
    fn default() -> Self {
        Self::AllGuides
    }
}

impl PurposeMode {
    /// Whether target records are scanned for PAM-anchored guides
    pub fn scans_targets(&self) -> bool {
        !matches!(self, Self::BindingStrength)
    }

    /// Whether the on-target oracle is consulted
    pub fn invokes_oracle(&self) -> bool {
        !matches!(self, Self::BindingStrength)
    }

    /// Whether the on-target cutoff truncates the candidate list
    pub fn applies_cutoff(&self) -> bool {
        matches!(self, Self::Interference)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Interference => "CRISPR interference (top guides by on-target score)",
            Self::BindingStrength => "guide binding strength only",
            Self::AllGuides => "all possible guides",
        }
    }
}

impl FromStr for PurposeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "i" | "interference" => Ok(Self::Interference),
            "g" | "binding" | "binding-strength" => Ok(Self::BindingStrength),
            "" | "d" | "all" | "default" => Ok(Self::AllGuides),
            other => Err(Error::Config(format!(
                "unknown purpose '{other}': expected i, g or d"
            ))),
        }
    }
}

/// Thread count configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadCount {
    /// Use all available CPU cores
    Auto,
    /// Use a specific number of threads
    Fixed(usize),
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self::Auto
    }
}

impl ThreadCount {
    /// Get the actual number of threads to use
    pub fn get_count(&self) -> usize {
        match self {
            Self::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Self::Fixed(n) => (*n).max(1),
        }
    }
}

impl From<Option<usize>> for ThreadCount {
    fn from(threads: Option<usize>) -> Self {
        match threads {
            Some(n) if n > 0 => Self::Fixed(n),
            _ => Self::Auto,
        }
    }
}

/// Where guides are looked for in a target sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Protospacer length in nucleotides
    pub guide_length: usize,
    /// IUPAC pattern required immediately 3' of the protospacer
    pub pam: String,
    /// Bases of 5' flank included in the on-target scoring window
    pub upstream_context: usize,
    /// Bases of 3' flank after the PAM included in the scoring window
    pub downstream_context: usize,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            guide_length: 20,
            pam: "NGG".to_string(),
            upstream_context: 4,
            downstream_context: 3,
        }
    }
}

/// Longest accepted guide or PAM, in nucleotides
pub const MAX_SITE_PART_LENGTH: usize = 1_000;
/// Longest accepted flank on either side of the scoring window
pub const MAX_CONTEXT_LENGTH: usize = 10_000;

impl ScanParams {
    pub fn pam_length(&self) -> usize {
        self.pam.len()
    }

    /// Guide plus PAM
    pub fn site_length(&self) -> usize {
        self.guide_length.saturating_add(self.pam_length())
    }

    /// Guide plus PAM plus both flanks
    pub fn context_length(&self) -> usize {
        self.upstream_context
            .saturating_add(self.site_length())
            .saturating_add(self.downstream_context)
    }
}

/// Bounds on the genome-wide off-target search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Largest number of mismatches a genome window may carry and still match
    pub max_mismatches: usize,
    /// Only accept genome windows followed by a site matching the PAM pattern
    pub require_pam: bool,
    /// Emit a progress line every this many completed candidates (0 disables)
    pub progress_interval: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_mismatches: 3,
            require_pam: true,
            progress_interval: 25,
        }
    }
}

/// Mismatch-to-energy attenuation curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WeightingCurve {
    /// Every mismatch costs the same free energy
    Uniform { penalty_kcal: f64 },
    /// A base penalty per mismatch plus the RNA:DNA stacking energy of every
    /// nearest-neighbor stack the mismatches break
    NearestNeighbor { base_penalty_kcal: f64 },
}

impl Default for WeightingCurve {
    fn default() -> Self {
        Self::NearestNeighbor {
            base_penalty_kcal: 1.0,
        }
    }
}

/// Parameters of the biophysical off-target model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingModel {
    pub curve: WeightingCurve,
    /// Hybridization temperature in Kelvin
    pub temperature_kelvin: f64,
    /// Number of PAM-proximal guide bases forming the seed region
    pub seed_length: usize,
    /// Penalty multiplier for mismatches inside the seed region
    pub seed_multiplier: f64,
}

impl Default for BindingModel {
    fn default() -> Self {
        Self {
            curve: WeightingCurve::default(),
            temperature_kelvin: 310.15,
            seed_length: 10,
            seed_multiplier: 2.0,
        }
    }
}

/// Global run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    pub purpose: PurposeMode,
    /// Candidates kept per gene by the on-target filter in interference mode
    pub cutoff: usize,
    pub thread_count: ThreadCount,
    pub scan: ScanParams,
    pub search: SearchParams,
    pub binding: BindingModel,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            purpose: PurposeMode::AllGuides,
            cutoff: 10,
            thread_count: ThreadCount::Auto,
            scan: ScanParams::default(),
            search: SearchParams::default(),
            binding: BindingModel::default(),
        }
    }
}

impl RunParams {
    /// Reject parameter combinations no stage can work with
    pub fn validate(&self) -> Result<()> {
        if self.scan.guide_length == 0 {
            return Err(Error::Config("guide length must be at least 1".to_string()));
        }
        if self.scan.guide_length > MAX_SITE_PART_LENGTH {
            return Err(Error::Config(format!(
                "guide length {} exceeds the maximum of {MAX_SITE_PART_LENGTH}",
                self.scan.guide_length
            )));
        }
        if self.scan.pam_length() > MAX_SITE_PART_LENGTH {
            return Err(Error::Config(format!(
                "PAM pattern is longer than {MAX_SITE_PART_LENGTH} bases"
            )));
        }
        for (side, flank) in [
            ("upstream", self.scan.upstream_context),
            ("downstream", self.scan.downstream_context),
        ] {
            if flank > MAX_CONTEXT_LENGTH {
                return Err(Error::Config(format!(
                    "{side} context {flank} exceeds the maximum of {MAX_CONTEXT_LENGTH}"
                )));
            }
        }
        if let Some(c) = self.scan.pam.chars().find(|&c| !is_iupac_code(c)) {
            return Err(Error::Config(format!(
                "PAM pattern '{}' contains invalid character '{c}'",
                self.scan.pam
            )));
        }
        if self.scan.pam.is_empty() && self.search.require_pam {
            return Err(Error::Config(
                "an empty PAM pattern cannot be required during the off-target search".to_string(),
            ));
        }
        if self.binding.temperature_kelvin <= 0.0 || !self.binding.temperature_kelvin.is_finite() {
            return Err(Error::Config(format!(
                "temperature must be positive, got {} K",
                self.binding.temperature_kelvin
            )));
        }
        if self.binding.seed_multiplier < 1.0 {
            return Err(Error::Config(format!(
                "seed multiplier must be at least 1, got {}",
                self.binding.seed_multiplier
            )));
        }
        let penalty = match self.binding.curve {
            WeightingCurve::Uniform { penalty_kcal } => penalty_kcal,
            WeightingCurve::NearestNeighbor { base_penalty_kcal } => base_penalty_kcal,
        };
        if penalty <= 0.0 || !penalty.is_finite() {
            return Err(Error::Config(format!(
                "mismatch penalty must be positive, got {penalty} kcal/mol"
            )));
        }
        Ok(())
    }
}

/// A PAM-anchored guide site found in a target gene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideCandidate {
    pub gene_name: String,
    pub guide: String,
    pub pam: String,
    pub strand: Strand,
    /// 0-based offset of the guide's 5' end on its own strand
    pub position: usize,
    /// Guide and PAM with flanks for on-target scoring; `None` when the
    /// flanks run off the sequence
    pub context: Option<String>,
}

/// A candidate with its on-target efficiency attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: GuideCandidate,
    /// `None` when the oracle was not consulted or could not score it
    pub efficiency: Option<f64>,
}

/// A genome window the guide binds within the mismatch budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffTargetMatch {
    /// Index of the owning candidate in the searched batch
    pub candidate: usize,
    /// Start of the window within the strand it lies on
    pub genome_position: usize,
    pub strand: Strand,
    pub mismatch_count: usize,
    /// 0-based guide offsets that differ from the genome window
    pub mismatch_positions: Vec<usize>,
}

/// One row of the final report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideScoreRecord {
    #[serde(rename = "Gene/ORF Name")]
    pub gene_name: String,
    #[serde(rename = "Guide Sequence")]
    pub guide: String,
    #[serde(rename = "PAM")]
    pub pam: String,
    #[serde(rename = "Strand")]
    pub strand: Strand,
    #[serde(rename = "Position")]
    pub position: usize,
    #[serde(rename = "On-Target Score")]
    pub efficiency: Option<f64>,
    #[serde(rename = "Exact Matches")]
    pub exact_matches: usize,
    #[serde(rename = "Off-Target Matches")]
    pub total_matches: usize,
    #[serde(rename = "Entropy Score")]
    pub entropy_score: f64,
    /// 1-based; 0 until the records are ranked
    #[serde(rename = "Rank in Target Gene")]
    pub rank: usize,
}
