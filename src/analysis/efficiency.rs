//! On-target efficiency scoring and the top-K filter
//!
//! The predictor itself sits behind [`EfficiencyOracle`]. The filter asks it
//! for one score per candidate window, drops or tags the candidates it cannot
//! score, and keeps the best `cutoff` guides when the purpose calls for it.

use thiserror::Error;

use super::diagnostics::{RunWarning, WarningSink};
use super::iupac::is_canonical;
use super::types::{GuideCandidate, PurposeMode, ScoredCandidate};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("no scoring window: flanking sequence runs off the target")]
    MissingContext,

    #[error("scoring window has length {found}, expected {expected}")]
    WindowLength { expected: usize, found: usize },

    #[error("scoring window contains symbols other than A, C, G, T")]
    InvalidSymbol,

    #[error("oracle returned a non-finite score")]
    NonFinite,

    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// A predictor of on-target cutting efficiency.
///
/// Receives a batch of equal-length context windows (flank + guide + PAM +
/// flank) and returns exactly one result per window, in order.
pub trait EfficiencyOracle: Sync {
    fn score(&self, windows: &[&str]) -> Vec<Result<f64, OracleError>>;
}

// Position-specific single and di-nucleotide weights over a 30-nt window
// (4 nt 5' flank, 20 nt protospacer, NGG, 3 nt 3' flank), after Doench et al.
// 2014 rule set 1. Offsets are 0-based into the window.
const RULE_SET_ONE_WEIGHTS: &[(usize, &str, f64)] = &[
    (1, "G", -0.2753771), (2, "A", -0.3238875), (2, "C", 0.17212887), (3, "C", -0.1006662),
    (4, "C", -0.2018029), (4, "G", 0.24595663), (5, "A", 0.03644004), (5, "C", 0.09837684),
    (6, "C", -0.7411813), (6, "G", -0.3932644), (11, "A", -0.466099), (14, "A", 0.08537695),
    (14, "C", -0.013814), (15, "A", 0.27262051), (15, "C", -0.1190226), (15, "T", -0.2859442),
    (16, "A", 0.09745459), (16, "G", -0.1755462), (17, "C", -0.3457955), (17, "G", -0.6780964),
    (18, "A", 0.22508903), (18, "C", -0.5077941), (19, "G", -0.4173736), (19, "T", -0.054307),
    (20, "G", 0.37989937), (20, "T", -0.0907126), (21, "C", 0.05782332), (21, "T", -0.5305673),
    (22, "T", -0.8770074), (23, "C", -0.8762358), (23, "G", 0.27891626), (23, "T", -0.4031022),
    (24, "A", -0.0773007), (24, "C", 0.28793562), (24, "T", -0.2216372), (27, "G", -0.6890167),
    (27, "T", 0.11787758), (28, "C", -0.1604453), (29, "G", 0.38634258), (1, "GT", -0.6257787),
    (4, "GC", 0.30004332), (5, "AA", -0.8348362), (5, "TA", 0.76062777), (6, "GG", -0.4908167),
    (11, "GG", -1.5169074), (11, "TA", 0.7092612), (11, "TC", 0.49629861), (11, "TT", -0.5868739),
    (12, "GG", -0.3345637), (13, "GA", 0.76384993), (13, "GC", -0.5370252), (16, "TG", -0.7981461),
    (18, "GG", -0.6668087), (18, "TC", 0.35318325), (19, "CC", 0.74807209), (19, "TG", -0.3672668),
    (20, "AC", 0.56820913), (20, "CG", 0.32907207), (20, "GA", -0.8364568), (20, "GG", -0.7822076),
    (21, "TC", -1.029693), (22, "CG", 0.85619782), (22, "CT", -0.4632077), (23, "AA", -0.5794924),
    (23, "AG", 0.64907554), (24, "AG", -0.0773007), (24, "CG", 0.28793562), (24, "TG", -0.2216372),
    (26, "GT", 0.11787758), (28, "GG", -0.69774),
];
const RULE_SET_ONE_INTERCEPT: f64 = 0.59763615;
const RULE_SET_ONE_GC_HIGH: f64 = -0.1665878;
const RULE_SET_ONE_GC_LOW: f64 = -0.2026259;

/// Built-in logistic on-target model for 20-nt SpCas9 guides.
///
/// Needs the default scan layout: 4 nt upstream, 20 nt guide, 3 nt PAM and
/// 3 nt downstream. Other window lengths fail per candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSetOneOracle;

impl RuleSetOneOracle {
    pub const WINDOW_LENGTH: usize = 30;

    fn score_window(window: &str) -> Result<f64, OracleError> {
        let bytes = window.as_bytes();
        if bytes.len() != Self::WINDOW_LENGTH {
            return Err(OracleError::WindowLength {
                expected: Self::WINDOW_LENGTH,
                found: bytes.len(),
            });
        }
        if !is_canonical(bytes) {
            return Err(OracleError::InvalidSymbol);
        }

        let gc = bytes[4..24]
            .iter()
            .filter(|&&b| b == b'G' || b == b'C')
            .count() as f64;
        let gc_weight = if gc < 10.0 {
            RULE_SET_ONE_GC_LOW
        } else {
            RULE_SET_ONE_GC_HIGH
        };

        let mut score = RULE_SET_ONE_INTERCEPT + (10.0 - gc).abs() * gc_weight;
        for &(offset, feature, weight) in RULE_SET_ONE_WEIGHTS {
            if bytes[offset..].starts_with(feature.as_bytes()) {
                score += weight;
            }
        }

        Ok(1.0 / (1.0 + (-score).exp()))
    }
}

impl EfficiencyOracle for RuleSetOneOracle {
    fn score(&self, windows: &[&str]) -> Vec<Result<f64, OracleError>> {
        windows.iter().map(|w| Self::score_window(w)).collect()
    }
}

/// Attach on-target scores and apply the purpose's cutoff.
///
/// * Binding-strength mode passes everything through unscored.
/// * Interference mode drops candidates the oracle cannot score, sorts by
///   descending score and keeps the first `cutoff`.
/// * All-guides mode sorts but never truncates; unscorable candidates stay,
///   tagged with no score and placed last.
///
/// Equal scores keep scan order.
pub fn filter_candidates(
    candidates: Vec<GuideCandidate>,
    oracle: &dyn EfficiencyOracle,
    purpose: PurposeMode,
    cutoff: usize,
    sink: &dyn WarningSink,
) -> Vec<ScoredCandidate> {
    if !purpose.invokes_oracle() {
        return candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                candidate,
                efficiency: None,
            })
            .collect();
    }

    let results = score_candidates(&candidates, oracle);

    let mut scored = Vec::with_capacity(candidates.len());
    for (candidate, result) in candidates.into_iter().zip(results) {
        match result {
            Ok(score) => scored.push(ScoredCandidate {
                candidate,
                efficiency: Some(score),
            }),
            Err(err) => {
                sink.warn(RunWarning::OracleFailure {
                    gene: candidate.gene_name.clone(),
                    guide: candidate.guide.clone(),
                    strand: candidate.strand,
                    position: candidate.position,
                    reason: err.to_string(),
                });
                if !purpose.applies_cutoff() {
                    scored.push(ScoredCandidate {
                        candidate,
                        efficiency: None,
                    });
                }
            }
        }
    }

    scored.sort_by(|a, b| {
        let a = a.efficiency.unwrap_or(f64::NEG_INFINITY);
        let b = b.efficiency.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });

    if purpose.applies_cutoff() {
        scored.truncate(cutoff);
    }
    scored
}

/// One oracle call for every candidate that has a window
fn score_candidates(
    candidates: &[GuideCandidate],
    oracle: &dyn EfficiencyOracle,
) -> Vec<Result<f64, OracleError>> {
    let windows: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c.context.as_deref())
        .collect();

    let mut batch = if windows.is_empty() {
        Vec::new()
    } else {
        oracle.score(&windows)
    };
    if batch.len() != windows.len() {
        let reason = format!(
            "returned {} scores for {} windows",
            batch.len(),
            windows.len()
        );
        batch = vec![Err(OracleError::Unavailable(reason)); windows.len()];
    }

    let mut batch = batch.into_iter();
    candidates
        .iter()
        .map(|c| match c.context {
            None => Err(OracleError::MissingContext),
            Some(_) => match batch.next() {
                Some(Ok(score)) if !score.is_finite() => Err(OracleError::NonFinite),
                Some(result) => result,
                None => Err(OracleError::Unavailable("missing score".to_string())),
            },
        })
        .collect()
}
