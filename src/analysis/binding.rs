//! Biophysical off-target scoring
//!
//! Every genome match is given a free-energy penalty relative to a perfect
//! guide:DNA hybrid. Its Boltzmann weight `exp(-ddG / RT)` is 1 for an exact
//! match and shrinks with each mismatch. When the guide's own site is in the
//! genome, one exact match is taken to be that site; the entropy score is
//! `ln(1 + sum of the remaining weights)`, so a guide that binds only its own
//! site scores 0.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::types::{BindingModel, OffTargetMatch, WeightingCurve};

/// Gas constant in kcal/(mol*K)
pub const GAS_CONSTANT: f64 = 0.0019872;

/// RNA:DNA hybrid nearest-neighbor free energies at 37 C (Sugimoto et al.
/// 1995) in kcal/mol, keyed by the RNA dinucleotide 5'->3' in DNA letters.
static RNA_DNA_STACKS: Lazy<HashMap<&'static [u8], f64>> = Lazy::new(|| {
    let mut map: HashMap<&'static [u8], f64> = HashMap::new();
    map.insert(b"AA", -1.0);
    map.insert(b"AC", -2.1);
    map.insert(b"AG", -1.8);
    map.insert(b"AT", -0.9);
    map.insert(b"CA", -0.9);
    map.insert(b"CC", -2.1);
    map.insert(b"CG", -1.7);
    map.insert(b"CT", -0.9);
    map.insert(b"GA", -1.3);
    map.insert(b"GC", -2.7);
    map.insert(b"GG", -2.9);
    map.insert(b"GT", -1.1);
    map.insert(b"TA", -0.6);
    map.insert(b"TC", -1.5);
    map.insert(b"TG", -1.6);
    map.insert(b"TT", -0.2);
    map
});

/// Aggregate binding of one guide across its match set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingSummary {
    pub exact_matches: usize,
    pub total_matches: usize,
    pub entropy_score: f64,
}

fn seed_factor(offset: usize, guide_len: usize, model: &BindingModel) -> f64 {
    if offset + model.seed_length >= guide_len {
        model.seed_multiplier
    } else {
        1.0
    }
}

/// Free-energy cost in kcal/mol of the given mismatches against a perfect
/// hybrid. Strictly increasing in the number of distinct mismatches.
pub fn mismatch_penalty(guide: &[u8], mismatch_positions: &[usize], model: &BindingModel) -> f64 {
    let len = guide.len();
    let mut mismatched = vec![false; len];
    for &p in mismatch_positions {
        if p < len {
            mismatched[p] = true;
        }
    }

    let per_mismatch = match model.curve {
        WeightingCurve::Uniform { penalty_kcal } => penalty_kcal,
        WeightingCurve::NearestNeighbor { base_penalty_kcal } => base_penalty_kcal,
    };
    let mut penalty: f64 = (0..len)
        .filter(|&p| mismatched[p])
        .map(|p| per_mismatch * seed_factor(p, len, model))
        .sum();

    if let WeightingCurve::NearestNeighbor { .. } = model.curve {
        // A stack is lost when either of its two bases is mismatched
        for i in 0..len.saturating_sub(1) {
            if mismatched[i] || mismatched[i + 1] {
                let stack = RNA_DNA_STACKS.get(&guide[i..i + 2]).copied().unwrap_or(0.0);
                penalty += stack.abs() * seed_factor(i + 1, len, model);
            }
        }
    }
    penalty
}

/// Boltzmann weight of a match relative to a perfect hybrid, in (0, 1]
pub fn binding_weight(guide: &[u8], m: &OffTargetMatch, model: &BindingModel) -> f64 {
    let rt = GAS_CONSTANT * model.temperature_kelvin;
    (-mismatch_penalty(guide, &m.mismatch_positions, model) / rt).exp()
}

/// Score a guide's complete match set. Pure; safe to call from any worker.
///
/// With `on_target_present`, the first exact match is the intended site and
/// carries no weight. Otherwise every match counts as an off-target.
pub fn summarize_binding(
    guide: &str,
    matches: &[OffTargetMatch],
    model: &BindingModel,
    on_target_present: bool,
) -> BindingSummary {
    let guide = guide.as_bytes();
    let mut on_target_pending = on_target_present;

    let off_target_weight: f64 = matches
        .iter()
        .filter(|m| {
            if m.mismatch_count == 0 && on_target_pending {
                on_target_pending = false;
                false
            } else {
                true
            }
        })
        .map(|m| binding_weight(guide, m, model))
        // Iterator::sum over f64 starts at -0.0
        .fold(0.0_f64, |acc, w| acc + w);

    BindingSummary {
        exact_matches: matches.iter().filter(|m| m.mismatch_count == 0).count(),
        total_matches: matches.len(),
        entropy_score: off_target_weight.ln_1p(),
    }
}
