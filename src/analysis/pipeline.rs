//! Run orchestration
//!
//! Scans each target, filters its candidates by on-target efficiency, then
//! searches the genome for every surviving candidate on a rayon pool and
//! scores the matches. Results are ranked once all workers have finished.

use rayon::prelude::*;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::binding::{summarize_binding, BindingSummary};
use super::diagnostics::{RunWarning, WarningSink};
use super::efficiency::{filter_candidates, EfficiencyOracle};
use super::ranking::rank_records;
use super::scanner::{literal_guide, scan_target};
use super::search::{find_matches, SearchError};
use super::sequence::{GenomeSequence, TargetGene};
use super::types::{GuideScoreRecord, RunParams, ScoredCandidate};

/// Candidates for every target, in target order, after the efficiency filter
pub fn collect_candidates(
    targets: &[TargetGene],
    oracle: &dyn EfficiencyOracle,
    params: &RunParams,
    sink: &dyn WarningSink,
) -> Vec<ScoredCandidate> {
    let mut selected = Vec::new();

    for target in targets {
        if target.sequence.is_empty() || !target.sequence.is_canonical() {
            sink.warn(RunWarning::EmptySequence {
                name: target.name.clone(),
            });
            continue;
        }

        let candidates = if params.purpose.scans_targets() {
            scan_target(target, &params.scan)
        } else {
            literal_guide(target).into_iter().collect()
        };
        if candidates.is_empty() {
            sink.warn(RunWarning::NoCandidates {
                name: target.name.clone(),
            });
            continue;
        }

        let found = candidates.len();
        let kept = filter_candidates(candidates, oracle, params.purpose, params.cutoff, sink);
        log::debug!("{}: {} candidates, {} kept", target.name, found, kept.len());
        selected.extend(kept);
    }

    selected
}

/// Names of the scanned targets whose full sequence occurs in the genome.
/// Literal guides have no intended site, so none are returned for them.
pub fn targets_in_genome<'a>(
    targets: &'a [TargetGene],
    genome: &GenomeSequence,
    params: &RunParams,
) -> HashSet<&'a str> {
    if !params.purpose.scans_targets() {
        return HashSet::new();
    }
    targets
        .iter()
        .filter(|target| genome.contains(target.sequence.as_bytes()))
        .map(|target| target.name.as_str())
        .collect()
}

/// Full run: candidates, parallel off-target search and scoring, ranking.
///
/// A candidate whose search fails or panics is reported through `sink` and
/// left out; every other candidate still produces a record.
pub fn run_pipeline(
    targets: &[TargetGene],
    genome: &GenomeSequence,
    oracle: &dyn EfficiencyOracle,
    params: &RunParams,
    sink: &dyn WarningSink,
) -> Vec<GuideScoreRecord> {
    let candidates = collect_candidates(targets, oracle, params, sink);
    sink.progress(&format!(
        "{} candidates selected from {} targets",
        candidates.len(),
        targets.len()
    ));
    if candidates.is_empty() {
        return Vec::new();
    }

    let present = targets_in_genome(targets, genome, params);
    log::debug!("{} of {} targets found in the genome", present.len(), targets.len());

    let num_threads = params.thread_count.get_count();
    let search = || score_candidates(&candidates, &present, genome, params, sink);
    let records = match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => pool.install(search),
        Err(err) => {
            log::warn!(
                "could not build a {num_threads}-thread pool ({err}); using the global pool"
            );
            search()
        }
    };

    rank_records(records)
}

fn score_candidates(
    candidates: &[ScoredCandidate],
    present: &HashSet<&str>,
    genome: &GenomeSequence,
    params: &RunParams,
    sink: &dyn WarningSink,
) -> Vec<GuideScoreRecord> {
    let total = candidates.len();
    let interval = params.search.progress_interval;
    let completed_count = AtomicUsize::new(0);

    candidates
        .par_iter()
        .enumerate()
        .filter_map(|(index, scored)| {
            let on_target_present = present.contains(scored.candidate.gene_name.as_str());
            let record = score_candidate(index, scored, on_target_present, genome, params);

            let completed = completed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if (interval > 0 && completed % interval == 0) || completed == total {
                sink.progress(&format!("Searched {completed}/{total} guides"));
            }

            match record {
                Ok(record) => Some(record),
                Err(reason) => {
                    let candidate = &scored.candidate;
                    sink.warn(RunWarning::WorkerFailure {
                        gene: candidate.gene_name.clone(),
                        guide: candidate.guide.clone(),
                        strand: candidate.strand,
                        position: candidate.position,
                        reason,
                    });
                    None
                }
            }
        })
        .collect()
}

/// One unit of work: search plus scoring, with panics turned into errors
fn score_candidate(
    index: usize,
    scored: &ScoredCandidate,
    on_target_present: bool,
    genome: &GenomeSequence,
    params: &RunParams,
) -> Result<GuideScoreRecord, String> {
    let candidate = &scored.candidate;
    let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<BindingSummary, SearchError> {
        let matches = find_matches(
            index,
            candidate.guide.as_bytes(),
            params.scan.pam.as_bytes(),
            genome,
            &params.search,
        )?;
        Ok(summarize_binding(
            &candidate.guide,
            &matches,
            &params.binding,
            on_target_present,
        ))
    }));

    let summary = match outcome {
        Ok(Ok(summary)) => summary,
        Ok(Err(err)) => return Err(err.to_string()),
        Err(payload) => return Err(panic_message(payload.as_ref())),
    };

    Ok(GuideScoreRecord {
        gene_name: candidate.gene_name.clone(),
        guide: candidate.guide.clone(),
        pam: candidate.pam.clone(),
        strand: candidate.strand,
        position: candidate.position,
        efficiency: scored.efficiency,
        exact_matches: summary.exact_matches,
        total_matches: summary.total_matches,
        entropy_score: summary.entropy_score,
        rank: 0,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}
