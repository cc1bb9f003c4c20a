//! Report aggregation and per-gene ranking

use std::cmp::Ordering;
use std::collections::HashSet;

use super::types::GuideScoreRecord;

/// Order used for ranking: gene, then ascending entropy, then the guide
/// identity so equal scores come out the same way every run.
fn record_order(a: &GuideScoreRecord, b: &GuideScoreRecord) -> Ordering {
    a.gene_name
        .cmp(&b.gene_name)
        .then_with(|| a.entropy_score.total_cmp(&b.entropy_score))
        .then_with(|| a.guide.cmp(&b.guide))
        .then_with(|| a.strand.cmp(&b.strand))
        .then_with(|| a.position.cmp(&b.position))
}

/// Deduplicate, sort and number the records within each gene.
///
/// Records sharing gene, guide and entropy score collapse to the one that
/// sorts first. Lower entropy ranks first; ranks restart at 1 for every gene.
/// The result does not depend on input order.
pub fn rank_records(records: Vec<GuideScoreRecord>) -> Vec<GuideScoreRecord> {
    let mut sorted = records;
    sorted.sort_by(record_order);

    let mut seen: HashSet<(String, String, u64)> = HashSet::with_capacity(sorted.len());
    let mut ranked: Vec<GuideScoreRecord> = Vec::with_capacity(sorted.len());
    for record in sorted {
        let key = (
            record.gene_name.clone(),
            record.guide.clone(),
            record.entropy_score.to_bits(),
        );
        if seen.insert(key) {
            ranked.push(record);
        }
    }

    let mut rank = 0;
    let mut current_gene: Option<String> = None;
    for record in ranked.iter_mut() {
        if current_gene.as_deref() != Some(record.gene_name.as_str()) {
            current_gene = Some(record.gene_name.clone());
            rank = 0;
        }
        rank += 1;
        record.rank = rank;
    }
    ranked
}
