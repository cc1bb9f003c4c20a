//! Genome-wide off-target search
//!
//! A bounded-mismatch windowed scan: every start position on each strand of
//! the doubled genome is compared base by base against the guide, bailing out
//! as soon as the mismatch budget is exceeded. Windows that would straddle the
//! forward/reverse junction are never considered.

use thiserror::Error;

use super::iupac::{is_canonical, site_matches_pattern};
use super::sequence::GenomeSequence;
use super::types::{OffTargetMatch, SearchParams, Strand};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("guide is empty")]
    EmptyGuide,

    #[error("guide contains symbols other than A, C, G, T")]
    InvalidGuide,
}

/// Every genome window the guide matches within `params.max_mismatches`,
/// forward strand first, ascending position within each strand.
///
/// When `params.require_pam` is set the window must be followed by a site
/// matching `pam`. Genome symbols outside A, C, G, T always mismatch.
pub fn find_matches(
    candidate: usize,
    guide: &[u8],
    pam: &[u8],
    genome: &GenomeSequence,
    params: &SearchParams,
) -> Result<Vec<OffTargetMatch>, SearchError> {
    if guide.is_empty() {
        return Err(SearchError::EmptyGuide);
    }
    if !is_canonical(guide) {
        return Err(SearchError::InvalidGuide);
    }

    let pam = if params.require_pam { pam } else { &[][..] };
    let mut matches = Vec::new();
    for (strand, strand_seq) in [
        (Strand::Forward, genome.forward()),
        (Strand::Reverse, genome.reverse()),
    ] {
        scan_strand(
            candidate,
            guide,
            pam,
            strand_seq,
            strand,
            params.max_mismatches,
            &mut matches,
        );
    }
    Ok(matches)
}

fn scan_strand(
    candidate: usize,
    guide: &[u8],
    pam: &[u8],
    strand_seq: &[u8],
    strand: Strand,
    max_mismatches: usize,
    matches: &mut Vec<OffTargetMatch>,
) {
    let guide_len = guide.len();
    let window_len = guide_len + pam.len();
    if strand_seq.len() < window_len {
        return;
    }

    let mut mismatch_positions = Vec::with_capacity(max_mismatches + 1);
    for start in 0..=strand_seq.len() - window_len {
        let pam_start = start + guide_len;
        if !site_matches_pattern(&strand_seq[pam_start..pam_start + pam.len()], pam) {
            continue;
        }

        if let Some(positions) = count_mismatches(
            guide,
            &strand_seq[start..pam_start],
            max_mismatches,
            &mut mismatch_positions,
        ) {
            matches.push(OffTargetMatch {
                candidate,
                genome_position: start,
                strand,
                mismatch_count: positions.len(),
                mismatch_positions: positions.to_vec(),
            });
        }
    }
}

/// Mismatching guide offsets, or `None` once more than `max` are found
#[inline]
fn count_mismatches<'a>(
    guide: &[u8],
    window: &[u8],
    max: usize,
    positions: &'a mut Vec<usize>,
) -> Option<&'a [usize]> {
    positions.clear();
    for (i, (&g, &w)) in guide.iter().zip(window).enumerate() {
        if g != w {
            positions.push(i);
            if positions.len() > max {
                return None;
            }
        }
    }
    Some(positions.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sequence::NucleotideSequence;

    fn genome(parts: &[(&str, usize)]) -> GenomeSequence {
        let seqs: Vec<_> = parts
            .iter()
            .map(|(s, n)| (NucleotideSequence::from(*s), *n))
            .collect();
        GenomeSequence::from_parts(seqs.iter().map(|(s, n)| (s, *n)))
    }

    fn params(max_mismatches: usize) -> SearchParams {
        SearchParams {
            max_mismatches,
            require_pam: true,
            ..SearchParams::default()
        }
    }

    #[test]
    fn test_single_mismatch_reported_with_position() {
        let g = genome(&[("TTTTACGTTCGTACTGGTTTT", 1)]);
        let matches = find_matches(0, b"ACGTACGTAC", b"NGG", &g, &params(1)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].genome_position, 4);
        assert_eq!(matches[0].strand, Strand::Forward);
        assert_eq!(matches[0].mismatch_count, 1);
        assert_eq!(matches[0].mismatch_positions, vec![4]);

        let strict = find_matches(0, b"ACGTACGTAC", b"NGG", &g, &params(0)).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn test_copy_number_doubles_exact_hits() {
        let guide = b"GCGG";
        let single = genome(&[("ATGCGGAGGT", 1)]);
        let double = genome(&[("ATGCGGAGGT", 2)]);

        let exact = |g: &GenomeSequence| {
            find_matches(0, guide, b"NGG", g, &params(1))
                .unwrap()
                .iter()
                .filter(|m| m.mismatch_count == 0)
                .count()
        };
        assert_eq!(exact(&single), 1);
        assert_eq!(exact(&double), 2);
    }

    #[test]
    fn test_reverse_strand_match() {
        // Reverse complement of CCTTTTTTTT is AAAAAAAAGG
        let g = genome(&[("CCTTTTTTTT", 1)]);
        let matches = find_matches(3, b"AAAAAAA", b"NGG", &g, &params(0)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].strand, Strand::Reverse);
        assert_eq!(matches[0].genome_position, 0);
        assert_eq!(matches[0].candidate, 3);
    }

    #[test]
    fn test_ambiguous_genome_bases_mismatch() {
        let g = genome(&[("ACGNAGG", 1)]);
        assert!(find_matches(0, b"ACGT", b"NGG", &g, &params(0)).unwrap().is_empty());
        let loose = find_matches(0, b"ACGT", b"NGG", &g, &params(1)).unwrap();
        assert_eq!(loose[0].mismatch_positions, vec![3]);
    }

    #[test]
    fn test_without_pam_requirement() {
        let g = genome(&[("ACGTTTTTACGT", 1)]);
        let relaxed = SearchParams {
            max_mismatches: 0,
            require_pam: false,
            ..SearchParams::default()
        };
        let matches = find_matches(0, b"ACGT", b"NGG", &g, &relaxed).unwrap();
        let forward: Vec<_> = matches
            .iter()
            .filter(|m| m.strand == Strand::Forward)
            .map(|m| m.genome_position)
            .collect();
        assert_eq!(forward, vec![0, 8]);
    }

    #[test]
    fn test_no_match_across_strand_junction() {
        // Forward ends in ACG, reverse starts with CGT: "ACGCGT" only exists at the junction
        let g = genome(&[("AAAACG", 1)]);
        let relaxed = SearchParams {
            max_mismatches: 0,
            require_pam: false,
            ..SearchParams::default()
        };
        assert!(find_matches(0, b"ACGCGT", b"", &g, &relaxed).unwrap().is_empty());
    }

    #[test]
    fn test_matches_sorted_by_position() {
        let g = genome(&[("ACGTAGGACGTTGGACGTCGG", 1)]);
        let matches = find_matches(0, b"ACGT", b"NGG", &g, &params(0)).unwrap();
        let forward: Vec<_> = matches
            .iter()
            .filter(|m| m.strand == Strand::Forward)
            .map(|m| m.genome_position)
            .collect();
        assert_eq!(forward, vec![0, 7, 14]);
    }

    #[test]
    fn test_rejects_invalid_guides() {
        let g = genome(&[("ACGT", 1)]);
        assert_eq!(
            find_matches(0, b"", b"NGG", &g, &params(0)),
            Err(SearchError::EmptyGuide)
        );
        assert_eq!(
            find_matches(0, b"ACNT", b"NGG", &g, &params(0)),
            Err(SearchError::InvalidGuide)
        );
    }

    #[test]
    fn test_guide_longer_than_genome() {
        let g = genome(&[("ACG", 1)]);
        assert!(find_matches(0, b"ACGTACGT", b"NGG", &g, &params(3)).unwrap().is_empty());
    }
}
