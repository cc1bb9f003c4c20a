//! Guide candidate scanning
//!
//! Slides a guide+PAM window along both strands of a target gene and keeps
//! every window whose 3' end matches the PAM pattern.

use super::iupac::site_matches_pattern;
use super::sequence::TargetGene;
use super::types::{GuideCandidate, ScanParams, Strand};

/// Every PAM-anchored guide in the target, forward strand first.
///
/// Empty or non-canonical targets yield nothing; the caller decides whether
/// to warn.
pub fn scan_target(target: &TargetGene, params: &ScanParams) -> Vec<GuideCandidate> {
    if target.sequence.is_empty() || !target.sequence.is_canonical() {
        return Vec::new();
    }

    let mut candidates = scan_strand(
        &target.name,
        target.sequence.as_bytes(),
        Strand::Forward,
        params,
    );
    let reverse = target.sequence.reverse_complement();
    candidates.extend(scan_strand(
        &target.name,
        reverse.as_bytes(),
        Strand::Reverse,
        params,
    ));
    candidates
}

/// Scan a single strand. Positions are offsets on that strand.
pub fn scan_strand(
    gene_name: &str,
    seq: &[u8],
    strand: Strand,
    params: &ScanParams,
) -> Vec<GuideCandidate> {
    let guide_len = params.guide_length;
    let site_len = params.site_length();
    if guide_len == 0 || seq.len() < site_len {
        return Vec::new();
    }

    let pam = params.pam.as_bytes();
    let max_start = seq.len() - site_len;

    (0..=max_start)
        .filter_map(|start| {
            let pam_start = start + guide_len;
            let pam_site = &seq[pam_start..pam_start + pam.len()];
            if !site_matches_pattern(pam_site, pam) {
                return None;
            }

            Some(GuideCandidate {
                gene_name: gene_name.to_string(),
                guide: String::from_utf8_lossy(&seq[start..pam_start]).into_owned(),
                pam: String::from_utf8_lossy(pam_site).into_owned(),
                strand,
                position: start,
                context: context_window(seq, start, params),
            })
        })
        .collect()
}

fn context_window(seq: &[u8], start: usize, params: &ScanParams) -> Option<String> {
    let from = start.checked_sub(params.upstream_context)?;
    let to = from.checked_add(params.context_length())?;
    if to > seq.len() {
        return None;
    }
    Some(String::from_utf8_lossy(&seq[from..to]).into_owned())
}

/// Treat a target record as a ready-made guide (binding-strength mode).
/// Returns `None` for empty or non-canonical records.
pub fn literal_guide(target: &TargetGene) -> Option<GuideCandidate> {
    if target.sequence.is_empty() || !target.sequence.is_canonical() {
        return None;
    }
    Some(GuideCandidate {
        gene_name: target.name.clone(),
        guide: target.sequence.to_string(),
        pam: String::new(),
        strand: Strand::Forward,
        position: 0,
        context: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(guide_length: usize) -> ScanParams {
        ScanParams {
            guide_length,
            pam: "NGG".to_string(),
            upstream_context: 0,
            downstream_context: 0,
        }
    }

    #[test]
    fn test_finds_forward_guide_before_gg() {
        let target = TargetGene::new("geneA", "ATGCGGAGGT");
        let candidates = scan_target(&target, &params(4));

        let forward: Vec<_> = candidates
            .iter()
            .filter(|c| c.strand == Strand::Forward)
            .collect();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].guide, "GCGG");
        assert_eq!(forward[0].pam, "AGG");
        assert_eq!(forward[0].position, 2);
        assert!(forward[0].pam.ends_with("GG"));
    }

    #[test]
    fn test_reverse_strand_candidates() {
        // Reverse complement of CCAAAAA is TTTTTGG: guide TTTT, PAM TGG
        let target = TargetGene::new("geneA", "CCAAAAA");
        let candidates = scan_target(&target, &params(4));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].strand, Strand::Reverse);
        assert_eq!(candidates[0].guide, "TTTT");
        assert_eq!(candidates[0].pam, "TGG");
        assert_eq!(candidates[0].position, 0);
    }

    #[test]
    fn test_short_sequence_yields_nothing() {
        let target = TargetGene::new("geneA", "AAGG");
        assert!(scan_target(&target, &params(4)).is_empty());
        assert!(scan_strand("geneA", b"ACGTAG", Strand::Forward, &params(4)).is_empty());
    }

    #[test]
    fn test_overlapping_windows_retained() {
        // Guides start at 0 (PAM GGG) and 1 (PAM GGG) and 2 (PAM GGT is not NGG)
        let target = TargetGene::new("geneA", "AAAAGGGGT");
        let candidates = scan_strand("geneA", target.sequence.as_bytes(), Strand::Forward, &params(4));
        let positions: Vec<_> = candidates.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_non_canonical_or_empty_yields_nothing() {
        assert!(scan_target(&TargetGene::new("geneA", "AAAANGGAAAAAGG"), &params(4)).is_empty());
        assert!(scan_target(&TargetGene::new("geneA", ""), &params(4)).is_empty());
    }

    #[test]
    fn test_context_window() {
        let scan = ScanParams {
            guide_length: 4,
            pam: "NGG".to_string(),
            upstream_context: 2,
            downstream_context: 1,
        };
        let candidates = scan_strand("g", b"TTACGTAGGC", Strand::Forward, &scan);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].guide, "ACGT");
        assert_eq!(candidates[0].context.as_deref(), Some("TTACGTAGGC"));

        let flush = scan_strand("g", b"ACGTAGGC", Strand::Forward, &scan);
        assert_eq!(flush.len(), 1);
        assert_eq!(flush[0].context, None);
    }

    #[test]
    fn test_oversized_flanks_leave_context_empty() {
        let scan = ScanParams {
            guide_length: 4,
            pam: "NGG".to_string(),
            upstream_context: 0,
            downstream_context: usize::MAX,
        };
        let candidates = scan_strand("g", b"TTACGTAGGC", Strand::Forward, &scan);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].context, None);

        let huge_guide = ScanParams {
            guide_length: usize::MAX,
            ..scan
        };
        assert!(scan_strand("g", b"TTACGTAGGC", Strand::Forward, &huge_guide).is_empty());
    }

    #[test]
    fn test_literal_guide() {
        let guide = literal_guide(&TargetGene::new("g1", "acgtacgt")).unwrap();
        assert_eq!(guide.guide, "ACGTACGT");
        assert!(guide.pam.is_empty());
        assert!(literal_guide(&TargetGene::new("g2", "ACGN")).is_none());
    }
}
