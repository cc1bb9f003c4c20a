//! IUPAC nucleotide codes and PAM pattern matching

/// Check if a character is a standard DNA base
pub fn is_standard_base(c: char) -> bool {
    matches!(c, 'A' | 'C' | 'G' | 'T')
}

/// Check if a character is an ambiguous base
pub fn is_ambiguous_base(c: char) -> bool {
    matches!(c, 'R' | 'Y' | 'S' | 'W' | 'K' | 'M' | 'B' | 'D' | 'H' | 'V' | 'N')
}

/// Check if a character is any upper-case IUPAC nucleotide code
pub fn is_iupac_code(c: char) -> bool {
    is_standard_base(c) || is_ambiguous_base(c)
}

/// True when every byte is one of A, C, G, T
#[inline]
pub fn is_canonical(seq: &[u8]) -> bool {
    seq.iter().all(|&b| is_standard_base(b as char))
}

// ── Bitmask representation: bit 0 = A, bit 1 = C, bit 2 = G, bit 3 = T ──

/// Convert a DNA base byte to its bitmask. Also handles IUPAC ambiguity codes.
/// Returns 0 for unrecognized bytes.
#[inline]
pub fn base_to_bit(b: u8) -> u8 {
    match b {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' => 0b1000,
        b'R' => 0b0101,
        b'Y' => 0b1010,
        b'S' => 0b0110,
        b'W' => 0b1001,
        b'K' => 0b1100,
        b'M' => 0b0011,
        b'B' => 0b1110,
        b'D' => 0b1101,
        b'H' => 0b1011,
        b'V' => 0b0111,
        b'N' => 0b1111,
        _ => 0,
    }
}

/// Check a concrete site against an IUPAC pattern of the same length.
///
/// Only A, C, G and T in `site` can satisfy a pattern position, so an `N`
/// in the genome never counts as a PAM base.
#[inline]
pub fn site_matches_pattern(site: &[u8], pattern: &[u8]) -> bool {
    if site.len() != pattern.len() {
        return false;
    }
    site.iter().zip(pattern).all(|(&s, &p)| {
        let base_mask = base_to_bit(s);
        base_mask.count_ones() == 1 && base_mask & base_to_bit(p) != 0
    })
}
