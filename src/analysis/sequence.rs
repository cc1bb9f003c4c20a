//! Normalized target and genome sequences shared read-only by every stage

use bio::alphabets::dna::revcomp;
use std::fmt;

use super::iupac::is_canonical;

/// Upper-cased nucleotide symbols with whitespace removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NucleotideSequence(Vec<u8>);

impl NucleotideSequence {
    pub fn new(raw: impl AsRef<[u8]>) -> Self {
        Self(
            raw.as_ref()
                .iter()
                .filter(|b| !b.is_ascii_whitespace())
                .map(|b| b.to_ascii_uppercase())
                .collect(),
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every symbol is one of A, C, G, T
    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.0)
    }

    pub fn reverse_complement(&self) -> Self {
        Self(revcomp(&self.0))
    }
}

impl From<&str> for NucleotideSequence {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for NucleotideSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A named gene to design guides against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGene {
    pub name: String,
    pub sequence: NucleotideSequence,
}

impl TargetGene {
    pub fn new(name: impl Into<String>, sequence: impl Into<NucleotideSequence>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

/// The screening background: forward genome immediately followed by its
/// reverse complement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeSequence {
    sequence: NucleotideSequence,
    forward_len: usize,
}

impl GenomeSequence {
    /// Concatenate every part `copies` times, then append the reverse
    /// complement of the whole forward genome.
    pub fn from_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = (&'a NucleotideSequence, usize)>,
    {
        let mut forward = Vec::new();
        for (part, copies) in parts {
            for _ in 0..copies {
                forward.extend_from_slice(part.as_bytes());
            }
        }
        let forward_len = forward.len();
        let reverse = revcomp(&forward);
        forward.extend_from_slice(&reverse);

        Self {
            sequence: NucleotideSequence(forward),
            forward_len,
        }
    }

    /// Rebuild from an already doubled sequence. Returns `None` unless the
    /// second half is the reverse complement of the first.
    pub fn from_doubled(sequence: NucleotideSequence) -> Option<Self> {
        if sequence.len() % 2 != 0 {
            return None;
        }
        let forward_len = sequence.len() / 2;
        let (forward, reverse) = sequence.as_bytes().split_at(forward_len);
        if revcomp(forward) != reverse {
            return None;
        }
        Some(Self {
            sequence,
            forward_len,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.sequence.as_bytes()
    }

    pub fn sequence(&self) -> &NucleotideSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Length of one strand
    pub fn forward_len(&self) -> usize {
        self.forward_len
    }

    pub fn forward(&self) -> &[u8] {
        &self.as_bytes()[..self.forward_len]
    }

    pub fn reverse(&self) -> &[u8] {
        &self.as_bytes()[self.forward_len..]
    }

    /// Whether `seq` occurs verbatim on either strand. Windows spanning the
    /// boundary between the two strands are not considered.
    pub fn contains(&self, seq: &[u8]) -> bool {
        if seq.is_empty() {
            return false;
        }
        [self.forward(), self.reverse()]
            .iter()
            .any(|strand| strand.windows(seq.len()).any(|w| w == seq))
    }
}
