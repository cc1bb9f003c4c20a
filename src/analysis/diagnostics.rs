//! Non-fatal run warnings and the sink components report them to

use std::sync::Mutex;
use thiserror::Error;

use super::types::Strand;

/// A problem local to one sequence or candidate. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunWarning {
    #[error("sequence '{name}' is empty or contains symbols other than A, C, G, T; no guides scanned")]
    EmptySequence { name: String },

    #[error("no guide candidates found in '{name}'")]
    NoCandidates { name: String },

    #[error("on-target scoring failed for {gene}:{guide} ({strand}{position}): {reason}")]
    OracleFailure {
        gene: String,
        guide: String,
        strand: Strand,
        position: usize,
        reason: String,
    },

    #[error("off-target search failed for {gene}:{guide} ({strand}{position}): {reason}")]
    WorkerFailure {
        gene: String,
        guide: String,
        strand: Strand,
        position: usize,
        reason: String,
    },
}

/// Where components send warnings and progress. Shared across workers.
pub trait WarningSink: Sync {
    fn warn(&self, warning: RunWarning);

    fn progress(&self, _message: &str) {}
}

/// Keeps every warning in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: Mutex<Vec<RunWarning>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<RunWarning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, warning: RunWarning) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning);
        }
    }
}
