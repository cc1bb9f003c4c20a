//! Optimal Guide Finder - CRISPR guide selection
//!
//! Scans target genes for PAM-anchored guide RNAs, filters them by predicted
//! on-target efficiency, searches a copy-number-aware reference genome for
//! every near match, and ranks guides per gene by a binding-entropy score.

pub mod analysis;
pub mod app;
pub mod error;
pub mod logging;
pub mod report;

pub use analysis::*;
pub use error::Error;
