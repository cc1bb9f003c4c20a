mod types;
mod iupac;
mod sequence;
mod fasta;
mod diagnostics;
mod scanner;
mod efficiency;
mod search;
mod binding;
mod ranking;
mod pipeline;

pub use types::*;
pub use iupac::*;
pub use sequence::*;
pub use fasta::*;
pub use diagnostics::*;
pub use scanner::*;
pub use efficiency::*;
pub use search::*;
pub use binding::*;
pub use ranking::*;
pub use pipeline::*;
