pub mod fasta;
pub mod scores;
mod traits;

pub use traits::{ReadRecord, WriteRecord};
