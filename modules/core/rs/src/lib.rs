pub use per_strand::PerStrand;
pub use strand::Strand;

pub mod error;
pub mod nucleotide;
pub mod parallelism;
mod per_strand;
mod strand;
