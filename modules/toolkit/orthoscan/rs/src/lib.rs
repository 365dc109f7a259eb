pub use composition::Composition;
pub use config::Config;
pub use kmer::{Kmer, KmerPool};
pub use pipeline::Pipeline;
pub use sampler::{Sampler, ShuffleSample};
pub use scoring::{ScoreEntry, ScoreTable, SequenceScores};
pub use store::{Sequence, SequenceStore};

pub mod composition;
mod config;
pub mod kmer;
mod pipeline;
pub mod sampler;
pub mod scoring;
pub mod simulate;
mod store;
