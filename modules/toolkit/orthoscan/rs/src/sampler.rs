//! Null model of k-mer occurrence built by positional resampling.
//!
//! A surrogate sequence is assembled from k-mers drawn at uniformly random offsets of the
//! original sequence until it is at least as long as the original, then truncated to the
//! original length. The surrogate keeps the k-mer content of the source while destroying
//! the order in which k-mers occur.

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use eyre::{ensure, Result};
use rand::Rng;

use pelops_core_rs::error::Error;

use crate::kmer;

/// One resampled, length-matched surrogate of a sequence.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, PartialEq, Eq, Debug, Default, Dissolve)]
pub struct ShuffleSample {
    k: usize,
    surrogate: Vec<u8>,
}

impl ShuffleSample {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn surrogate(&self) -> &[u8] {
        &self.surrogate
    }

    pub fn len(&self) -> usize {
        self.surrogate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surrogate.is_empty()
    }

    /// Overlapping k-mers of the surrogate, left to right.
    pub fn kmers(&self) -> std::slice::Windows<'_, u8> {
        self.surrogate.windows(self.k)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Dissolve)]
pub struct Sampler {
    k: usize,
    rounds: usize,
}

impl Sampler {
    pub fn new(k: usize, rounds: usize) -> Result<Self> {
        ensure!(rounds >= 1, Error::InvalidRounds { rounds });
        Ok(Self { k, rounds })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Assemble one surrogate of `seq` in the provided buffer, replacing its content.
    pub fn shuffle_into<R: Rng + ?Sized>(
        &self,
        seq: &[u8],
        rng: &mut R,
        into: &mut Vec<u8>,
    ) -> Result<()> {
        kmer::check(seq.len(), self.k)?;

        into.clear();
        into.reserve(seq.len() + self.k);

        let last = seq.len() - self.k;
        while into.len() < seq.len() {
            let start = rng.gen_range(0..=last);
            into.extend_from_slice(&seq[start..start + self.k]);
        }
        into.truncate(seq.len());
        Ok(())
    }

    /// Run all rounds, handing every sample to `f` as soon as it is drawn.
    /// A single buffer is reused across rounds.
    pub fn for_each<R: Rng + ?Sized>(
        &self,
        seq: &[u8],
        rng: &mut R,
        mut f: impl FnMut(&ShuffleSample) -> Result<()>,
    ) -> Result<()> {
        let mut sample = ShuffleSample {
            k: self.k,
            surrogate: Vec::with_capacity(seq.len() + self.k),
        };
        for _ in 0..self.rounds {
            self.shuffle_into(seq, rng, &mut sample.surrogate)?;
            f(&sample)?;
        }
        Ok(())
    }

    /// All rounds as separate samples, in the order they were drawn.
    pub fn sample<R: Rng + ?Sized>(&self, seq: &[u8], rng: &mut R) -> Result<Vec<ShuffleSample>> {
        let mut samples = Vec::with_capacity(self.rounds);
        for _ in 0..self.rounds {
            let mut surrogate = Vec::with_capacity(seq.len() + self.k);
            self.shuffle_into(seq, rng, &mut surrogate)?;
            samples.push(ShuffleSample {
                k: self.k,
                surrogate,
            });
        }
        Ok(samples)
    }
}

/// Draw `rounds` null-model samples of `seq` with k-mers of length `k`.
pub fn sample<R: Rng + ?Sized>(
    seq: &[u8],
    k: usize,
    rounds: usize,
    rng: &mut R,
) -> Result<Vec<ShuffleSample>> {
    Sampler::new(k, rounds)?.sample(seq, rng)
}
