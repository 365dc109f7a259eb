#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use eyre::{ensure, Result};
use itertools::Itertools;

use pelops_core_rs::error::Error;
use pelops_core_rs::nucleotide::{self, ALPHABET};

/// Background nucleotide composition: probabilities of A, C, G and T, in this order.
///
/// All probabilities are finite, non-negative and sum to 1 within [Composition::EPSILON].
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Composition {
    probabilities: [f64; 4],
}

impl Default for Composition {
    fn default() -> Self {
        Self::uniform()
    }
}

impl TryFrom<[f64; 4]> for Composition {
    type Error = eyre::Report;

    fn try_from(value: [f64; 4]) -> Result<Self> {
        let [a, c, g, t] = value;
        Self::new(a, c, g, t)
    }
}

impl Composition {
    pub const EPSILON: f64 = 1e-6;

    pub fn new(a: f64, c: f64, g: f64, t: f64) -> Result<Self> {
        let probabilities = [a, c, g, t];
        for (base, p) in ALPHABET.iter().zip(probabilities) {
            ensure!(
                p.is_finite() && p >= 0.0,
                Error::composition(format!(
                    "probability of {} must be a finite non-negative number, got {p}",
                    *base as char
                ))
            );
        }

        let total: f64 = probabilities.iter().sum();
        ensure!(
            (total - 1.0).abs() <= Self::EPSILON,
            Error::composition(format!(
                "probabilities must sum to 1, got {total} ({})",
                probabilities.iter().join(", ")
            ))
        );

        let zeros: Vec<_> = ALPHABET
            .iter()
            .zip(probabilities)
            .filter(|(_, p)| *p == 0.0)
            .map(|(base, _)| *base as char)
            .collect();
        if !zeros.is_empty() {
            log::warn!(
                "Background composition assigns zero probability to {}: \
                 k-mers with these bases can't be scored",
                zeros.iter().join(", ")
            );
        }

        Ok(Self { probabilities })
    }

    /// Equal probability for every base.
    pub fn uniform() -> Self {
        Self {
            probabilities: [0.25; 4],
        }
    }

    /// Empirical base frequencies of the given sequence.
    pub fn from_sequence(seq: &[u8]) -> Result<Self> {
        ensure!(
            !seq.is_empty(),
            Error::composition("can't estimate the composition of an empty sequence")
        );

        let mut counts = [0usize; 4];
        for (position, &base) in seq.iter().enumerate() {
            let ind = nucleotide::index(base).ok_or(Error::InvalidBase {
                symbol: base as char,
                position,
            })?;
            counts[ind] += 1;
        }

        let total = seq.len() as f64;
        let [a, c, g, t] = counts.map(|x| x as f64 / total);
        Self::new(a, c, g, t)
    }

    pub fn probabilities(&self) -> &[f64; 4] {
        &self.probabilities
    }

    pub fn probability(&self, base: u8) -> Result<f64> {
        match nucleotide::index(base) {
            Some(ind) => Ok(self.probabilities[ind]),
            None => Err(Error::InvalidBase {
                symbol: base as char,
                position: 0,
            }
            .into()),
        }
    }

    /// Probability of observing the k-mer under an independent-bases background model.
    pub fn expected(&self, kmer: &[u8]) -> Result<f64> {
        let mut expected = 1.0;
        for (position, &base) in kmer.iter().enumerate() {
            let ind = nucleotide::index(base).ok_or(Error::InvalidBase {
                symbol: base as char,
                position,
            })?;
            expected *= self.probabilities[ind];
        }
        Ok(expected)
    }

    /// Base-2 logarithm of [Composition::expected]. Summed per base, so it stays finite for long
    /// k-mers where the plain product underflows. Negative infinity if any base has probability 0.
    pub fn log2_expected(&self, kmer: &[u8]) -> Result<f64> {
        let mut expected = 0.0;
        for (position, &base) in kmer.iter().enumerate() {
            let ind = nucleotide::index(base).ok_or(Error::InvalidBase {
                symbol: base as char,
                position,
            })?;
            expected += self.probabilities[ind].log2();
        }
        Ok(expected)
    }
}
