use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};

use pelops_core_rs::error::Error;

use crate::composition::Composition;
use crate::sampler::Sampler;

/// Parameters of a scoring batch.
///
/// The k-mer length is checked against every sequence when the batch runs, since only then
/// the shortest sequence is known.
#[derive(Clone, Copy, PartialEq, Debug, Dissolve, Getters)]
pub struct Config {
    k: usize,
    rounds: usize,
    composition: Composition,
    // Same convention as parallelism::threads: negative values count back from all cores
    threads: isize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: 3,
            rounds: 100,
            composition: Composition::uniform(),
            threads: 1,
        }
    }
}

impl Config {
    pub fn new(k: usize, rounds: usize, composition: Composition) -> Result<Self> {
        Self::default()
            .with_k(k)
            .with_composition(composition)
            .with_rounds(rounds)
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Result<Self> {
        ensure!(rounds >= 1, Error::InvalidRounds { rounds });
        self.rounds = rounds;
        Ok(self)
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    pub fn with_threads(mut self, threads: isize) -> Self {
        self.threads = threads;
        self
    }

    pub fn sampler(&self) -> Result<Sampler> {
        Sampler::new(self.k, self.rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(*config.k(), 3);
        assert_eq!(*config.rounds(), 100);
        assert_eq!(*config.composition(), Composition::uniform());
        assert_eq!(*config.threads(), 1);
    }

    #[test]
    fn test_builder() -> Result<()> {
        let composition = Composition::new(0.3, 0.2, 0.2, 0.3)?;
        let config = Config::new(5, 10, composition)?.with_threads(-1);
        let (k, rounds, comp, threads) = config.dissolve();
        assert_eq!((k, rounds, comp, threads), (5, 10, composition, -1));

        let sampler = config.sampler()?;
        assert_eq!((sampler.k(), sampler.rounds()), (5, 10));
        Ok(())
    }

    #[test]
    fn test_zero_rounds() {
        let report = Config::new(3, 0, Composition::uniform()).unwrap_err();
        assert_eq!(Error::of(&report), Some(&Error::InvalidRounds { rounds: 0 }));
    }
}
