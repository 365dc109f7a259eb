use eyre::{Result, WrapErr};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use pelops_core_rs::parallelism;

use crate::config::Config;
use crate::kmer::{self, KmerPool};
use crate::sampler::Sampler;
use crate::scoring::{self, ScoreTable};
use crate::store::{Sequence, SequenceStore};

/// End-to-end scoring of a batch: real k-mers and their null-model samples are pooled across all
/// sequences, then every sequence is scored against the pooled universe.
pub struct Pipeline {
    config: Config,
    pool: ThreadPool,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let threads = parallelism::threads(*config.threads())?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|ind| format!("orthoscan-{ind}"))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scoring universe of the batch: all windows of every sequence plus all windows of
    /// `rounds` resampled surrogates of every sequence.
    ///
    /// Each sequence is resampled with its own generator seeded from `rng` in input order,
    /// so the pool does not depend on the number of threads.
    pub fn kmer_pool<R: Rng + ?Sized>(
        &self,
        store: &SequenceStore,
        rng: &mut R,
    ) -> Result<KmerPool> {
        let sampler = self.config.sampler()?;

        // The whole batch fails before any sampling if a single sequence is too short
        for seq in store {
            kmer::check(seq.len(), sampler.k())
                .wrap_err_with(|| format!("Invalid k-mer length for sequence '{}'", seq.header()))?;
        }

        let seeds: Vec<u64> = (0..store.len()).map(|_| rng.gen()).collect();
        let pools = self.pool.install(|| {
            store
                .sequences()
                .par_iter()
                .zip(seeds.par_iter())
                .map(|(seq, &seed)| sequence_pool(seq, &sampler, seed))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut universe = KmerPool::new(sampler.k())?;
        for pool in pools {
            universe.merge(pool)?;
        }
        log::debug!(
            "Pooled {} k-mers ({} distinct) from {} sequences and {} rounds of resampling",
            universe.total(),
            universe.distinct(),
            store.len(),
            sampler.rounds()
        );
        Ok(universe)
    }

    pub fn run<R: Rng + ?Sized>(&self, store: &SequenceStore, rng: &mut R) -> Result<ScoreTable> {
        log::debug!(
            "Scoring {} sequences: k={}, rounds={}",
            store.len(),
            self.config.k(),
            self.config.rounds()
        );
        let universe = self.kmer_pool(store, rng)?;
        self.pool.install(|| {
            scoring::score(store.sequences(), &universe, self.config.composition())
        })
    }

    /// Parse the FASTA text and score it in one go.
    pub fn run_fasta<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Result<ScoreTable> {
        let store = SequenceStore::from_fasta(text)?;
        self.run(&store, rng)
    }
}

fn sequence_pool(seq: &Sequence, sampler: &Sampler, seed: u64) -> Result<KmerPool> {
    let mut pool = KmerPool::from_sequences([seq.bases().as_slice()], sampler.k())?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    sampler
        .for_each(seq.bases(), &mut rng, |sample| pool.extend(sample.kmers()))
        .wrap_err_with(|| format!("Failed to resample sequence '{}'", seq.header()))?;

    log::trace!(
        "Sequence '{}' contributed {} k-mers",
        seq.header(),
        pool.total()
    );
    Ok(pool)
}
