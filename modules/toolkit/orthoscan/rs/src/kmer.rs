//! K-mer extraction, occurrence counting and the pooled scoring universe.

use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

use ahash::AHashMap;
#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_more::Into;
use eyre::{ensure, Result};

use pelops_core_rs::error::Error;
use pelops_core_rs::nucleotide;

/// An owned k-mer over the strict {A, C, G, T} alphabet.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Into)]
pub struct Kmer(Vec<u8>);

impl Kmer {
    pub fn new(bases: impl Into<Vec<u8>>) -> Result<Self> {
        let bases = bases.into();
        ensure!(
            !bases.is_empty(),
            Error::InvalidKmerLength { k: 0, length: 0 }
        );
        nucleotide::validate(&bases)?;
        Ok(Self(bases))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn reverse_complement(&self) -> Result<Self> {
        Ok(Self(nucleotide::reverse_complement(&self.0)?))
    }
}

impl Borrow<[u8]> for Kmer {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Kmer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&str> for Kmer {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl Display for Kmer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Bases are always ASCII
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Ensure that `k` is a valid window length for a sequence of the given length.
pub fn check(length: usize, k: usize) -> Result<()> {
    ensure!(
        k >= 1 && k <= length,
        Error::InvalidKmerLength { k, length }
    );
    Ok(())
}

/// All `L - k + 1` overlapping windows of length `k`, left to right.
pub fn extract(seq: &[u8], k: usize) -> Result<Vec<&[u8]>> {
    check(seq.len(), k)?;
    Ok(seq.windows(k).collect())
}

/// Number of overlapping occurrences of `kmer` in `seq`.
pub fn count(seq: &[u8], kmer: &[u8]) -> usize {
    if kmer.is_empty() || kmer.len() > seq.len() {
        return 0;
    }
    seq.windows(kmer.len()).filter(|&w| w == kmer).count()
}

/// Occurrence table of every k-mer in one sequence, built in a single pass.
#[derive(Debug, Clone)]
pub struct Counts<'a> {
    k: usize,
    windows: usize,
    counts: AHashMap<&'a [u8], usize>,
}

impl<'a> Counts<'a> {
    pub fn new(seq: &'a [u8], k: usize) -> Result<Self> {
        let windows = extract(seq, k)?;
        let mut counts = AHashMap::with_capacity(windows.len());
        for window in &windows {
            *counts.entry(*window).or_insert(0) += 1;
        }
        Ok(Self {
            k,
            windows: windows.len(),
            counts,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Total number of windows in the sequence.
    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Number of distinct k-mers in the sequence.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, kmer: &[u8]) -> usize {
        self.counts.get(kmer).copied().unwrap_or(0)
    }
}

/// Multiset of k-mers of a fixed length: the universe a batch of sequences is scored against.
///
/// Its [total](KmerPool::total) size is the denominator of every observed frequency in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerPool {
    k: usize,
    total: usize,
    counts: AHashMap<Kmer, usize>,
}

impl KmerPool {
    pub fn new(k: usize) -> Result<Self> {
        ensure!(k >= 1, Error::InvalidKmerLength { k, length: 0 });
        Ok(Self {
            k,
            total: 0,
            counts: AHashMap::new(),
        })
    }

    /// Pool of all overlapping windows of the given sequences.
    pub fn from_sequences<'a>(
        sequences: impl IntoIterator<Item = &'a [u8]>,
        k: usize,
    ) -> Result<Self> {
        let mut pool = Self::new(k)?;
        for seq in sequences {
            pool.extend(extract(seq, k)?)?;
        }
        Ok(pool)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Sum of multiplicities of all k-mers in the pool.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct k-mers in the pool.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn multiplicity(&self, kmer: &[u8]) -> usize {
        self.counts.get(kmer).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kmer: &[u8]) -> Result<()> {
        self.add_n(kmer, 1)
    }

    fn add_n(&mut self, kmer: &[u8], n: usize) -> Result<()> {
        ensure!(
            kmer.len() == self.k,
            "K-mer {} has length {}, while the pool holds {}-mers",
            String::from_utf8_lossy(kmer),
            kmer.len(),
            self.k
        );
        // Allocate only for k-mers that are new to the pool
        match self.counts.get_mut(kmer) {
            Some(cnt) => *cnt += n,
            None => {
                self.counts.insert(Kmer(kmer.to_vec()), n);
            }
        }
        self.total += n;
        Ok(())
    }

    pub fn extend<'a>(&mut self, kmers: impl IntoIterator<Item = &'a [u8]>) -> Result<()> {
        for kmer in kmers {
            self.add(kmer)?;
        }
        Ok(())
    }

    /// Fold another pool of the same k into this one.
    pub fn merge(&mut self, other: KmerPool) -> Result<()> {
        ensure!(
            other.k == self.k,
            "Can't merge pools of {}-mers and {}-mers",
            self.k,
            other.k
        );
        for (kmer, n) in other.counts {
            match self.counts.get_mut(&kmer) {
                Some(cnt) => *cnt += n,
                None => {
                    self.counts.insert(kmer, n);
                }
            }
        }
        self.total += other.total;
        Ok(())
    }

    /// Distinct k-mers with their multiplicities, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Kmer, usize)> {
        self.counts.iter().map(|(kmer, &n)| (kmer, n))
    }
}
