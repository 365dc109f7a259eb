//! Log-odds scoring of observed k-mer frequencies against a background composition.
//!
//! For a k-mer `w` with reverse complement `w'`, scored in a sequence `s` against a pool of
//! `N` k-mers:
//! ```text
//! forward = log2( count(w, s) / N  /  P(w)  )
//! reverse = log2( count(w', s) / N /  P(w') )
//! ```
//! where `P` is the product of background base probabilities. A k-mer that never occurs in `s`
//! gets a score of exactly 0 on that strand rather than negative infinity.
//!
//! Everything is evaluated in log space: `P(w)` underflows for long k-mers.

use ahash::AHashMap;
use derive_getters::Dissolve;
use eyre::{ensure, Result, WrapErr};
use rayon::prelude::*;

use pelops_core_rs::error::Error;
use pelops_core_rs::{PerStrand, Strand};
use pelops_io_rs::{scores, WriteRecord};

use crate::composition::Composition;
use crate::kmer::{Counts, Kmer, KmerPool};
use crate::store::Sequence;

#[derive(Clone, PartialEq, Debug, Dissolve)]
pub struct ScoreEntry {
    kmer: Kmer,
    scores: PerStrand<f64>,
}

impl ScoreEntry {
    pub fn new(kmer: Kmer, scores: PerStrand<f64>) -> Self {
        Self { kmer, scores }
    }

    pub fn kmer(&self) -> &Kmer {
        &self.kmer
    }

    pub fn scores(&self) -> &PerStrand<f64> {
        &self.scores
    }

    /// Score of the k-mer itself.
    pub fn forward_score(&self) -> f64 {
        self.scores.forward
    }

    /// Score of the k-mer's reverse complement.
    pub fn reverse_score(&self) -> f64 {
        self.scores.reverse
    }

    pub fn score(&self, strand: Strand) -> f64 {
        *self.scores.get(strand)
    }
}

/// Scores of every pooled k-mer for a single sequence, sorted by k-mer.
#[derive(Clone, PartialEq, Debug, Default, Dissolve)]
pub struct SequenceScores {
    header: String,
    entries: Vec<ScoreEntry>,
}

impl SequenceScores {
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn get(&self, kmer: &[u8]) -> Option<&ScoreEntry> {
        self.entries
            .binary_search_by(|x| x.kmer.as_bytes().cmp(kmer))
            .ok()
            .map(|ind| &self.entries[ind])
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final output of a scoring batch: sequence header -> k-mer -> per-strand score.
///
/// Sequences are kept in input order, k-mers in lexicographic order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ScoreTable {
    sequences: Vec<SequenceScores>,
    index: AHashMap<String, usize>,
}

impl ScoreTable {
    fn new(sequences: Vec<SequenceScores>) -> Self {
        let index = sequences
            .iter()
            .enumerate()
            .map(|(ind, x)| (x.header.clone(), ind))
            .collect();
        Self { sequences, index }
    }

    pub fn get(&self, header: &str) -> Option<&SequenceScores> {
        self.index.get(header).map(|&ind| &self.sequences[ind])
    }

    /// Shortcut for `table.get(header)?.get(kmer)`.
    pub fn entry(&self, header: &str, kmer: &[u8]) -> Option<&ScoreEntry> {
        self.get(header)?.get(kmer)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceScores> {
        self.sequences.iter()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Flat (header, k-mer, scores) rows in table order.
    pub fn records(&self) -> impl Iterator<Item = scores::Record> + '_ {
        self.sequences.iter().flat_map(|seq| {
            seq.entries.iter().map(move |entry| {
                scores::Record::new(seq.header.clone(), entry.kmer.to_string(), entry.scores)
            })
        })
    }

    /// Write every row of the table and flush the writer.
    pub fn write(&self, writer: &mut impl WriteRecord<Record = scores::Record>) -> Result<()> {
        for record in self.records() {
            writer.write_record(&record)?;
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a ScoreTable {
    type Item = &'a SequenceScores;
    type IntoIter = std::slice::Iter<'a, SequenceScores>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Both strands of a pooled k-mer with their log2 background probabilities. Computed once per
// pooled k-mer and shared by all sequences in the batch.
struct Template {
    kmers: PerStrand<Kmer>,
    log2_expected: PerStrand<f64>,
}

impl Template {
    fn new(kmer: &Kmer, composition: &Composition) -> Result<Self> {
        let kmers = PerStrand::new(kmer.clone(), kmer.reverse_complement()?);
        let log2_expected = kmers
            .clone()
            .try_map(|_, x| composition.log2_expected(x.as_bytes()))?;
        // Only a zero probability base makes the sum infinite
        ensure!(
            log2_expected.forward.is_finite() && log2_expected.reverse.is_finite(),
            Error::DivisionByZero {
                kmer: kmer.to_string()
            }
        );
        Ok(Self {
            kmers,
            log2_expected,
        })
    }

    fn kmer(&self) -> &Kmer {
        &self.kmers.forward
    }
}

#[inline(always)]
fn log_odds(count: usize, log2_total: f64, log2_expected: f64) -> f64 {
    if count > 0 {
        (count as f64).log2() - log2_total - log2_expected
    } else {
        0.0
    }
}

fn score_sequence(
    seq: &Sequence,
    k: usize,
    log2_total: f64,
    templates: &[Template],
) -> Result<SequenceScores> {
    let counts = Counts::new(seq.bases(), k)?;

    let entries = templates
        .iter()
        .map(|tmpl| {
            let scores = tmpl.log2_expected.map(|strand, expected| {
                let count = counts.get(tmpl.kmers.get(strand).as_bytes());
                log_odds(count, log2_total, expected)
            });
            ScoreEntry::new(tmpl.kmer().clone(), scores)
        })
        .collect();

    log::trace!(
        "Scored {} k-mers for '{}' ({} distinct k-mers present)",
        templates.len(),
        seq.header(),
        counts.distinct()
    );
    Ok(SequenceScores {
        header: seq.header().clone(),
        entries,
    })
}

/// Score every distinct k-mer of the pool in every sequence.
///
/// The pool size is the denominator of all observed frequencies. Sequences are processed in
/// parallel on the current rayon thread pool; the result does not depend on the thread count.
pub fn score(
    sequences: &[Sequence],
    pool: &KmerPool,
    composition: &Composition,
) -> Result<ScoreTable> {
    ensure!(
        !pool.is_empty(),
        Error::malformed("Can't score sequences against an empty k-mer pool")
    );
    let log2_total = (pool.total() as f64).log2();

    let mut templates = pool
        .iter()
        .map(|(kmer, _)| Template::new(kmer, composition))
        .collect::<Result<Vec<_>>>()?;
    templates.sort_unstable_by(|a, b| a.kmer().cmp(b.kmer()));

    let sequences = sequences
        .par_iter()
        .map(|seq| {
            score_sequence(seq, pool.k(), log2_total, &templates)
                .wrap_err_with(|| format!("Failed to score sequence '{}'", seq.header()))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "Scored {} sequences against {} distinct k-mers (pool size {})",
        sequences.len(),
        templates.len(),
        pool.total()
    );
    Ok(ScoreTable::new(sequences))
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use pelops_core_rs::nucleotide;

    use super::*;

    // Linear de Bruijn sequence: every 2-mer over ACGT occurs exactly once
    const DE_BRUIJN_2: &str = "AACAGATCCGCTGGTTA";

    fn sequences(seqs: &[(&str, &str)]) -> Result<Vec<Sequence>> {
        seqs.iter()
            .map(|&(header, bases)| Sequence::new(header, bases))
            .collect()
    }

    fn self_pool(seqs: &[Sequence], k: usize) -> Result<KmerPool> {
        KmerPool::from_sequences(seqs.iter().map(|x| x.bases().as_slice()), k)
    }

    #[test]
    fn test_balanced_sequence_scores_zero() -> Result<()> {
        let seqs = sequences(&[("db", DE_BRUIJN_2)])?;
        let pool = self_pool(&seqs, 2)?;
        assert_eq!(pool.total(), 16);
        assert_eq!(pool.distinct(), 16);

        let table = score(&seqs, &pool, &Composition::uniform())?;
        let scores = table.get("db").unwrap();
        assert_eq!(scores.len(), 16);
        for entry in scores.entries() {
            assert!(entry.forward_score().abs() < 1e-12, "{entry:?}");
            assert!(entry.reverse_score().abs() < 1e-12, "{entry:?}");
        }
        Ok(())
    }

    #[test]
    fn test_unobserved_kmers_score_zero() -> Result<()> {
        let seqs = sequences(&[("poly-a", "AAAA"), ("poly-c", "CCCC")])?;
        let pool = self_pool(&seqs, 2)?;
        let table = score(&seqs, &pool, &Composition::uniform())?;

        // AA: 3 of 6 pooled k-mers vs 1/16 expected => log2(8); its reverse TT never occurs
        let entry = table.entry("poly-a", b"AA").unwrap();
        assert!((entry.forward_score() - 3.0).abs() < 1e-12);
        assert_eq!(entry.reverse_score(), 0.0);

        let entry = table.entry("poly-a", b"CC").unwrap();
        assert_eq!(entry.scores(), &PerStrand::new(0.0, 0.0));

        let entry = table.entry("poly-c", b"CC").unwrap();
        assert!((entry.score(Strand::Forward) - 3.0).abs() < 1e-12);
        assert_eq!(entry.score(Strand::Reverse), 0.0);
        assert!(table.entry("poly-c", b"GG").is_none());
        Ok(())
    }

    #[test]
    fn test_reverse_strand_uses_reverse_complement() -> Result<()> {
        let seqs = sequences(&[("seq", "AAAAAAGG")])?;
        let pool = KmerPool::from_sequences([&b"CCTTTTTT"[..]], 2)?;
        let table = score(&seqs, &pool, &Composition::uniform())?;

        // CC never occurs, but its reverse complement GG occurs once: 1/7 vs 1/16
        let entry = table.entry("seq", b"CC").unwrap();
        assert_eq!(entry.forward_score(), 0.0);
        assert!((entry.reverse_score() - (16.0f64 / 7.0).log2()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_non_uniform_composition() -> Result<()> {
        let seqs = sequences(&[("seq", "AAAA")])?;
        let pool = self_pool(&seqs, 1)?;
        let composition = Composition::new(0.1, 0.2, 0.3, 0.4)?;

        let entry = score(&seqs, &pool, &composition)?
            .entry("seq", b"A")
            .cloned()
            .unwrap();
        assert!((entry.forward_score() - 10f64.log2()).abs() < 1e-12);
        assert_eq!(entry.reverse_score(), 0.0);
        Ok(())
    }

    #[test]
    fn test_palindrome_scores_identically() -> Result<()> {
        let seqs = sequences(&[("seq1", "ACGTACGT")])?;
        let pool = self_pool(&seqs, 4)?;
        let table = score(&seqs, &pool, &Composition::uniform())?;

        let entry = table.entry("seq1", b"ACGT").unwrap();
        assert_eq!(entry.forward_score(), entry.reverse_score());
        assert!((entry.forward_score() - (0.4f64 * 256.0).log2()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_long_kmers_stay_finite() -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(540);
        let bases: Vec<u8> = (0..600)
            .map(|_| nucleotide::ALPHABET[rng.gen_range(0..4)])
            .collect();
        let seqs = vec![Sequence::new("long", bases)?];

        for k in [530, 540, 600] {
            let pool = self_pool(&seqs, k)?;
            let windows = 600 - k + 1;
            assert_eq!(pool.distinct(), windows);

            // Each window occurs once: log2(1 / windows) - log2(0.25^k)
            let expected = 2.0 * k as f64 - (windows as f64).log2();
            let table = score(&seqs, &pool, &Composition::uniform())?;
            for entry in table.get("long").unwrap().entries() {
                assert!((entry.forward_score() - expected).abs() < 1e-9, "k = {k}");
                assert!(entry.reverse_score().is_finite());
            }
        }
        Ok(())
    }

    #[test]
    fn test_zero_probability_base() -> Result<()> {
        let composition = Composition::new(0.5, 0.0, 0.0, 0.5)?;

        let seqs = sequences(&[("at-rich", "ATTAAT")])?;
        let pool = self_pool(&seqs, 3)?;
        assert!(score(&seqs, &pool, &composition).is_ok());

        let seqs = sequences(&[("mixed", "ATTGAT")])?;
        let pool = self_pool(&seqs, 3)?;
        let report = score(&seqs, &pool, &composition).unwrap_err();
        assert!(matches!(
            Error::of(&report),
            Some(Error::DivisionByZero { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_batches() -> Result<()> {
        let seqs = sequences(&[("short", "ACG")])?;

        let report = score(&seqs, &KmerPool::new(2)?, &Composition::uniform()).unwrap_err();
        assert!(matches!(
            Error::of(&report),
            Some(Error::MalformedInput { .. })
        ));

        let pool = KmerPool::from_sequences([&b"ACGTT"[..]], 4)?;
        let report = score(&seqs, &pool, &Composition::uniform()).unwrap_err();
        assert_eq!(
            Error::of(&report),
            Some(&Error::InvalidKmerLength { k: 4, length: 3 })
        );
        Ok(())
    }

    #[test]
    fn test_table_layout() -> Result<()> {
        let seqs = sequences(&[("b", "TTGCA"), ("a", "GGCAT")])?;
        let pool = self_pool(&seqs, 3)?;
        let table = score(&seqs, &pool, &Composition::uniform())?;

        let headers: Vec<_> = table.iter().map(|x| x.header()).collect();
        assert_eq!(headers, vec!["b", "a"]);
        for scores in &table {
            assert_eq!(scores.len(), pool.distinct());
            let kmers: Vec<_> = scores.entries().iter().map(|x| x.kmer().clone()).collect();
            assert!(kmers.windows(2).all(|w| w[0].cmp(&w[1]) == Ordering::Less));
        }

        let records: Vec<_> = table.records().collect();
        assert_eq!(records.len(), 2 * pool.distinct());
        assert_eq!(records[0].header(), "b");
        assert_eq!(records[0].kmer(), "CAT");

        let mut produced = Vec::new();
        table.write(&mut scores::Writer::new(&mut produced))?;
        assert_eq!(
            String::from_utf8(produced)?.lines().count(),
            records.len() + 1
        );
        Ok(())
    }
}
