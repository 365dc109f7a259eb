use std::io::BufRead;
use std::path::Path;

use ahash::AHashMap;
use eyre::{ensure, Result};

use pelops_core_rs::error::Error;
use pelops_io_rs::{fasta, ReadRecord};

/// A DNA sequence with a unique header. Bases are guaranteed to be uppercase A, C, G, T.
pub type Sequence = fasta::Record;

/// Immutable, ordered collection of the sequences scored in one batch.
///
/// Headers are unique: they key the resulting score table.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    sequences: Vec<Sequence>,
    index: AHashMap<String, usize>,
}

impl SequenceStore {
    /// Build a store from already parsed sequences. Fails on an empty batch or duplicated headers.
    pub fn new(sequences: Vec<Sequence>) -> Result<Self> {
        ensure!(
            !sequences.is_empty(),
            Error::malformed("No FASTA records found in the input")
        );

        let mut index = AHashMap::with_capacity(sequences.len());
        for (ind, seq) in sequences.iter().enumerate() {
            let previous = index.insert(seq.header().clone(), ind);
            ensure!(
                previous.is_none(),
                Error::malformed(format!("Duplicated FASTA header: '{}'", seq.header()))
            );
        }
        Ok(Self { sequences, index })
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut sequences = Vec::new();
        fasta::Reader::new(reader).read_to_end(&mut sequences)?;
        log::debug!("Loaded {} FASTA records", sequences.len());
        Self::new(sequences)
    }

    pub fn from_fasta(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut sequences = Vec::new();
        fasta::Reader::from_path(path.as_ref())?.read_to_end(&mut sequences)?;
        log::debug!(
            "Loaded {} FASTA records from {}",
            sequences.len(),
            path.as_ref().display()
        );
        Self::new(sequences)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Always false for a constructed store.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn get(&self, header: &str) -> Option<&Sequence> {
        self.index.get(header).map(|&ind| &self.sequences[ind])
    }

    /// Sequences in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// Length of the shortest sequence in the store.
    pub fn min_len(&self) -> usize {
        self.sequences.iter().map(Sequence::len).min().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a SequenceStore {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
