#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::{Dissolve, Getters};
use eyre::{Result, WrapErr};

use pelops_core_rs::nucleotide;

use super::validate;

/// A single DNA sequence loaded from FASTA with the following guarantees:
/// - The header is a non-empty UTF-8 string without newline (CR or LF) or tab characters.
/// - The bases are non-empty and drawn from the uppercase {A, C, G, T} alphabet.
///
/// Lowercase (soft-masked) bases are uppercased on construction; any other symbol, including
/// IUPAC ambiguity codes, is rejected.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Dissolve, Getters)]
pub struct Record {
    header: String,
    bases: Vec<u8>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            header: "Default header".to_string(),
            bases: b"ACGT".to_vec(),
        }
    }
}

impl<H: Into<String>, B: Into<Vec<u8>>> TryFrom<(H, B)> for Record {
    type Error = eyre::Report;

    fn try_from(value: (H, B)) -> Result<Self> {
        Self::new(value.0, value.1)
    }
}

impl Record {
    /// Creates a new record, normalizing the case of the bases.
    pub fn new(header: impl Into<String>, bases: impl Into<Vec<u8>>) -> Result<Self> {
        let header = header.into();
        let mut bases = bases.into();
        validate::header(&header)?;
        nucleotide::normalize_in_place(&mut bases, 0)
            .wrap_err_with(|| format!("Invalid sequence for FASTA record '{header}'"))?;
        validate::bases(&header, &bases)?;
        Ok(Self { header, bases })
    }

    /// Length of the sequence in bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Always false for a valid record.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// # Safety
    /// The caller must ensure that all fields remain valid after modification.
    pub(crate) unsafe fn fields(&mut self) -> (&mut String, &mut Vec<u8>) {
        (&mut self.header, &mut self.bases)
    }
}
