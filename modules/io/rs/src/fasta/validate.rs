use eyre::{ensure, Result};

use pelops_core_rs::error::Error;
use pelops_core_rs::nucleotide;

pub fn header(header: &str) -> Result<()> {
    ensure!(
        !header.is_empty(),
        Error::malformed("FASTA header cannot be empty")
    );
    ensure!(
        !header.contains(&['\n', '\r'] as &[char]),
        Error::malformed(format!(
            "Newline characters are not allowed in the FASTA header: {header:?}"
        ))
    );
    // Headers end up as the first column of tab-separated score tables
    ensure!(
        !header.contains('\t'),
        Error::malformed(format!(
            "Tab characters are not allowed in the FASTA header: {header:?}"
        ))
    );
    Ok(())
}

/// Bases must be non-empty and already normalized to the uppercase {A, C, G, T} alphabet.
pub fn bases(header: &str, bases: &[u8]) -> Result<()> {
    ensure!(
        !bases.is_empty(),
        Error::malformed(format!("FASTA record '{header}' has no sequence"))
    );
    nucleotide::validate(bases)
}
