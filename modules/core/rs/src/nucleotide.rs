//! Strict DNA alphabet helpers.
//!
//! All sequences in the workspace are plain uppercase ASCII over {A, C, G, T}. Lowercase input is
//! normalized once, at load time, and every other symbol is rejected with
//! [`Error::InvalidBase`].

use eyre::Result;

use crate::error::Error;

/// The DNA alphabet in canonical order. Composition vectors are indexed with this order.
pub const ALPHABET: [u8; 4] = *b"ACGT";

/// Position of the base in [ALPHABET] or None for anything outside the strict alphabet.
#[inline(always)]
pub fn index(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Watson-Crick complement of a single base.
#[inline(always)]
pub fn complement(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(b'T'),
        b'T' => Some(b'A'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        _ => None,
    }
}

/// Uppercase soft-masked bases. Returns None for symbols that are not a DNA base in any case.
#[inline(always)]
pub fn normalize(base: u8) -> Option<u8> {
    let upper = base.to_ascii_uppercase();
    index(upper).map(|_| upper)
}

fn invalid(symbol: u8, position: usize) -> Error {
    Error::InvalidBase {
        symbol: symbol as char,
        position,
    }
}

/// Ensure that every symbol belongs to the strict uppercase alphabet.
pub fn validate(seq: &[u8]) -> Result<()> {
    match seq.iter().position(|&x| index(x).is_none()) {
        Some(position) => Err(invalid(seq[position], position).into()),
        None => Ok(()),
    }
}

/// Normalize the sequence in place. `offset` is added to the reported position on failure, so
/// that errors point into the full sequence when it is normalized chunk by chunk.
pub fn normalize_in_place(seq: &mut [u8], offset: usize) -> Result<()> {
    for (i, base) in seq.iter_mut().enumerate() {
        let symbol = *base;
        *base = normalize(symbol).ok_or_else(|| invalid(symbol, offset + i))?;
    }
    Ok(())
}

/// Write the reverse complement of `seq` into `into`, replacing its content.
///
/// Every output symbol is computed from the original input symbol in a single pass, so an
/// already complemented base is never complemented again.
pub fn reverse_complement_into(seq: &[u8], into: &mut Vec<u8>) -> Result<()> {
    into.clear();
    into.reserve(seq.len());
    for (position, &base) in seq.iter().enumerate().rev() {
        into.push(complement(base).ok_or_else(|| invalid(base, position))?);
    }
    Ok(())
}

pub fn reverse_complement(seq: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(seq.len());
    reverse_complement_into(seq, &mut result)?;
    Ok(result)
}
