//! Simple models of sequence evolution, used to derive synthetic orthologs from a template.

use eyre::{ensure, Result};
use rand::seq::SliceRandom;
use rand::Rng;

use pelops_core_rs::nucleotide::{self, ALPHABET};

fn check_probability(prob: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&prob),
        "Probability must be within [0, 1], got {prob}"
    );
    Ok(())
}

fn random_base<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    ALPHABET[rng.gen_range(0..ALPHABET.len())]
}

/// Replace every position, with probability `prob`, by a uniformly drawn base.
/// The drawn base may be equal to the original one.
pub fn point_mutations<R: Rng + ?Sized>(seq: &[u8], prob: f64, rng: &mut R) -> Result<Vec<u8>> {
    check_probability(prob)?;
    nucleotide::validate(seq)?;

    let mutated = seq
        .iter()
        .map(|&base| {
            if rng.gen_bool(prob) {
                random_base(rng)
            } else {
                base
            }
        })
        .collect();
    Ok(mutated)
}

/// Insert, with probability `prob`, a uniformly drawn base in front of every position.
pub fn insertions<R: Rng + ?Sized>(seq: &[u8], prob: f64, rng: &mut R) -> Result<Vec<u8>> {
    check_probability(prob)?;
    nucleotide::validate(seq)?;

    let mut result = Vec::with_capacity(seq.len() + (seq.len() as f64 * prob).ceil() as usize);
    for &base in seq {
        if rng.gen_bool(prob) {
            result.push(random_base(rng));
        }
        result.push(base);
    }
    Ok(result)
}

/// Uniform permutation of the bases: keeps the composition, destroys any k-mer structure.
pub fn shuffle<R: Rng + ?Sized>(seq: &[u8], rng: &mut R) -> Result<Vec<u8>> {
    nucleotide::validate(seq)?;

    let mut shuffled = seq.to_vec();
    shuffled.shuffle(rng);
    Ok(shuffled)
}
