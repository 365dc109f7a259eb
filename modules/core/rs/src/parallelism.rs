use std::cmp::Ordering;
use std::thread::available_parallelism;

use eyre::Result;

/// Resolve the requested number of worker threads against `cores`:
/// - positive values are capped by the number of cores
/// - zero means a single thread
/// - negative values count back from all cores, i.e. -1 is every core and -2 leaves one idle
fn resolve(requested: isize, cores: isize) -> usize {
    match requested.cmp(&0) {
        Ordering::Less => (cores + requested + 1).max(1) as usize,
        Ordering::Equal => 1,
        Ordering::Greater => requested.min(cores) as usize,
    }
}

/// Number of worker threads to spawn for the requested value. See [resolve] for the rules.
pub fn threads(requested: isize) -> Result<usize> {
    let cores = available_parallelism()?.get() as isize;
    let threads = resolve(requested, cores);
    log::debug!("Requested {requested} threads, {cores} cores available, using {threads}");
    Ok(threads)
}
