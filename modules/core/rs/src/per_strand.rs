#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use derive_more::Constructor;

use super::strand::Strand;

/// A struct that holds data for each strand.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Dissolve, Constructor)]
pub struct PerStrand<T> {
    pub forward: T,
    pub reverse: T,
}

impl<T> PerStrand<T> {
    /// Gets a reference to the data for the specified strand.
    pub fn get(&self, strand: Strand) -> &T {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    /// Maps each strand to a new value.
    pub fn map<U>(self, mut f: impl FnMut(Strand, T) -> U) -> PerStrand<U> {
        PerStrand {
            forward: f(Strand::Forward, self.forward),
            reverse: f(Strand::Reverse, self.reverse),
        }
    }

    /// Fallible version of `map`.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(Strand, T) -> Result<U, E>,
    ) -> Result<PerStrand<U>, E> {
        Ok(PerStrand {
            forward: f(Strand::Forward, self.forward)?,
            reverse: f(Strand::Reverse, self.reverse)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_strand_access() {
        let data = PerStrand::new(1, 2);
        assert_eq!(*data.get(Strand::Forward), 1);
        assert_eq!(*data.get(Strand::Reverse), 2);
        assert_eq!(data.dissolve(), (1, 2));
    }

    #[test]
    fn test_per_strand_map() {
        let counts = PerStrand::new(3usize, 0usize);
        let ratio = counts.map(|strand, cnt| match strand {
            Strand::Forward => cnt as f64 / 0.5,
            Strand::Reverse => cnt as f64 + 1.0,
        });
        assert_eq!(ratio, PerStrand::new(6.0, 1.0));

        let failed: Result<PerStrand<u8>, Strand> =
            PerStrand::new(1u32, 300u32).try_map(|strand, x| u8::try_from(x).map_err(|_| strand));
        assert_eq!(failed, Err(Strand::Reverse));

        let converted: Result<PerStrand<u8>, Strand> =
            PerStrand::new(1u32, 2u32).try_map(|strand, x| u8::try_from(x).map_err(|_| strand));
        assert_eq!(converted, Ok(PerStrand::new(1, 2)));
    }
}
