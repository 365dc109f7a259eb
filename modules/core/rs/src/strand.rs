/// DNA is double-stranded: a motif can be read from the given (forward) strand or from the
/// opposite one, where it appears as its reverse complement.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(i8)]
pub enum Strand {
    /// The strand the sequence was reported on, also known as the Watson strand.
    Forward = 1,
    /// The opposite strand, also known as the Crick strand.
    Reverse = -1,
}
