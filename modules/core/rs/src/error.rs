use derive_more::{Display, Error};

/// Failure kinds reported by the scoring core.
///
/// Fallible functions across the workspace return [`eyre::Result`]. Whenever the failure matches
/// one of the kinds below, the report carries this enum and callers can recover it with
/// `report.downcast_ref::<Error>()`, even after context has been attached to the report.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// The FASTA text (or another record source) is structurally invalid.
    #[display("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// The k-mer length is outside of `[1, length]` for a sequence of the given length.
    #[display("K-mer length {k} is out of range for a sequence of length {length}")]
    InvalidKmerLength { k: usize, length: usize },

    /// A symbol outside of the strict {A, C, G, T} alphabet.
    #[display("Invalid nucleotide {symbol:?} at position {position}")]
    InvalidBase { symbol: char, position: usize },

    /// The background composition assigns zero probability to a base of a scored k-mer.
    #[display("Expected frequency of k-mer {kmer} is zero under the background composition")]
    DivisionByZero { kmer: String },

    /// Background composition is not a valid probability vector over {A, C, G, T}.
    #[display("Invalid nucleotide composition: {reason}")]
    InvalidComposition { reason: String },

    #[display("Number of shuffle rounds must be at least 1, got {rounds}")]
    InvalidRounds { rounds: usize },
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn composition(reason: impl Into<String>) -> Self {
        Self::InvalidComposition {
            reason: reason.into(),
        }
    }

    /// Extract the error kind from a report, if there is one.
    pub fn of(report: &eyre::Report) -> Option<&Self> {
        report.downcast_ref::<Self>()
    }
}
