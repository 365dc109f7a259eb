//! Tab-separated output for k-mer score tables.
//!
//! One line per (sequence, k-mer) pair, preceded by a single comment line naming the columns:
//! ```text
//! #header	kmer	forward	reverse
//! seq1	ACGT	-1.5849625007211563	-1.5849625007211563
//! ```
//! Scores are written with the shortest representation that round-trips to the same `f64`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use eyre::{Result, WrapErr};

use pelops_core_rs::PerStrand;

use crate::traits::WriteRecord;

pub const COLUMNS: &str = "#header\tkmer\tforward\treverse";

#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Debug, Clone, PartialEq, Default, Constructor, Dissolve, Getters)]
pub struct Record {
    header: String,
    kmer: String,
    scores: PerStrand<f64>,
}

#[derive(Debug, Dissolve)]
pub struct Writer<W> {
    writer: W,
    columns_written: bool,
}

impl Writer<()> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Writer<BufWriter<File>>> {
        let path = path.as_ref();
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create score table: {}", path.display()))?;
        Ok(Writer::new(BufWriter::new(file)))
    }
}

impl<W: Write> Writer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            columns_written: false,
        }
    }

    fn write_columns(&mut self) -> Result<()> {
        if !self.columns_written {
            writeln!(self.writer, "{COLUMNS}")?;
            self.columns_written = true;
        }
        Ok(())
    }
}

impl<W: Write> WriteRecord for Writer<W> {
    type Record = Record;

    fn write_record(&mut self, record: &Self::Record) -> Result<()> {
        self.write_columns()?;
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}",
            record.header, record.kmer, record.scores.forward, record.scores.reverse
        )?;
        Ok(())
    }

    /// Flush the output. The column line is emitted even if no records were written.
    fn flush(&mut self) -> Result<()> {
        self.write_columns()?;
        self.writer.flush()?;
        Ok(())
    }
}
