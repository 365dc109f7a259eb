use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use derive_getters::Dissolve;
use eyre::{bail, ensure, Result, WrapErr};

use pelops_core_rs::error::Error;
use pelops_core_rs::nucleotide;

use super::{record::Record, validate};
use crate::traits::ReadRecord;

/// A strict FASTA reader that reads a single record at a time. Tolerates:
/// - Carriage return characters at the end of all lines (to support Windows line endings)
/// - Blank lines anywhere in the file
/// - Leading and trailing whitespace around sequence lines
/// - Lowercase bases, which are converted to uppercase
///
/// Returns an error if there are:
/// - Errors while reading from the underlying reader
/// - Sequence lines before the first header
/// - Symbols other than A, C, G, T inside the sequence, including internal whitespace
/// - Empty header or sequence fields in any record
#[derive(Debug, Clone, Dissolve)]
pub struct Reader<R> {
    reader: R,
    line: Vec<u8>,
    lineno: usize,
}

impl Reader<()> {
    /// Open an uncompressed FASTA file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Reader<BufReader<File>>> {
        let path = path.as_ref();
        let file = File::open(path)
            .wrap_err_with(|| format!("Failed to open FASTA file: {}", path.display()))?;
        Ok(Reader::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            lineno: 0,
        }
    }

    /// Read the next line into the internal buffer without the line terminator.
    /// Returns false on EOF.
    fn next_line(&mut self) -> Result<bool> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(false);
        }
        self.lineno += 1;

        if self.line.last() == Some(&b'\n') {
            self.line.pop();
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
        }
        Ok(true)
    }

    /// True if the unread input is exhausted or starts with a new record.
    fn at_record_boundary(&mut self) -> Result<bool> {
        Ok(match self.reader.fill_buf()?.first() {
            None => true,
            Some(&symbol) => symbol == b'>',
        })
    }

    fn read_parts(&mut self, record: &mut Record) -> Result<bool> {
        // Find the header line, skipping blank lines at the start of the input
        loop {
            if !self.next_line()? {
                return Ok(false);
            }
            if self.line.first() == Some(&b'>') {
                break;
            }
            ensure!(
                self.line.trim_ascii().is_empty(),
                Error::malformed(format!(
                    "Sequence data at line {} precedes the first FASTA header",
                    self.lineno
                ))
            );
        }

        // SAFETY: both fields are validated before the record is handed back to the caller
        let (header, bases) = unsafe { record.fields() };

        header.clear();
        match std::str::from_utf8(&self.line[1..]) {
            Ok(x) => header.push_str(x),
            Err(_) => bail!(Error::malformed(format!(
                "FASTA header at line {} is not valid UTF-8",
                self.lineno
            ))),
        }
        validate::header(header)
            .wrap_err_with(|| format!("Invalid FASTA header at line {}", self.lineno))?;

        bases.clear();
        while !self.at_record_boundary()? {
            self.next_line()?;
            let line = self.line.trim_ascii();
            if line.is_empty() {
                continue;
            }

            let offset = bases.len();
            bases.extend_from_slice(line);
            nucleotide::normalize_in_place(&mut bases[offset..], offset).wrap_err_with(|| {
                format!(
                    "Invalid sequence for FASTA record '{header}' at line {}",
                    self.lineno
                )
            })?;
        }
        validate::bases(header, bases)?;

        log::trace!("Parsed FASTA record '{}' ({} bases)", header, bases.len());
        Ok(true)
    }
}

impl<R: BufRead> ReadRecord for Reader<R> {
    type Record = Record;

    /// Parse the next FASTA record into the given [Record] buffer.
    /// Returns false if there are no more records to read.
    fn read_record(&mut self, into: &mut Self::Record) -> Result<bool> {
        self.read_parts(into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(content: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        Reader::new(Cursor::new(content)).read_to_end(&mut records)?;
        Ok(records)
    }

    #[test]
    fn test_empty_fasta_reader() -> Result<()> {
        let mut reader = Reader::new(Cursor::new(""));
        let mut record = Record::default();
        assert!(!reader.read_record(&mut record)?);
        assert!(read_all("")?.is_empty());
        assert!(read_all("\n\r\n \n")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_valid_fasta() -> Result<()> {
        for (content, expected) in [
            (">seq1\nACGTACGT\n", vec![("seq1", "ACGTACGT")]),
            (">id\nACGT", vec![("id", "ACGT")]),
            ("\n\n>id\n\nACGT\n\n", vec![("id", "ACGT")]),
            (">id\n  ACGT \t\nTT\n", vec![("id", "ACGTTT")]),
            (
                ">id\nACGT\n>id2\nacgt\n",
                vec![("id", "ACGT"), ("id2", "ACGT")],
            ),
            (
                ">id\nACGT\n>id2\nAC\n>id3\r\nGT\r\n>id4\r\nT\r\n",
                vec![("id", "ACGT"), ("id2", "AC"), ("id3", "GT"), ("id4", "T")],
            ),
            (
                "> AT1G01010.1 intron 2 \r\nACGT\r\nA\r\nGTTT\r\nA\r\n",
                vec![(" AT1G01010.1 intron 2 ", "ACGTAGTTTA")],
            ),
        ] {
            let records = read_all(content)?;
            let expected = expected
                .into_iter()
                .map(Record::try_from)
                .collect::<Result<Vec<_>>>()?;
            assert_eq!(records, expected, "Content: {content:?}");
        }
        Ok(())
    }

    #[test]
    fn test_invalid_fasta() {
        for (content, expected) in [
            ("ACGT\n>id\nACGT\n", "MalformedInput"),
            (" A\n>id\nACGT\n", "MalformedInput"),
            (">", "MalformedInput"),
            (">id", "MalformedInput"),
            (">\nACGT\n", "MalformedInput"),
            (">id\n>id2\nACGT\n", "MalformedInput"),
            (">id\nACGT\n>id2\n", "MalformedInput"),
            (">seq\t1\nACGT\n", "MalformedInput"),
            (">id\nAC GT\n", "InvalidBase"),
            (">id\nACGT\nACGN\n", "InvalidBase"),
            (">id\nACGU\n", "InvalidBase"),
        ] {
            let report = read_all(content).unwrap_err();
            let kind = match Error::of(&report) {
                Some(Error::MalformedInput { .. }) => "MalformedInput",
                Some(Error::InvalidBase { .. }) => "InvalidBase",
                _ => "Other",
            };
            assert_eq!(kind, expected, "Content: {content:?} -> {report:?}");
        }
    }

    #[test]
    fn test_invalid_base_position() {
        let report = read_all(">id\nACGT\nAANA\n").unwrap_err();
        assert_eq!(
            Error::of(&report),
            Some(&Error::InvalidBase {
                symbol: 'N',
                position: 6
            })
        );
    }

    #[test]
    fn test_record_buffer_is_reused() -> Result<()> {
        let mut reader = Reader::new(Cursor::new(">a\nAAAAAAAA\n>b\nCC\n"));
        let mut record = Record::default();

        assert!(reader.read_record(&mut record)?);
        assert_eq!(record, Record::new("a", "AAAAAAAA")?);
        assert!(reader.read_record(&mut record)?);
        assert_eq!(record, Record::new("b", "CC")?);
        assert!(!reader.read_record(&mut record)?);
        Ok(())
    }
}
