// taffy: Streaming, merging and random access for MAF/TAF multiple alignments.
//
// Copyright 2025 The taffy developers.
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Reader for alignment blocks stored in MAF or TAF.
//!
//! [AlignmentReader] detects the format from the header line, reads the
//! header tags, and then returns one [Alignment] at a time using next().
//!
//! Each returned block has its rows linked to the rows of the block returned
//! before it through `left_row`. TAF blocks carry these links in the file;
//! MAF blocks are linked with [link_adjacent].
//!
//! ## Usage
//!
//! ```rust
//! use taffy::Format;
//! use taffy::parser::AlignmentReader;
//! use std::io::Cursor;
//!
//! let data = b"#taf version:1\nAC ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr1 5 + 50\nGG\nTT ;\n".to_vec();
//! let mut reader = AlignmentReader::new(Cursor::new(data)).unwrap();
//!
//! assert_eq!(reader.format(), Format::Taf);
//! assert_eq!(reader.header().find("version").unwrap().value, "1");
//!
//! let blocks: Vec<_> = reader.by_ref().map(|block| block.unwrap()).collect();
//! assert_eq!(blocks.len(), 2);
//! assert_eq!(blocks[0].rows[1].bases, "CG");
//! assert_eq!(blocks[1].rows[1].start, 7);
//! assert_eq!(blocks[1].rows[1].left_row, Some(1));
//! ```
//!

// Format specific implementations
pub mod maf;
pub mod taf;

use crate::Format;
use crate::alignment::{link_adjacent, Alignment};
use crate::compression::LineReader;
use crate::error::{Result, TafError};
use crate::tags::Tags;

use crate::parser::maf::{read_maf_block, read_maf_header};
use crate::parser::taf::{read_taf_block, read_taf_header};

use std::io::Read;
use std::io::Seek;

/// Guess the format from the first line of the input.
///
/// Returns None for anything that is not a `#taf` or `##maf` header,
/// including compressed data.
pub fn guess_format(
    bytes: &[u8],
) -> Option<Format> {
    let first_token = bytes.split(|b| b.is_ascii_whitespace()).find(|token| !token.is_empty())?;
    match first_token {
        b"#taf" => Some(Format::Taf),
        b"##maf" => Some(Format::Maf),
        _ => None,
    }
}

/// Streams [Alignment] blocks from MAF or TAF input.
pub struct AlignmentReader<R: Read> {
    conn: LineReader<R>,
    format: Format,
    header: Tags,
    run_length_encode_bases: bool,
    allow_row_substitutions: bool,

    // Rows of the last returned block, without bases
    previous: Option<Alignment>,
    failed: bool,
}

impl<R: Read> AlignmentReader<R> {
    /// Reads the header from `conn`, detecting the format and compression.
    pub fn new(
        conn: R,
    ) -> Result<Self> {
        let mut conn = LineReader::new(conn)?;
        let line = loop {
            match conn.next_line()? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
                None => return Err(TafError::Format("empty input".to_string())),
            }
        };

        let (format, header) = match guess_format(line.as_bytes()) {
            Some(Format::Taf) => (Format::Taf, read_taf_header(&line)?),
            Some(Format::Maf) => (Format::Maf, read_maf_header(&line)?),
            None => return Err(TafError::Format(format!("first line '{}' is not a #taf or ##maf header", line))),
        };
        let run_length_encode_bases = format == Format::Taf
            && header.find("run_length_encode_bases").is_some_and(|tag| tag.value == "1");

        Ok(AlignmentReader {
            conn, format, header, run_length_encode_bases,
            allow_row_substitutions: true,
            previous: None, failed: false,
        })
    }

    /// Sets whether MAF rows that do not continue each other may be linked.
    pub fn with_row_substitutions(
        mut self,
        allow_row_substitutions: bool,
    ) -> Self {
        self.allow_row_substitutions = allow_row_substitutions;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn header(&self) -> &Tags {
        &self.header
    }

    pub fn run_length_encode_bases(&self) -> bool {
        self.run_length_encode_bases
    }

    /// Reads the next block, or None at the end of the input.
    pub fn read_block(&mut self) -> Result<Option<Alignment>> {
        let block = match self.format {
            Format::Taf => read_taf_block(&mut self.conn, self.previous.as_ref(), self.run_length_encode_bases)?,
            Format::Maf => match read_maf_block(&mut self.conn)? {
                Some(mut block) => {
                    if let Some(previous) = self.previous.as_mut() {
                        link_adjacent(previous, &mut block, self.allow_row_substitutions);
                    }
                    Some(block)
                },
                None => None,
            },
        };
        self.previous = block.as_ref().map(|block| block.coordinates_only());
        Ok(block)
    }

    /// Forgets the previous block, so that the next block has no left links.
    pub fn reset(&mut self) {
        self.previous = None;
        self.failed = false;
    }

    /// Position of the next unread line, see [LineReader::tell].
    pub fn tell(&self) -> u64 {
        self.conn.tell()
    }

    pub fn is_indexable(&self) -> bool {
        self.conn.is_indexable()
    }

    pub(crate) fn lines(&mut self) -> &mut LineReader<R> {
        &mut self.conn
    }
}

impl<R: Read + Seek> AlignmentReader<R> {
    /// Moves to `position` and resets the previous block.
    ///
    /// `position` must point to the start of a MAF block or to a TAF line
    /// that gives coordinates for every row.
    pub fn seek(
        &mut self,
        position: u64,
    ) -> Result<()> {
        self.conn.seek(position)?;
        self.reset();
        Ok(())
    }
}

impl<R: Read> Iterator for AlignmentReader<R> {
    type Item = Result<Alignment>;

    fn next(
        &mut self,
    ) -> Option<Result<Alignment>> {
        if self.failed {
            return None
        }
        match self.read_block() {
            Ok(block) => block.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            },
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn guess_format_taf() {
        use crate::Format;
        use super::guess_format;

        assert_eq!(guess_format(b"#taf version:1\n"), Some(Format::Taf));
    }

    #[test]
    fn guess_format_maf() {
        use crate::Format;
        use super::guess_format;

        assert_eq!(guess_format(b"##maf version=1 scoring=N/A\n"), Some(Format::Maf));
    }

    #[test]
    fn guess_format_unrecognized() {
        use super::guess_format;

        assert_eq!(guess_format(b"#tafx version:1"), None);
        assert_eq!(guess_format(b"a score=1"), None);
        assert_eq!(guess_format(&[0x1f, 0x8b, 0x08, 0x04]), None);
        assert_eq!(guess_format(b""), None);
    }

    #[test]
    fn reader_rejects_unknown_format() {
        use std::io::Cursor;
        use crate::error::TafError;
        use super::AlignmentReader;

        let got = AlignmentReader::new(Cursor::new(b"hello\n".to_vec()));

        assert!(matches!(got, Err(TafError::Format(_))));
    }

    #[test]
    fn reader_links_maf_blocks() {
        use std::io::Cursor;
        use crate::Format;
        use super::AlignmentReader;

        let data = b"##maf version=1\n\na\ns a 0 2 + 10 AC\ns b 0 2 + 10 AC\n\na\ns a 2 1 + 10 G\ns c 0 1 + 10 G\n\n".to_vec();
        let reader = AlignmentReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.format(), Format::Maf);

        let blocks: Vec<_> = reader.with_row_substitutions(false).map(|block| block.unwrap()).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].rows[0].left_row, Some(0));
        assert_eq!(blocks[1].rows[1].left_row, None);
    }

    #[test]
    fn reader_stops_after_error() {
        use std::io::Cursor;
        use super::AlignmentReader;

        let data = b"#taf\nAC ; i 0 a 0 + 10\n".to_vec();
        let mut reader = AlignmentReader::new(Cursor::new(data)).unwrap();

        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn reader_run_length_header() {
        use std::io::Cursor;
        use super::AlignmentReader;

        let data = b"#taf run_length_encode_bases:1\nA 2 C 1 ; i 0 a 0 + 10 i 1 b 0 + 10 i 2 c 0 + 10\n".to_vec();
        let mut reader = AlignmentReader::new(Cursor::new(data)).unwrap();
        assert!(reader.run_length_encode_bases());

        let block = reader.next().unwrap().unwrap();
        assert_eq!(block.get_column(0).unwrap(), "AAC");
    }
}
