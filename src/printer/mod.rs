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

//! Writer for outputting [Alignment] blocks as MAF or TAF.
//!
//! [AlignmentWriter] writes the header on the first call to
//! [write_block](AlignmentWriter::write_block) (or explicitly with
//! [write_header](AlignmentWriter::write_header)) and keeps the rows of the
//! last written block to encode TAF coordinates incrementally. The
//! `left_row` links of each block passed in must refer to the block passed
//! in before it, as returned by [AlignmentReader](crate::parser::AlignmentReader).
//!
//! ## Usage
//!
//! ### Convert MAF to TAF
//!
//! ```rust
//! use taffy::Format;
//! use taffy::parser::AlignmentReader;
//! use taffy::printer::{AlignmentWriter, WriterOptions};
//!
//! let maf = b"##maf version=1\n\na\ns hg38.chr1 0 2 + 100 AC\ns mm10.chr1 5 2 + 50 AG\n\na\ns hg38.chr1 2 1 + 100 T\ns mm10.chr1 7 1 + 50 T\n\n";
//! let mut reader = AlignmentReader::new(&maf[..]).unwrap();
//! let mut writer = AlignmentWriter::new(Vec::new(), Format::Taf, reader.header().clone(), WriterOptions::default());
//!
//! while let Some(block) = reader.read_block().unwrap() {
//!     writer.write_block(&block).unwrap();
//! }
//! let out = String::from_utf8(writer.finish().unwrap()).unwrap();
//!
//! let expected = "#taf version:1\nAA ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr1 5 + 50\nCG\nTT ;\n";
//! assert_eq!(out, expected);
//! ```
//!

// Format specific implementations
pub mod maf;
pub mod taf;

use crate::Format;
use crate::alignment::Alignment;
use crate::compression::LineWriter;
use crate::error::Result;
use crate::tags::Tags;

use crate::printer::maf::write_maf_block;
use crate::printer::taf::{write_taf_block, write_taf_block_unlinked};

use std::io::Write;

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Write TAF columns as `c n` runs.
    pub run_length_encode_bases: bool,
    /// Rewrite TAF coordinates of a row once this many columns have passed
    /// since they were last written. Values <= 0 disable repetition.
    pub repeat_coordinates_every_n_columns: i64,
    /// BGZF compress the output.
    pub compress: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            run_length_encode_bases: false,
            repeat_coordinates_every_n_columns: 10_000,
            compress: false,
        }
    }
}

/// Writes [Alignment] blocks as MAF or TAF.
pub struct AlignmentWriter<W: Write> {
    conn: LineWriter<W>,
    format: Format,
    header: Tags,
    options: WriterOptions,

    header_written: bool,
    // Rows of the last written block and their column counters
    previous: Option<Alignment>,
    // The last block could not be written, so the next one starts over
    unlinked: bool,
}

impl<W: Write> AlignmentWriter<W> {
    /// Creates a writer. The `run_length_encode_bases` header tag is set or
    /// removed to match `options`.
    pub fn new(
        conn: W,
        format: Format,
        header: Tags,
        options: WriterOptions,
    ) -> Self {
        let header = match format {
            Format::Taf if options.run_length_encode_bases => {
                let mut header = header;
                header.set("run_length_encode_bases", "1");
                header
            },
            _ => header.remove("run_length_encode_bases"),
        };
        AlignmentWriter {
            conn: LineWriter::new(conn, options.compress),
            format, header, options,
            header_written: false,
            previous: None,
            unlinked: false,
        }
    }

    pub fn header(&self) -> &Tags {
        &self.header
    }

    /// Writes the header line if it has not been written yet.
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(())
        }
        let line = match self.format {
            Format::Taf => format_header("#taf", &self.header, ':') + "\n",
            Format::Maf => format_header("##maf", &self.header, '=') + "\n\n",
        };
        self.conn.write_all(line.as_bytes())?;
        self.header_written = true;
        Ok(())
    }

    /// Writes one block.
    pub fn write_block(
        &mut self,
        block: &Alignment,
    ) -> Result<()> {
        self.write_header()?;
        match self.format {
            Format::Maf => write_maf_block(&mut self.conn, block)?,
            Format::Taf if block.column_number == 0 => {
                // Has no lines in TAF, so links into this block can't be followed
                self.unlinked = true;
            },
            Format::Taf => {
                let (rle, repeat) = (self.options.run_length_encode_bases, self.options.repeat_coordinates_every_n_columns);
                let skeleton = if self.unlinked {
                    write_taf_block_unlinked(&mut self.conn, block, self.previous.as_ref(), rle, repeat)?
                } else {
                    write_taf_block(&mut self.conn, block, self.previous.as_ref(), rle, repeat)?
                };
                self.previous = Some(skeleton);
                self.unlinked = false;
            },
        }
        Ok(())
    }

    /// Flushes the output and returns the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.write_header()?;
        Ok(self.conn.finish()?)
    }
}

fn format_header(
    prefix: &str,
    tags: &Tags,
    delimiter: char,
) -> String {
    if tags.is_empty() {
        prefix.to_string()
    } else {
        format!("{} {}", prefix, tags.to_text(delimiter))
    }
}
