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

//! taffy is a library and a command-line client for:
//!
//!   - Converting multiple sequence alignments between MAF and TAF.
//!   - Random access to MAF and TAF files by reference coordinates.
//!   - Merging small adjacent alignment blocks.
//!
//! The following formats are supported:
//!   - [MAF](https://genome.ucsc.edu/FAQ/FAQformat.html#format5)
//!   - TAF, a column oriented format that stores coordinates only where
//!     rows change between blocks.
//!
//! Both can be read plain, gzip or BGZF compressed, and written plain or
//! BGZF compressed.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The taffy CLI supports the following subcommands:
//!   - `taffy view` convert between MAF and TAF, optionally extracting regions.
//!   - `taffy index` write a `.tai` index next to a MAF or TAF file.
//!   - `taffy norm` merge small adjacent blocks.
//!   - `taffy stats` print statistics of an indexed file.
//!
//! Extracting regions with `taffy view -r` requires the input to be plain
//! text or BGZF compressed and indexed with `taffy index`.
//!
//! ### Rust API
//!
//! The API provides functions that process a whole stream from a [Read]
//! into a [Write]: [convert], [index], [extract], [sequence_lengths] and [normalize].
//!
//! For use cases requiring access to a single block at a time, the following
//! structs are provided:
//!
//!   - [AlignmentReader](parser::AlignmentReader): takes a [Read] and returns [Alignment](alignment::Alignment) blocks.
//!   - [AlignmentWriter](printer::AlignmentWriter): writes [Alignment](alignment::Alignment) blocks as MAF or TAF.
//!   - [Tai](index::Tai): finds and clips the blocks overlapping a region.
//!   - [ColumnIterator](columns::ColumnIterator): returns the columns of each block.
//!   - [Normalizer](normalize::Normalizer): merges small adjacent blocks.
//!
//! These can be chained together, e.g. to normalize the blocks of a region.
//!
//! ```rust
//! use taffy::Format;
//! use taffy::printer::WriterOptions;
//!
//! let maf = b"##maf version=1\n\na\ns hg38.chr1 0 2 + 100 AC\ns mm10.chr1 5 2 + 50 AG\n\n";
//! let out = taffy::convert(&maf[..], Vec::new(), Format::Taf, WriterOptions::default()).unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), "#taf version:1\nAA ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr1 5 + 50\nCG\n");
//! ```
//!
use std::io::Read;
use std::io::Seek;
use std::io::Write;

use indexmap::IndexMap;

use error::Result;
use index::{Region, Tai};
use normalize::{NormalizeOptions, Normalizer};
use parser::AlignmentReader;
use printer::{AlignmentWriter, WriterOptions};

pub mod alignment;
pub mod columns;
pub mod compression;
pub mod error;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod printer;
pub mod tags;

/// Supported alignment formats.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    Maf,
    #[default]
    Taf,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "maf" => Ok(Format::Maf),
            "taf" => Ok(Format::Taf),
            _ => Err(format!("'{}' is not a valid Format", s)),
        }
    }
}

/// Converts all blocks read from `conn_in` to `format`.
///
/// The input format is detected from its header. Returns the inner writer
/// after flushing it.
pub fn convert<R: Read, W: Write>(
    conn_in: R,
    conn_out: W,
    format: Format,
    options: WriterOptions,
) -> Result<W> {
    let mut reader = AlignmentReader::new(conn_in)?;
    let mut writer = AlignmentWriter::new(conn_out, format, reader.header().clone(), options);
    let mut n_blocks = 0;
    while let Some(block) = reader.read_block()? {
        writer.write_block(&block)?;
        n_blocks += 1;
    }
    log::info!("Wrote {} blocks", n_blocks);
    writer.finish()
}

/// Builds the `.tai` index of a MAF or TAF stream.
pub fn index<R: Read>(
    conn_in: R,
    index_block_size: i64,
) -> Result<Tai> {
    let mut reader = AlignmentReader::new(conn_in)?;
    Tai::build(&mut reader, index_block_size)
}

/// Writes the blocks overlapping `regions` to `conn_out`, clipped to the
/// regions.
pub fn extract<R: Read + Seek, W: Write>(
    conn_in: R,
    tai: &Tai,
    regions: Vec<Region>,
    conn_out: W,
    format: Format,
    options: WriterOptions,
) -> Result<W> {
    let mut reader = AlignmentReader::new(conn_in)?;
    let mut writer = AlignmentWriter::new(conn_out, format, reader.header().clone(), options);
    for block in tai.query_regions(&mut reader, regions) {
        writer.write_block(&block?)?;
    }
    writer.finish()
}

/// Lengths of the reference sequences in the index, in index order.
pub fn sequence_lengths<R: Read + Seek>(
    conn_in: R,
    tai: &Tai,
) -> Result<IndexMap<String, i64>> {
    let mut reader = AlignmentReader::new(conn_in)?;
    tai.sequence_lengths(&mut reader)
}

/// Merges small adjacent blocks read from `conn_in`.
///
/// Run-length encoded TAF input gives run-length encoded TAF output.
pub fn normalize<R: Read, W: Write>(
    conn_in: R,
    conn_out: W,
    format: Format,
    options: NormalizeOptions,
    writer_options: WriterOptions,
) -> Result<W> {
    let reader = AlignmentReader::new(conn_in)?;
    let writer_options = WriterOptions {
        run_length_encode_bases: writer_options.run_length_encode_bases || reader.run_length_encode_bases(),
        ..writer_options
    };
    let mut writer = AlignmentWriter::new(conn_out, format, reader.header().clone(), writer_options);
    for block in Normalizer::new(reader, options) {
        writer.write_block(&block?)?;
    }
    writer.finish()
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn format_from_str() {
        use super::Format;
        use std::str::FromStr;

        assert_eq!(Format::from_str("maf"), Ok(Format::Maf));
        assert_eq!(Format::from_str("taf"), Ok(Format::Taf));
        assert_eq!(Format::from_str("paf"), Err("'paf' is not a valid Format".to_string()));
    }

    #[test]
    fn maf_taf_maf_round_trip() {
        use super::{convert, Format};
        use crate::printer::WriterOptions;

        let maf = "##maf version=1 scoring=N/A\n\n\
                   a\ns hg38.chr1\t0\t4\t+\t100\tAC-GT\ns mm10.chr2\t10\t5\t-\t50\tACCGT\n\n\
                   a\ns hg38.chr1\t4\t2\t+\t100\tAA\ns mm10.chr2\t17\t1\t-\t50\tA-\ns rn6.chr3\t0\t1\t+\t40\t-A\n\n\
                   a\ns hg38.chr1\t6\t1\t+\t100\tT\ns rn6.chr3\t1\t1\t+\t40\tT\n\n";
        let expected = maf.replace("s hg38", "s\thg38").replace("s mm10", "s\tmm10").replace("s rn6", "s\trn6");

        for rle in [false, true] {
            let options = WriterOptions { run_length_encode_bases: rle, repeat_coordinates_every_n_columns: 3, ..Default::default() };
            let taf = convert(maf.as_bytes(), Vec::new(), Format::Taf, options).unwrap();
            let back = convert(&taf[..], Vec::new(), Format::Maf, WriterOptions::default()).unwrap();

            assert_eq!(String::from_utf8(back).unwrap(), expected);
        }
    }

    #[test]
    fn normalize_keeps_run_length_encoding() {
        use super::{normalize, Format};
        use crate::normalize::NormalizeOptions;
        use crate::printer::WriterOptions;

        let taf = b"#taf run_length_encode_bases:1\nA 2 ; i 0 a.c 0 + 10 i 1 b.c 0 + 10\nC 2 ;\n";
        let out = normalize(&taf[..], Vec::new(), Format::Taf, NormalizeOptions::default(), WriterOptions::default()).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "#taf run_length_encode_bases:1\nA 2 ; i 0 a.c 0 + 10 i 1 b.c 0 + 10\nC 2\n");
    }
}
