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

//! Column by column iteration over alignment blocks.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::columns::ColumnIterator;
//! use taffy::parser::AlignmentReader;
//!
//! let taf = b"#taf\nA- ; i 0 hg38.chr1 10 + 100 i 1 mm10.chr1 0 + 50\n-C\nGG\n";
//! let reader = AlignmentReader::new(&taf[..]).unwrap();
//!
//! let columns: Vec<_> = ColumnIterator::new(reader).map(|column| column.unwrap()).collect();
//! assert_eq!(columns.len(), 3);
//! assert_eq!(columns[2].bases, "GG");
//! assert_eq!(columns[2].reference_index, 11);
//! assert_eq!(&columns[0].sequence_names[..], &["hg38.chr1".to_string(), "mm10.chr1".to_string()]);
//! ```
//!
use std::sync::Arc;

use crate::alignment::Alignment;
use crate::error::Result;
use crate::tags::Tags;

/// One alignment column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Position on the reference sequence of this column, or of the next
    /// reference base if the reference has a gap here.
    pub reference_index: i64,
    pub bases: String,
    /// Names of the rows, shared by all columns of a block.
    pub sequence_names: Arc<[String]>,
    pub tags: Tags,
}

/// Flattens a block iterator into its columns.
pub struct ColumnIterator<I: Iterator<Item = Result<Alignment>>> {
    blocks: I,
    block: Option<Alignment>,
    sequence_names: Arc<[String]>,
    column: usize,
    reference_index: i64,
}

impl<I: Iterator<Item = Result<Alignment>>> ColumnIterator<I> {
    pub fn new(
        blocks: I,
    ) -> Self {
        ColumnIterator {
            blocks,
            block: None,
            sequence_names: Arc::from(Vec::new()),
            column: 0,
            reference_index: 0,
        }
    }
}

impl<I: Iterator<Item = Result<Alignment>>> Iterator for ColumnIterator<I> {
    type Item = Result<Column>;

    fn next(
        &mut self,
    ) -> Option<Result<Column>> {
        loop {
            if let Some(block) = self.block.as_ref() {
                if self.column < block.column_number {
                    let idx = self.column;
                    let bases: String = block.rows.iter().map(|row| row.bases.as_bytes()[idx] as char).collect();
                    let reference_index = self.reference_index;
                    if bases.as_bytes().first().is_some_and(|base| *base != b'-') {
                        self.reference_index += 1;
                    }
                    self.column += 1;
                    return Some(Ok(Column {
                        reference_index,
                        bases,
                        sequence_names: Arc::clone(&self.sequence_names),
                        tags: block.column_tags.get(idx).cloned().unwrap_or_default(),
                    }))
                }
            }

            let block = match self.blocks.next()? {
                Ok(block) => block,
                Err(e) => return Some(Err(e)),
            };
            self.sequence_names = block.rows.iter().map(|row| row.sequence_name.clone()).collect();
            self.reference_index = block.reference_row().map_or(0, |row| row.start);
            self.column = 0;
            self.block = Some(block);
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn reference_index_skips_gaps() {
        use crate::parser::AlignmentReader;
        use super::ColumnIterator;

        let maf = b"##maf\n\na\ns a.chr1 5 3 + 100 A-CG\ns b.chr1 0 4 + 100 ACCG\n\na\ns a.chr1 20 1 + 100 T\n\n";
        let reader = AlignmentReader::new(&maf[..]).unwrap();
        let columns: Vec<_> = ColumnIterator::new(reader).map(|column| column.unwrap()).collect();

        let indices: Vec<i64> = columns.iter().map(|column| column.reference_index).collect();
        assert_eq!(indices, vec![5, 6, 6, 7, 20]);
        assert_eq!(columns[1].bases, "-C");
        assert_eq!(columns[4].bases, "T");
        assert_eq!(columns[4].sequence_names.len(), 1);
    }

    #[test]
    fn names_are_shared_within_a_block() {
        use std::sync::Arc;
        use crate::parser::AlignmentReader;
        use super::ColumnIterator;

        let maf = b"##maf\n\na\ns a.chr1 0 2 + 100 AC\ns b.chr1 0 2 + 100 AC\n\na\ns a.chr1 2 1 + 100 T\n\n";
        let reader = AlignmentReader::new(&maf[..]).unwrap();
        let columns: Vec<_> = ColumnIterator::new(reader).map(|column| column.unwrap()).collect();

        assert!(Arc::ptr_eq(&columns[0].sequence_names, &columns[1].sequence_names));
        assert!(!Arc::ptr_eq(&columns[1].sequence_names, &columns[2].sequence_names));
    }

    #[test]
    fn column_tags_are_carried() {
        use crate::parser::AlignmentReader;
        use super::ColumnIterator;

        let taf = b"#taf\nA ; i 0 a 0 + 10 @ q:9\nC @ q:1 r:x\nG\n";
        let reader = AlignmentReader::new(&taf[..]).unwrap();
        let columns: Vec<_> = ColumnIterator::new(reader).map(|column| column.unwrap()).collect();

        assert_eq!(columns[0].tags.find("q").unwrap().value, "9");
        assert_eq!(columns[1].tags.len(), 2);
        assert!(columns[2].tags.is_empty());
    }

    #[test]
    fn errors_are_passed_on() {
        use crate::parser::AlignmentReader;
        use super::ColumnIterator;

        let taf = b"#taf\nAC ; i 0 a 0 + 10\n";
        let reader = AlignmentReader::new(&taf[..]).unwrap();
        let mut columns = ColumnIterator::new(reader);

        assert!(columns.next().unwrap().is_err());
        assert!(columns.next().is_none());
    }
}
