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

//! Alignment blocks and their rows.
//!
//! An [Alignment] is a block of aligned [Row]s with an equal number of
//! columns. Row 0 is the reference row. Rows of consecutive blocks are
//! connected through index based links: `left_row` points to the
//! continuation of the same sequence in the previous block and `right_row`
//! to the continuation in the next block.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::alignment::{Alignment, Row, link_adjacent};
//!
//! let mut left = Alignment::from_rows(vec![
//!     Row::new("chr1", 0, true, 100, "ACGTT"),
//!     Row::new("chr2", 10, true, 100, "AC-TT"),
//! ]).unwrap();
//! let mut right = Alignment::from_rows(vec![
//!     Row::new("chr1", 5, true, 100, "AAC"),
//! ]).unwrap();
//!
//! link_adjacent(&mut left, &mut right, true);
//! assert_eq!(right.rows[0].left_row, Some(0));
//! assert_eq!(left.rows[0].right_row, Some(0));
//! assert_eq!(left.rows[1].right_row, None);
//!
//! assert_eq!(left.get_column(-1).unwrap(), "TT");
//! ```
//!
pub mod merge;
pub mod ond;

use crate::error::{Result, TafError};
use crate::tags::Tags;

/// Mismatch cost used by the row linker when substitutions are not allowed.
const FORBIDDEN_SUBSTITUTION: i64 = 100_000_000;

/// One sequence's contribution to an alignment block.
///
/// Coordinates are zero based and half open. Rows on the reverse strand
/// have coordinates relative to the reverse complement of the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub sequence_name: String,
    pub start: i64,
    // Number of non-gap characters in `bases`
    pub length: i64,
    pub sequence_length: i64,
    pub strand: bool,
    pub bases: String,
    pub left_gap_sequence: Option<String>,
    pub left_row: Option<usize>,
    pub right_row: Option<usize>,
    pub bases_since_coordinates_reported: i64,
}

impl Row {
    /// Creates an unlinked row, computing `length` from `bases`.
    pub fn new(
        sequence_name: &str,
        start: i64,
        strand: bool,
        sequence_length: i64,
        bases: &str,
    ) -> Self {
        Row {
            sequence_name: sequence_name.to_string(),
            start,
            length: count_bases(bases),
            sequence_length,
            strand,
            bases: bases.to_string(),
            ..Default::default()
        }
    }

    pub fn end(&self) -> i64 {
        self.start + self.length
    }

    /// Returns true if `right` continues this row without overlap.
    ///
    /// Both rows must come from the same sequence and strand and `right`
    /// must start at or after the end of this row.
    pub fn is_predecessor(
        &self,
        right: &Row,
    ) -> bool {
        self.sequence_name == right.sequence_name
            && self.strand == right.strand
            && self.end() <= right.start
    }

    /// Same row without bases or links, used to carry coordinates forward.
    pub fn coordinates_only(&self) -> Row {
        Row {
            sequence_name: self.sequence_name.clone(),
            start: self.start,
            length: self.length,
            sequence_length: self.sequence_length,
            strand: self.strand,
            bases_since_coordinates_reported: self.bases_since_coordinates_reported,
            ..Default::default()
        }
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}\t{}\t{}\t{}",
               self.sequence_name, self.start, self.length,
               if self.strand { '+' } else { '-' },
               self.sequence_length, self.bases)
    }
}

/// Number of non-gap characters.
pub fn count_bases(bases: &str) -> i64 {
    bases.bytes().filter(|b| *b != b'-').count() as i64
}

/// True for the characters allowed in aligned bases.
pub fn is_alignment_base(base: char) -> bool {
    base.is_ascii_alphabetic() || matches!(base, '*' | '+' | '-')
}

/// Checks that `bases` only holds alignment characters.
pub fn check_bases(
    bases: &str,
) -> Result<()> {
    match bases.chars().find(|c| !is_alignment_base(*c)) {
        Some(c) => Err(TafError::Parse(format!("invalid base '{}' in '{}'", c, bases))),
        None => Ok(()),
    }
}

/// A block of aligned rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pub rows: Vec<Row>,
    pub column_number: usize,
    // One (possibly empty) list per column
    pub column_tags: Vec<Tags>,
}

impl Alignment {
    /// Builds a block from rows with equally long bases and no column tags.
    pub fn from_rows(
        rows: Vec<Row>,
    ) -> Result<Self> {
        for row in rows.iter() {
            check_bases(&row.bases)?;
        }
        let column_number = rows.first().map_or(0, |row| row.bases.len());
        if let Some(row) = rows.iter().find(|row| row.bases.len() != column_number) {
            return Err(TafError::Parse(format!(
                "row '{}' has {} columns, expected {}",
                row.sequence_name, row.bases.len(), column_number)))
        }
        Ok(Alignment { rows, column_number, column_tags: vec![Tags::new(); column_number] })
    }

    pub fn row_number(&self) -> usize {
        self.rows.len()
    }

    pub fn reference_row(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn row(
        &self,
        index: usize,
    ) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Row following row `index` in this block.
    pub fn next_row(
        &self,
        index: usize,
    ) -> Option<&Row> {
        self.rows.get(index + 1)
    }

    fn column_index(
        &self,
        index: i64,
    ) -> Result<usize> {
        let n = self.column_number as i64;
        let normalized = if index < 0 { index + n } else { index };
        if normalized < 0 || normalized >= n {
            return Err(TafError::Range(format!("column {} in a block of {} columns", index, n)))
        }
        Ok(normalized as usize)
    }

    /// Characters of column `index`, one per row. Negative indices count
    /// from the end.
    pub fn get_column(
        &self,
        index: i64,
    ) -> Result<String> {
        let idx = self.column_index(index)?;
        Ok(self.rows.iter().map(|row| row.bases.as_bytes()[idx] as char).collect())
    }

    pub fn column_tags(
        &self,
        index: i64,
    ) -> Result<&Tags> {
        let idx = self.column_index(index)?;
        Ok(&self.column_tags[idx])
    }

    /// Replaces the tags of column `index`.
    pub fn set_column_tags(
        &mut self,
        index: i64,
        tags: Tags,
    ) -> Result<()> {
        let idx = self.column_index(index)?;
        self.column_tags[idx] = tags;
        Ok(())
    }

    /// Number of rows in `right` that continue a row of `left`.
    pub fn number_of_common_rows(
        left: &Alignment,
        right: &Alignment,
    ) -> usize {
        right.rows.iter().filter(|row| {
            row.left_row.and_then(|l| left.rows.get(l))
                        .is_some_and(|l_row| l_row.is_predecessor(row))
        }).count()
    }

    /// Longest stretch of unaligned sequence between linked rows of
    /// `left` and `right`.
    pub fn total_gap_length(
        left: &Alignment,
        right: &Alignment,
    ) -> i64 {
        right.rows.iter().filter_map(|row| {
            let l_row = left.rows.get(row.left_row?)?;
            l_row.is_predecessor(row).then(|| row.start - l_row.end())
        }).max().unwrap_or(0).max(0)
    }

    /// Replaces bases of non-reference rows that match the reference.
    pub fn mask_reference_bases(
        &mut self,
        mask_char: char,
    ) {
        if let Some((reference, others)) = self.rows.split_first_mut() {
            let reference = reference.bases.as_bytes();
            for row in others.iter_mut() {
                row.bases = row.bases.chars().zip(reference.iter()).map(|(c, r)| {
                    if c as u32 == *r as u32 { mask_char } else { c }
                }).collect();
            }
        }
    }

    /// Keeps rows where `keep` is true.
    ///
    /// Returns the map from old row indices to new ones.
    pub fn retain_rows(
        &mut self,
        keep: &[bool],
    ) -> Vec<Option<usize>> {
        let mut map: Vec<Option<usize>> = Vec::with_capacity(self.rows.len());
        let mut next = 0;
        for keep_row in keep.iter().take(self.rows.len()) {
            map.push(if *keep_row { next += 1; Some(next - 1) } else { None });
        }
        map.resize(self.rows.len(), None);

        let mut idx = 0;
        self.rows.retain(|_| { idx += 1; map[idx - 1].is_some() });
        map
    }

    /// Rewrites `left_row` links after rows of the previous block moved.
    pub fn remap_left_rows(
        &mut self,
        map: &[Option<usize>],
    ) {
        for row in self.rows.iter_mut() {
            row.left_row = row.left_row.and_then(|l| map.get(l).copied().flatten());
        }
    }

    /// Sets `right_row` links of this block from the `left_row` links of
    /// the block that follows it.
    pub fn adopt_right_links(
        &mut self,
        right: &Alignment,
    ) {
        self.rows.iter_mut().for_each(|row| row.right_row = None);
        for (idx, row) in right.rows.iter().enumerate() {
            if let Some(l_row) = row.left_row.and_then(|l| self.rows.get_mut(l)) {
                l_row.right_row = Some(idx);
            }
        }
    }

    /// Copy of the block with coordinates but without bases or tags.
    pub fn coordinates_only(&self) -> Alignment {
        Alignment {
            rows: self.rows.iter().map(|row| row.coordinates_only()).collect(),
            column_number: self.column_number,
            column_tags: Vec::new(),
        }
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let lines: Vec<String> = self.rows.iter().map(|row| row.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Links the rows of two consecutive blocks.
///
/// Existing links between the blocks are discarded and recomputed with an
/// O(ND) diff over the row lists, where a left row equals a right row if it
/// is its predecessor. If `allow_row_substitutions` is true, rows that do
/// not continue each other can still be paired up (a substitution);
/// otherwise only exact continuations are linked.
pub fn link_adjacent(
    left: &mut Alignment,
    right: &mut Alignment,
    allow_row_substitutions: bool,
) {
    left.rows.iter_mut().for_each(|row| row.right_row = None);
    right.rows.iter_mut().for_each(|row| row.left_row = None);

    let mismatch_score = if allow_row_substitutions { 1 } else { FORBIDDEN_SUBSTITUTION };
    let pairs = {
        let (l_rows, r_rows) = (&left.rows, &right.rows);
        ond::align(l_rows.len(), r_rows.len(), |i, j| l_rows[i].is_predecessor(&r_rows[j]), 1, mismatch_score)
    };

    for (l, r) in pairs.iter().enumerate() {
        if let Some(r) = r {
            if allow_row_substitutions || left.rows[l].is_predecessor(&right.rows[*r]) {
                left.rows[l].right_row = Some(*r);
                right.rows[*r].left_row = Some(l);
            }
        }
    }

    // Gap sequences only make sense between continuing rows
    for row in right.rows.iter_mut() {
        let continues = row.left_row.is_some_and(|l| left.rows[l].is_predecessor(row));
        if !continues {
            row.left_gap_sequence = None;
        }
    }
}
