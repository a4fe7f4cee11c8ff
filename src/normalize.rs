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

//! Merging of small adjacent alignment blocks.
//!
//! [Normalizer] wraps a block iterator and merges each block into the one
//! before it when the two share most of their rows, at least one of them is
//! short, and the unaligned sequence between them is short. A gap that is too
//! long can still be merged over by dropping the rows that cause it, as long
//! as each dropped row's sample (the sequence name up to the first `.`) has
//! other rows in the block.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::normalize::{Normalizer, NormalizeOptions};
//! use taffy::parser::AlignmentReader;
//!
//! let maf = b"##maf\n\na\ns hg38.chr1 0 5 + 100 ACGTT\n\na\ns hg38.chr1 5 3 + 100 AAC\n\n";
//! let reader = AlignmentReader::new(&maf[..]).unwrap();
//!
//! let blocks: Vec<_> = Normalizer::new(reader, NormalizeOptions::default()).map(|block| block.unwrap()).collect();
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].rows[0].bases, "ACGTTAAC");
//! assert_eq!(blocks[0].rows[0].length, 8);
//! ```
//!
use std::collections::HashMap;

use crate::alignment::Alignment;
use crate::alignment::merge::merge_adjacent;
use crate::error::Result;

/// Thresholds for merging adjacent blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    /// Merge only if one of the blocks has at most this many columns.
    pub maximum_block_length_to_merge: usize,
    /// Merge only if no shared row skips more unaligned bases than this.
    pub maximum_gap_length: i64,
    /// Shared rows needed, as a fraction of all rows of the two blocks.
    pub fraction_shared_rows: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            maximum_block_length_to_merge: 200,
            maximum_gap_length: 30,
            fraction_shared_rows: 0.6,
        }
    }
}

fn sample_name(sequence_name: &str) -> &str {
    sequence_name.split('.').next().unwrap_or(sequence_name)
}

/// Rows of `right` to keep so that no shared row has a gap longer than
/// `maximum_gap_length`.
///
/// Returns None if a long gap is on the reference row or on the only row of
/// its sample, or if no shared row would be left.
fn prune_by_gap(
    left: &Alignment,
    right: &Alignment,
    maximum_gap_length: i64,
) -> Option<Vec<bool>> {
    let mut sample_counts: HashMap<&str, usize> = HashMap::new();
    for row in right.rows.iter() {
        *sample_counts.entry(sample_name(&row.sequence_name)).or_insert(0) += 1;
    }

    let mut keep = vec![true; right.row_number()];
    let mut shared = 0;
    for (idx, row) in right.rows.iter().enumerate() {
        let Some(l_row) = row.left_row.and_then(|l| left.rows.get(l)).filter(|l_row| l_row.is_predecessor(row)) else {
            continue
        };
        if row.start - l_row.end() <= maximum_gap_length {
            shared += 1;
        } else if idx > 0 && sample_counts[sample_name(&row.sequence_name)] > 1 {
            keep[idx] = false;
        } else {
            return None
        }
    }
    (shared > 0).then_some(keep)
}

/// Merges adjacent blocks of a block iterator, see the [module docs](self).
pub struct Normalizer<I: Iterator<Item = Result<Alignment>>> {
    blocks: I,
    options: NormalizeOptions,

    current: Option<Alignment>,
    // Block after the one being merged, its links are updated by merges
    lookahead: Option<Alignment>,
    merged: usize,
    finished: bool,
}

impl<I: Iterator<Item = Result<Alignment>>> Normalizer<I> {
    pub fn new(
        blocks: I,
        options: NormalizeOptions,
    ) -> Self {
        Normalizer { blocks, options, current: None, lookahead: None, merged: 0, finished: false }
    }

    /// Number of merges done so far.
    pub fn merged(&self) -> usize {
        self.merged
    }

    fn pull(&mut self) -> Result<Option<Alignment>> {
        match self.lookahead.take() {
            Some(block) => Ok(Some(block)),
            None => self.blocks.next().transpose(),
        }
    }

    fn should_merge(
        &mut self,
        left: &Alignment,
        right: &mut Alignment,
    ) -> bool {
        let common = Alignment::number_of_common_rows(left, right);
        let total = left.row_number() + right.row_number() - common;
        if common == 0 || (common as f64) < total as f64 * self.options.fraction_shared_rows {
            return false
        }
        let max_length = self.options.maximum_block_length_to_merge;
        if left.column_number > max_length && right.column_number > max_length {
            return false
        }
        if Alignment::total_gap_length(left, right) <= self.options.maximum_gap_length {
            return true
        }
        match prune_by_gap(left, right, self.options.maximum_gap_length) {
            Some(keep) => {
                let row_map = right.retain_rows(&keep);
                if let Some(successor) = self.lookahead.as_mut() {
                    successor.remap_left_rows(&row_map);
                }
                log::debug!("Dropped {} rows with long gaps to merge at {}:{}",
                            keep.iter().filter(|x| !**x).count(),
                            right.rows[0].sequence_name, right.rows[0].start);
                true
            },
            None => false,
        }
    }

    fn next_block(&mut self) -> Result<Option<Alignment>> {
        let mut current = match self.current.take() {
            Some(block) => block,
            None => match self.pull()? {
                Some(block) => block,
                None => return Ok(None),
            },
        };
        loop {
            let Some(mut right) = self.pull()? else {
                return Ok(Some(current))
            };
            self.lookahead = self.blocks.next().transpose()?;
            if self.should_merge(&current, &mut right) {
                current = merge_adjacent(current, right, self.lookahead.as_mut())?;
                self.merged += 1;
            } else {
                self.current = Some(right);
                return Ok(Some(current))
            }
        }
    }
}

impl<I: Iterator<Item = Result<Alignment>>> Iterator for Normalizer<I> {
    type Item = Result<Alignment>;

    fn next(
        &mut self,
    ) -> Option<Result<Alignment>> {
        if self.finished {
            return None
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                log::info!("Merged {} pairs of adjacent blocks", self.merged);
                self.finished = true;
                None
            },
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            },
        }
    }
}
