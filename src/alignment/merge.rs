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

//! Merging of two adjacent, linked alignment blocks into one.
//!
//! The unaligned sequence between continuing rows of the two blocks (the
//! interstitial gap) is aligned with [ond::align](super::ond::align) and
//! placed between the left and right bases of each row.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::alignment::{Alignment, Row, link_adjacent};
//! use taffy::alignment::merge::merge_adjacent;
//!
//! let mut left = Alignment::from_rows(vec![Row::new("chr1", 0, true, 100, "ACGTT")]).unwrap();
//! let mut right = Alignment::from_rows(vec![Row::new("chr1", 5, true, 100, "AAC")]).unwrap();
//! link_adjacent(&mut left, &mut right, true);
//!
//! let merged = merge_adjacent(left, right, None).unwrap();
//! assert_eq!(merged.rows[0].bases, "ACGTTAAC");
//! assert_eq!(merged.rows[0].start, 0);
//! assert_eq!(merged.rows[0].length, 8);
//! ```
//!
use crate::alignment::ond;
use crate::alignment::{Alignment, Row};
use crate::error::{Result, TafError};
use crate::tags::Tags;

/// Where a row of the merged block comes from.
#[derive(Debug, Clone, Copy)]
struct Slot {
    left: Option<usize>,
    right: Option<usize>,
}

fn run(length: usize, c: char) -> String {
    std::iter::repeat(c).take(length).collect()
}

/// Turns pairwise alignments against the longest string into an MSA.
///
/// `pairs[i][j]` is the position of `strings[i]` aligned to position `j` of
/// the longest string, or None. Returns one gapped string per input, all of
/// equal length.
pub fn make_msa(
    strings: &[&[u8]],
    pairs: &[Vec<Option<usize>>],
    longest_length: usize,
) -> Vec<String> {
    let n = strings.len();
    let mut msa: Vec<Vec<u8>> = vec![Vec::new(); n];
    // Last position of each string written to the MSA, plus one
    let mut consumed: Vec<usize> = vec![0; n];

    for j in 0..longest_length {
        let max_indel = (0..n).filter_map(|i| pairs[i][j].map(|k| k - consumed[i]))
                              .max().unwrap_or(0);
        for i in 0..n {
            match pairs[i][j] {
                Some(k) => {
                    let unaligned = &strings[i][consumed[i]..k];
                    msa[i].extend_from_slice(unaligned);
                    msa[i].extend(std::iter::repeat(b'-').take(max_indel - unaligned.len()));
                    msa[i].push(strings[i][k]);
                    consumed[i] = k + 1;
                },
                None => msa[i].extend(std::iter::repeat(b'-').take(max_indel + 1)),
            }
        }
    }

    let max_suffix = (0..n).map(|i| strings[i].len() - consumed[i]).max().unwrap_or(0);
    for i in 0..n {
        let suffix = &strings[i][consumed[i]..];
        msa[i].extend_from_slice(suffix);
        msa[i].extend(std::iter::repeat(b'-').take(max_suffix - suffix.len()));
    }

    msa.into_iter().map(|bytes| bytes.into_iter().map(|b| b as char).collect()).collect()
}

/// Aligns the gap sequences of the rows in `gaps` to each other.
///
/// Returns the gapped strings in the same order and the alignment length.
fn align_interstitial_gaps(
    gaps: &[String],
) -> (Vec<String>, usize) {
    let longest = match gaps.iter().max_by_key(|gap| gap.len()) {
        Some(longest) => longest.as_bytes(),
        None => return (Vec::new(), 0),
    };
    let strings: Vec<&[u8]> = gaps.iter().map(|gap| gap.as_bytes()).collect();
    let pairs: Vec<Vec<Option<usize>>> = strings.iter().map(|s| {
        ond::align(longest.len(), s.len(), |i, j| longest[i] == s[j], 1, 1)
    }).collect();

    let msa = make_msa(&strings, &pairs, longest.len());
    let length = msa.first().map_or(0, |s| s.len());
    (msa, length)
}

/// Merges `right` onto the end of `left`.
///
/// Both blocks must have been linked, eg. with
/// [link_adjacent](super::link_adjacent) or by a reader. Rows of `right`
/// that are linked to a row that they do not continue are treated as new
/// rows. Rows only present in `right` are inserted after the left
/// counterpart of the preceding shared row and padded with gaps on the
/// left; rows only present in `left` are padded on the right.
///
/// If `successor` is the block following `right`, its `left_row` links are
/// rewritten to point at the rows of the merged block.
pub fn merge_adjacent(
    left: Alignment,
    right: Alignment,
    successor: Option<&mut Alignment>,
) -> Result<Alignment> {
    if let Some(row) = right.rows.iter().find(|row| row.left_row.is_some_and(|l| l >= left.row_number())) {
        return Err(TafError::Precondition(format!(
            "row '{}' is linked to a row outside of the left block", row.sequence_name)))
    }
    if left.row_number() > 0 && right.row_number() > 0 && right.rows.iter().all(|row| row.left_row.is_none()) {
        return Err(TafError::Precondition("cannot merge blocks that have not been linked".to_string()))
    }

    // Substitutions can't be merged
    let links: Vec<Option<usize>> = right.rows.iter().map(|row| {
        row.left_row.filter(|l| left.rows[*l].is_predecessor(row))
    }).collect();

    // Row order of the merged block
    let mut slots: Vec<Slot> = (0..left.row_number()).map(|l| Slot { left: Some(l), right: None }).collect();
    let mut cursor = 0;
    for (r, link) in links.iter().enumerate() {
        match link {
            Some(l) => {
                let pos = slots.iter().position(|slot| slot.left == Some(*l)).unwrap_or(cursor);
                slots[pos].right = Some(r);
                cursor = pos + 1;
            },
            None => {
                slots.insert(cursor, Slot { left: None, right: Some(r) });
                cursor += 1;
            },
        }
    }

    // Interstitial gap strings in right row order
    let gaps: Vec<String> = right.rows.iter().zip(links.iter()).map(|(row, link)| {
        match link {
            Some(l) => {
                let gap_length = (row.start - left.rows[*l].end()) as usize;
                match &row.left_gap_sequence {
                    Some(gap) if gap.len() == gap_length => gap.clone(),
                    _ => run(gap_length, 'N'),
                }
            },
            None => String::new(),
        }
    }).collect();
    let (aligned_gaps, interstitial_length) = align_interstitial_gaps(&gaps);

    let left_columns = left.column_number;
    let trailing_gaps = run(right.column_number + interstitial_length, '-');
    let mut merged_index: Vec<Option<usize>> = vec![None; right.row_number()];
    let mut rows: Vec<Row> = Vec::with_capacity(slots.len());
    for slot in slots.iter() {
        let row = match (slot.left, slot.right) {
            (Some(l), None) => {
                let mut row = left.rows[l].clone();
                row.bases.push_str(&trailing_gaps);
                row.right_row = None;
                row
            },
            (Some(l), Some(r)) => {
                let l_row = &left.rows[l];
                let r_row = &right.rows[r];
                let mut row = l_row.clone();
                row.bases = format!("{}{}{}", l_row.bases, aligned_gaps[r], r_row.bases);
                row.length = r_row.end() - l_row.start;
                row.right_row = r_row.right_row;
                row
            },
            (None, Some(r)) => {
                let r_row = &right.rows[r];
                let mut row = r_row.coordinates_only();
                row.bases = format!("{}{}{}", run(left_columns, '-'), aligned_gaps[r], r_row.bases);
                row.right_row = r_row.right_row;
                row
            },
            (None, None) => {
                debug_assert!(false, "every slot holds a left or a right row");
                continue
            },
        };
        if let Some(r) = slot.right {
            merged_index[r] = Some(rows.len());
        }
        rows.push(row);
    }

    let mut column_tags: Vec<Tags> = left.column_tags;
    column_tags.resize(left_columns + interstitial_length, Tags::new());
    column_tags.extend(right.column_tags);

    if let Some(successor) = successor {
        successor.remap_left_rows(&merged_index);
    }

    Ok(Alignment {
        rows,
        column_number: left_columns + interstitial_length + right.column_number,
        column_tags,
    })
}

// Tests
#[cfg(test)]
mod tests {

    fn block(rows: &[(&str, i64, &str)]) -> crate::alignment::Alignment {
        use crate::alignment::{Alignment, Row};
        Alignment::from_rows(rows.iter().map(|(name, start, bases)| Row::new(name, *start, true, 1000, bases)).collect()).unwrap()
    }

    #[test]
    fn merge_contiguous_rows() {
        use crate::alignment::link_adjacent;
        use super::merge_adjacent;

        let mut left = block(&[("chr1", 0, "ACGTT")]);
        let mut right = block(&[("chr1", 5, "AAC")]);
        link_adjacent(&mut left, &mut right, true);
        let got = merge_adjacent(left, right, None).unwrap();

        assert_eq!(got.rows[0].bases, "ACGTTAAC");
        assert_eq!(got.rows[0].start, 0);
        assert_eq!(got.rows[0].length, 8);
        assert_eq!(got.column_number, 8);
        assert_eq!(got.column_tags.len(), 8);
    }

    #[test]
    fn merge_pads_deleted_and_inserted_rows() {
        use crate::alignment::link_adjacent;
        use super::merge_adjacent;

        let mut left = block(&[("a", 0, "AC"), ("b", 0, "GG")]);
        let mut right = block(&[("a", 2, "TTT"), ("c", 7, "CCC")]);
        link_adjacent(&mut left, &mut right, false);
        let got = merge_adjacent(left, right, None).unwrap();

        let bases: Vec<&str> = got.rows.iter().map(|row| row.bases.as_str()).collect();
        assert_eq!(bases, vec!["ACTTT", "--CCC", "GG---"]);
        assert_eq!(got.rows[1].sequence_name, "c");
        assert_eq!(got.rows[1].start, 7);
        assert_eq!(got.rows[1].length, 3);
        assert_eq!(got.rows[2].length, 2);
    }

    #[test]
    fn merge_aligns_interstitial_gaps() {
        use crate::alignment::link_adjacent;
        use super::merge_adjacent;

        let mut left = block(&[("a", 0, "AC"), ("b", 0, "AC")]);
        let mut right = block(&[("a", 4, "GT"), ("b", 3, "GT")]);
        right.rows[0].left_gap_sequence = Some("TA".to_string());
        right.rows[1].left_gap_sequence = Some("A".to_string());
        link_adjacent(&mut left, &mut right, false);
        let got = merge_adjacent(left, right, None).unwrap();

        assert_eq!(got.rows[0].bases, "ACTAGT");
        assert_eq!(got.rows[1].bases, "AC-AGT");
        assert_eq!(got.rows[0].length, 6);
        assert_eq!(got.rows[1].length, 5);
    }

    #[test]
    fn merge_fills_unknown_gaps_with_n() {
        use crate::alignment::link_adjacent;
        use super::merge_adjacent;

        let mut left = block(&[("a", 0, "AC")]);
        let mut right = block(&[("a", 4, "GT")]);
        link_adjacent(&mut left, &mut right, false);
        let got = merge_adjacent(left, right, None).unwrap();

        assert_eq!(got.rows[0].bases, "ACNNGT");
    }

    #[test]
    fn merge_unlinks_substitutions() {
        use crate::alignment::link_adjacent;
        use super::merge_adjacent;

        let mut left = block(&[("a", 0, "AC"), ("b", 0, "AC")]);
        let mut right = block(&[("a", 2, "G"), ("x", 0, "T")]);
        link_adjacent(&mut left, &mut right, true);
        assert_eq!(right.rows[1].left_row, Some(1));
        let got = merge_adjacent(left, right, None).unwrap();

        let names: Vec<&str> = got.rows.iter().map(|row| row.sequence_name.as_str()).collect();
        assert_eq!(names, vec!["a", "x", "b"]);
        assert_eq!(got.rows[1].bases, "--T");
        assert_eq!(got.rows[2].bases, "AC-");
    }

    #[test]
    fn merge_keeps_column_tags() {
        use crate::alignment::link_adjacent;
        use crate::tags::Tags;
        use super::merge_adjacent;

        let mut left = block(&[("a", 0, "A")]);
        let mut right = block(&[("a", 2, "C")]);
        left.set_column_tags(0, Tags::parse("q:1", ':')).unwrap();
        right.set_column_tags(0, Tags::parse("q:2", ':')).unwrap();
        link_adjacent(&mut left, &mut right, false);
        let got = merge_adjacent(left, right, None).unwrap();

        assert_eq!(got.column_number, 3);
        assert_eq!(got.column_tags[0].to_text(':'), "q:1");
        assert!(got.column_tags[1].is_empty());
        assert_eq!(got.column_tags[2].to_text(':'), "q:2");
    }

    #[test]
    fn merge_remaps_successor_links() {
        use crate::alignment::link_adjacent;
        use super::merge_adjacent;

        let mut left = block(&[("a", 0, "A"), ("b", 0, "A")]);
        let mut right = block(&[("c", 0, "C"), ("b", 1, "C")]);
        let mut next = block(&[("c", 1, "G"), ("b", 2, "G")]);
        link_adjacent(&mut left, &mut right, false);
        link_adjacent(&mut right, &mut next, false);
        let got = merge_adjacent(left, right, Some(&mut next)).unwrap();

        let names: Vec<&str> = got.rows.iter().map(|row| row.sequence_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(next.rows[0].left_row, Some(0));
        assert_eq!(next.rows[1].left_row, Some(2));
        assert_eq!(got.rows[0].right_row, Some(0));
        assert_eq!(got.rows[2].right_row, Some(1));
        assert_eq!(got.rows[1].right_row, None);
    }

    #[test]
    fn merge_unlinked_blocks_fails() {
        use crate::error::TafError;
        use super::merge_adjacent;

        let left = block(&[("a", 0, "A")]);
        let right = block(&[("a", 1, "C")]);

        assert!(matches!(merge_adjacent(left, right, None), Err(TafError::Precondition(_))));
    }

    #[test]
    fn make_msa_pads_insertions() {
        use super::make_msa;

        let strings: Vec<&[u8]> = vec![b"ACGT", b"AGT", b""];
        let pairs = vec![vec![Some(0), Some(1), Some(2), Some(3)],
                         vec![Some(0), None, Some(1), Some(2)],
                         vec![None, None, None, None]];
        let got = make_msa(&strings, &pairs, 4);

        assert_eq!(got, vec!["ACGT", "A-GT", "----"]);
    }
}
