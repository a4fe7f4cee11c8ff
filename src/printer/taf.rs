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

//! Encoding of blocks as TAF columns.
//!
//! Coordinates are written on the first column of a block only for rows
//! whose position cannot be inferred from the previously written block, and
//! periodically repeated so that readers can resume decoding mid-file.
//!
use std::io::Write;

use crate::alignment::{Alignment, Row};
use crate::error::Result;

/// Encodes maximal runs of identical characters as `c n` token pairs.
///
/// ## Usage
///
/// ```rust
/// use taffy::printer::taf::run_length_encode;
///
/// assert_eq!(run_length_encode("AAAC--"), "A 3 C 1 - 2");
/// ```
pub fn run_length_encode(
    bases: &str,
) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut chars = bases.chars().peekable();
    while let Some(c) = chars.next() {
        let mut n = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            n += 1;
        }
        tokens.push(format!("{} {}", c, n));
    }
    tokens.join(" ")
}

fn format_coordinates(
    row: &Row,
) -> String {
    format!("{} {} {} {}", row.sequence_name, row.start, if row.strand { '+' } else { '-' }, row.sequence_length)
}

/// Left links usable for encoding: in range and strictly increasing.
fn usable_links(
    block: &Alignment,
    previous: Option<&Alignment>,
) -> Vec<Option<usize>> {
    let n = previous.map_or(0, |p| p.row_number());
    let mut last: Option<usize> = None;
    block.rows.iter().map(|row| {
        match row.left_row {
            Some(l) if l < n && last.map_or(true, |x| l > x) => {
                last = Some(l);
                Some(l)
            },
            _ => None,
        }
    }).collect()
}

/// Row edits for the first column of `block`.
///
/// Returns the edits and, per row, the number of columns since its
/// coordinates were last written.
pub fn format_coordinates_line(
    block: &Alignment,
    previous: Option<&Alignment>,
    repeat_coordinates_every_n_columns: i64,
) -> (String, Vec<i64>) {
    coordinates_line(block, previous, &usable_links(block, previous), repeat_coordinates_every_n_columns)
}

fn coordinates_line(
    block: &Alignment,
    previous: Option<&Alignment>,
    links: &[Option<usize>],
    repeat_coordinates_every_n_columns: i64,
) -> (String, Vec<i64>) {
    let mut ops: Vec<String> = Vec::new();

    if let Some(previous) = previous {
        let mut linked = vec![false; previous.row_number()];
        links.iter().flatten().for_each(|l| linked[*l] = true);
        let mut kept = 0;
        for is_linked in linked {
            if is_linked {
                kept += 1;
            } else {
                ops.push(format!("d {}", kept));
            }
        }
    }

    let mut report_everything = false;
    let mut counters: Vec<i64> = Vec::with_capacity(block.row_number());
    for (idx, (row, link)) in block.rows.iter().zip(links.iter()).enumerate() {
        let l_row = link.and_then(|l| previous.map(|p| (&p.rows[l], p.column_number as i64)));
        let counter = match l_row {
            None => {
                ops.push(format!("i {} {}", idx, format_coordinates(row)));
                report_everything |= idx == 0;
                0
            },
            Some((l_row, columns)) if l_row.is_predecessor(row) => {
                let since = l_row.bases_since_coordinates_reported + columns;
                let repeat = repeat_coordinates_every_n_columns > 0 && since >= repeat_coordinates_every_n_columns;
                if report_everything || repeat {
                    ops.push(format!("s {} {}", idx, format_coordinates(row)));
                    report_everything |= idx == 0;
                    0
                } else {
                    let gap_length = row.start - l_row.end();
                    if gap_length > 0 {
                        match &row.left_gap_sequence {
                            Some(gap) if gap.len() as i64 == gap_length => ops.push(format!("G {} {}", idx, gap)),
                            _ => ops.push(format!("g {} {}", idx, gap_length)),
                        }
                    }
                    since
                }
            },
            Some(_) => {
                ops.push(format!("s {} {}", idx, format_coordinates(row)));
                report_everything |= idx == 0;
                0
            },
        };
        counters.push(counter);
    }

    (ops.join(" "), counters)
}

fn encode_block<W: Write>(
    conn: &mut W,
    block: &Alignment,
    previous: Option<&Alignment>,
    links: &[Option<usize>],
    run_length_encode_bases: bool,
    repeat_coordinates_every_n_columns: i64,
) -> Result<Alignment> {
    let (ops, counters) = coordinates_line(block, previous, links, repeat_coordinates_every_n_columns);

    let rows: Vec<&[u8]> = block.rows.iter().map(|row| row.bases.as_bytes()).collect();
    let mut column = String::with_capacity(rows.len());
    for j in 0..block.column_number {
        column.clear();
        column.extend(rows.iter().map(|bases| bases[j] as char));

        let mut line = if run_length_encode_bases { run_length_encode(&column) } else { column.clone() };
        if j == 0 {
            line.push_str(" ;");
            if !ops.is_empty() {
                line.push(' ');
                line.push_str(&ops);
            }
        }
        if let Some(tags) = block.column_tags.get(j).filter(|tags| !tags.is_empty()) {
            line.push_str(" @ ");
            line.push_str(&tags.to_text(':'));
        }
        line.push('\n');
        conn.write_all(line.as_bytes())?;
    }

    let mut skeleton = block.coordinates_only();
    for (row, counter) in skeleton.rows.iter_mut().zip(counters) {
        row.bases_since_coordinates_reported = counter;
    }
    Ok(skeleton)
}

/// Writes `block` as TAF columns.
///
/// `previous` is the value returned when writing the block before, or None
/// for the first block. Returns a copy of `block` with coordinates only,
/// carrying the column counters needed to encode the next block.
pub fn write_taf_block<W: Write>(
    conn: &mut W,
    block: &Alignment,
    previous: Option<&Alignment>,
    run_length_encode_bases: bool,
    repeat_coordinates_every_n_columns: i64,
) -> Result<Alignment> {
    let links = usable_links(block, previous);
    encode_block(conn, block, previous, &links, run_length_encode_bases, repeat_coordinates_every_n_columns)
}

/// Writes `block` ignoring its left links: every row of `previous` is
/// deleted and every row of `block` inserted.
pub fn write_taf_block_unlinked<W: Write>(
    conn: &mut W,
    block: &Alignment,
    previous: Option<&Alignment>,
    run_length_encode_bases: bool,
    repeat_coordinates_every_n_columns: i64,
) -> Result<Alignment> {
    let links = vec![None; block.row_number()];
    encode_block(conn, block, previous, &links, run_length_encode_bases, repeat_coordinates_every_n_columns)
}
