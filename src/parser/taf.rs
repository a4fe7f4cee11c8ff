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

//! Decoding of TAF columns and blocks.
//!
//! A TAF block starts at a column line carrying row coordinate changes after
//! a `;` token and continues until the next such line. The rows of a block
//! are derived from the previous block and the coordinate changes.
//!
use std::io::Read;

use crate::alignment::{count_bases, is_alignment_base, Alignment, Row};
use crate::compression::LineReader;
use crate::error::{Result, TafError};
use crate::tags::Tags;

/// Name, start, strand and sequence length of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub sequence_name: String,
    pub start: i64,
    pub strand: bool,
    pub sequence_length: i64,
}

/// Row edit encoded on the first line of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOp {
    Insert { index: usize, coordinates: Coordinates },
    Substitute { index: usize, coordinates: Coordinates },
    Delete { index: usize },
    Gap { index: usize, length: i64 },
    GapSequence { index: usize, sequence: String },
}

/// One parsed TAF line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLine {
    pub bases: String,
    // Some if the line starts a block
    pub ops: Option<Vec<RowOp>>,
    pub tags: Tags,
}

impl ColumnLine {
    /// Number of rows that receive full coordinates on this line.
    pub fn coordinate_count(&self) -> usize {
        self.ops.as_ref().map_or(0, |ops| {
            ops.iter().filter(|op| matches!(op, RowOp::Insert { .. } | RowOp::Substitute { .. })).count()
        })
    }

    /// Coordinates of the reference row, if this line gives coordinates
    /// for every row.
    pub fn anchor(&self) -> Option<&Coordinates> {
        if self.coordinate_count() != self.bases.len() {
            return None
        }
        self.ops.as_ref()?.iter().find_map(|op| match op {
            RowOp::Insert { index: 0, coordinates } | RowOp::Substitute { index: 0, coordinates } => Some(coordinates),
            _ => None,
        })
    }
}

fn parse_error(line: &str, message: &str) -> TafError {
    TafError::Parse(format!("{} in TAF line '{}'", message, line))
}

fn parse_int<T: std::str::FromStr>(
    token: Option<&str>,
    line: &str,
) -> Result<T> {
    token.and_then(|x| x.parse::<T>().ok())
         .ok_or_else(|| parse_error(line, &format!("expected an integer, got '{}'", token.unwrap_or(""))))
}

fn parse_coordinates<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut I,
    line: &str,
) -> Result<Coordinates> {
    let sequence_name = tokens.next().ok_or_else(|| parse_error(line, "missing sequence name"))?.to_string();
    let start = parse_int::<i64>(tokens.next(), line)?;
    let strand = match tokens.next() {
        Some("+") => true,
        Some("-") => false,
        other => return Err(parse_error(line, &format!("invalid strand '{}'", other.unwrap_or("")))),
    };
    let sequence_length = parse_int::<i64>(tokens.next(), line)?;
    Ok(Coordinates { sequence_name, start, strand, sequence_length })
}

fn parse_ops(
    tokens: &[&str],
    line: &str,
) -> Result<Vec<RowOp>> {
    let mut ops: Vec<RowOp> = Vec::new();
    let mut tokens = tokens.iter().copied();
    while let Some(op) = tokens.next() {
        let index = parse_int::<usize>(tokens.next(), line)?;
        let row_op = match op {
            "i" => RowOp::Insert { index, coordinates: parse_coordinates(&mut tokens, line)? },
            "s" => RowOp::Substitute { index, coordinates: parse_coordinates(&mut tokens, line)? },
            "d" => RowOp::Delete { index },
            "g" => RowOp::Gap { index, length: parse_int::<i64>(tokens.next(), line)? },
            "G" => {
                let sequence = tokens.next().ok_or_else(|| parse_error(line, "missing gap sequence"))?;
                RowOp::GapSequence { index, sequence: sequence.to_string() }
            },
            _ => return Err(parse_error(line, &format!("unknown row operation '{}'", op))),
        };
        ops.push(row_op);
    }
    Ok(ops)
}

/// Expands `c n` token pairs into a run of `n` copies of `c`.
pub fn run_length_decode(
    tokens: &[&str],
) -> Result<String> {
    if tokens.len() % 2 != 0 {
        return Err(TafError::Parse(format!("odd number of run length tokens in '{}'", tokens.join(" "))))
    }
    let mut bases = String::new();
    for pair in tokens.chunks(2) {
        let mut chars = pair[0].chars();
        let base = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(TafError::Parse(format!("run length base '{}' is not a single character", pair[0]))),
        };
        let count = pair[1].parse::<usize>().ok().filter(|n| *n > 0)
            .ok_or_else(|| TafError::Parse(format!("invalid run length '{}'", pair[1])))?;
        bases.extend(std::iter::repeat(base).take(count));
    }
    Ok(bases)
}

/// Parses a TAF column line.
pub fn parse_column_line(
    line: &str,
    run_length_encode_bases: bool,
) -> Result<ColumnLine> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let coordinates_at = tokens.iter().position(|x| *x == ";");
    let tags_at = tokens.iter().position(|x| *x == "@");
    let bases_end = coordinates_at.or(tags_at).unwrap_or(tokens.len());

    let bases = if run_length_encode_bases {
        run_length_decode(&tokens[0..bases_end])?
    } else {
        match &tokens[0..bases_end] {
            [bases] => bases.to_string(),
            _ => return Err(parse_error(line, "expected a single column of bases")),
        }
    };

    if let Some(c) = bases.chars().find(|c| !is_alignment_base(*c)) {
        return Err(parse_error(line, &format!("invalid base '{}'", c)))
    }

    let ops = match coordinates_at {
        Some(at) => {
            let ops_end = tags_at.filter(|x| *x > at).unwrap_or(tokens.len());
            Some(parse_ops(&tokens[(at + 1)..ops_end], line)?)
        },
        None => None,
    };

    let tags = match tags_at {
        Some(at) => Tags::from_tokens(tokens[(at + 1)..].iter().copied(), ':'),
        None => Tags::new(),
    };

    Ok(ColumnLine { bases, ops, tags })
}

/// Rows of a new block from the previous block and the row edits.
///
/// Without a previous block substitutions are read as insertions and the
/// other edits are ignored, which allows decoding to resume at any line
/// that gives coordinates for every row.
fn establish_rows(
    previous: Option<&Alignment>,
    ops: &[RowOp],
    line: &str,
) -> Result<Vec<Row>> {
    let mut rows: Vec<Row> = previous.map_or_else(Vec::new, |block| {
        block.rows.iter().enumerate().map(|(idx, l_row)| Row {
            sequence_name: l_row.sequence_name.clone(),
            start: l_row.end(),
            strand: l_row.strand,
            sequence_length: l_row.sequence_length,
            left_row: Some(idx),
            ..Default::default()
        }).collect()
    });
    let resync = previous.is_none();

    let out_of_range = |index: usize, n: usize| parse_error(line, &format!("row {} out of range for {} rows", index, n));
    let insert = |rows: &mut Vec<Row>, index: usize, coordinates: &Coordinates| -> Result<()> {
        if index > rows.len() {
            return Err(out_of_range(index, rows.len()))
        }
        rows.insert(index, Row {
            sequence_name: coordinates.sequence_name.clone(),
            start: coordinates.start,
            strand: coordinates.strand,
            sequence_length: coordinates.sequence_length,
            ..Default::default()
        });
        Ok(())
    };
    for op in ops {
        match op {
            RowOp::Insert { index, coordinates } => insert(&mut rows, *index, coordinates)?,
            RowOp::Substitute { index, coordinates } if resync => insert(&mut rows, *index, coordinates)?,
            RowOp::Substitute { index, coordinates } => {
                let n = rows.len();
                let row = rows.get_mut(*index).ok_or_else(|| out_of_range(*index, n))?;
                row.sequence_name = coordinates.sequence_name.clone();
                row.start = coordinates.start;
                row.strand = coordinates.strand;
                row.sequence_length = coordinates.sequence_length;
            },
            _ if resync => (),
            RowOp::Delete { index } => {
                if *index >= rows.len() {
                    return Err(out_of_range(*index, rows.len()))
                }
                rows.remove(*index);
            },
            RowOp::Gap { index, length } => {
                let n = rows.len();
                rows.get_mut(*index).ok_or_else(|| out_of_range(*index, n))?.start += length;
            },
            RowOp::GapSequence { index, sequence } => {
                let n = rows.len();
                let row = rows.get_mut(*index).ok_or_else(|| out_of_range(*index, n))?;
                row.start += sequence.len() as i64;
                row.left_gap_sequence = Some(sequence.clone());
            },
        }
    }
    Ok(rows)
}

fn is_skipped(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

/// Reads the next block.
///
/// Returned rows are linked to `previous` through `left_row`. Returns None
/// at the end of the input.
pub fn read_taf_block<R: Read>(
    conn: &mut LineReader<R>,
    previous: Option<&Alignment>,
    run_length_encode_bases: bool,
) -> Result<Option<Alignment>> {
    let first = loop {
        match conn.next_line()? {
            None => return Ok(None),
            Some(line) if is_skipped(&line) => continue,
            Some(line) => break line,
        }
    };
    let column = parse_column_line(&first, run_length_encode_bases)?;
    let mut rows = establish_rows(previous, column.ops.as_deref().unwrap_or(&[]), &first)?;

    let mut columns: Vec<String> = vec![column.bases];
    let mut column_tags: Vec<Tags> = vec![column.tags];
    loop {
        let line = match conn.peek_line()? {
            None => break,
            Some(line) => line,
        };
        if is_skipped(line) {
            conn.next_line()?;
            continue;
        }
        let column = parse_column_line(line, run_length_encode_bases)?;
        if column.ops.is_some() {
            break;
        }
        columns.push(column.bases);
        column_tags.push(column.tags);
        conn.next_line()?;
    }

    if let Some(column) = columns.iter().find(|column| column.len() != rows.len()) {
        return Err(parse_error(&first, &format!("column '{}' does not have {} rows", column, rows.len())))
    }

    let mut row_bases: Vec<Vec<u8>> = vec![Vec::with_capacity(columns.len()); rows.len()];
    for column in columns.iter() {
        for (bases, base) in row_bases.iter_mut().zip(column.bytes()) {
            bases.push(base);
        }
    }
    for (row, bases) in rows.iter_mut().zip(row_bases) {
        row.bases = bases.into_iter().map(|b| b as char).collect();
        row.length = count_bases(&row.bases);
    }

    Ok(Some(Alignment { rows, column_number: columns.len(), column_tags }))
}

/// Parses the `#taf` header line.
pub fn read_taf_header(
    line: &str,
) -> Result<Tags> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("#taf") {
        return Err(TafError::Format(format!("header '{}' does not start with #taf", line)))
    }
    Ok(Tags::from_tokens(tokens, ':'))
}
