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

//! Decoding of MAF blocks.
//!
//! Only `s` lines contribute rows; `i`, `e` and `q` lines are skipped and
//! the tags of the `a` line are ignored.
//!
use std::io::Read;

use crate::alignment::{is_alignment_base, Alignment, Row};
use crate::compression::LineReader;
use crate::error::{Result, TafError};
use crate::tags::Tags;

fn parse_row(
    line: &str,
) -> Result<Row> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 7 {
        return Err(TafError::Parse(format!("expected 7 fields in MAF line '{}', got {}", line, tokens.len())))
    }
    if let Some(c) = tokens[6].chars().find(|c| !is_alignment_base(*c)) {
        return Err(TafError::Parse(format!("invalid base '{}' in MAF line '{}'", c, line)))
    }
    let int = |x: &str| x.parse::<i64>().map_err(|_| TafError::Parse(format!("invalid integer '{}' in MAF line '{}'", x, line)));

    let strand = match tokens[4] {
        "+" => true,
        "-" => false,
        x => return Err(TafError::Parse(format!("invalid strand '{}' in MAF line '{}'", x, line))),
    };
    let row = Row::new(tokens[1], int(tokens[2])?, strand, int(tokens[5])?, tokens[6]);
    let length = int(tokens[3])?;
    if row.length != length {
        return Err(TafError::Parse(format!("sequence '{}' has {} bases but length {}", row.sequence_name, row.length, length)))
    }
    Ok(row)
}

/// Reads the next block.
///
/// Returns None at the end of the input. Rows are not linked.
pub fn read_maf_block<R: Read>(
    conn: &mut LineReader<R>,
) -> Result<Option<Alignment>> {
    loop {
        match conn.next_line()? {
            None => return Ok(None),
            Some(line) => {
                let line = line.trim_start();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if line.starts_with('a') {
                    break;
                }
                return Err(TafError::Parse(format!("expected a MAF block to start with an 'a' line, got '{}'", line)))
            },
        }
    }

    let mut rows: Vec<Row> = Vec::new();
    while let Some(line) = conn.peek_line()? {
        let line = line.trim_start();
        if line.starts_with('a') {
            break;
        }
        if line.is_empty() {
            conn.next_line()?;
            break;
        }
        match line.as_bytes()[0] {
            b's' => rows.push(parse_row(line)?),
            b'i' | b'e' | b'q' | b'#' => (),
            _ => return Err(TafError::Parse(format!("unexpected MAF line '{}'", line))),
        }
        conn.next_line()?;
    }

    Ok(Some(Alignment::from_rows(rows)?))
}

/// Parses the `##maf` header line.
pub fn read_maf_header(
    line: &str,
) -> Result<Tags> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("##maf") {
        return Err(TafError::Format(format!("header '{}' does not start with ##maf", line)))
    }
    Ok(Tags::from_tokens(tokens, '='))
}
