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

//! Encoding of blocks as MAF.
//!
use std::io::Write;

use crate::alignment::Alignment;
use crate::error::Result;

/// Writes `block` as an `a` line, one `s` line per row and a blank line.
pub fn write_maf_block<W: Write>(
    conn: &mut W,
    block: &Alignment,
) -> Result<()> {
    let mut text = String::from("a\n");
    for row in block.rows.iter() {
        text.push_str("s\t");
        text.push_str(&row.to_string());
        text.push('\n');
    }
    text.push('\n');
    conn.write_all(text.as_bytes())?;
    Ok(())
}
