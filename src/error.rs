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

//! Errors returned by the library.
use std::io;

use thiserror::Error;

/// Errors that can occur while reading, writing, merging or indexing alignments.
#[derive(Error, Debug)]
pub enum TafError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input is neither MAF nor TAF.
    #[error("Unrecognized input format: {0}")]
    Format(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Column, row or region index outside of the valid range.
    #[error("Index out of range: {0}")]
    Range(String),

    /// Operation called on input that does not satisfy its requirements.
    #[error("Precondition failed: {0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, TafError>;
