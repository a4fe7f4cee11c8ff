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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Convert between MAF and TAF, optionally extracting regions
    View {
        // Input MAF or TAF file, reads from stdin if not given
        #[arg(short = 'i', long = "input", required = false)]
        input_file: Option<PathBuf>,

        // Output file path, writes to stdout if not given
        #[arg(short = 'o', long = "output", required = false)]
        output_file: Option<PathBuf>,

        // Write MAF instead of TAF
        #[arg(short = 'm', long = "maf", default_value_t = false)]
        maf: bool,

        // Regions to extract, as contig, contig:start or contig:start-end
        #[arg(short = 'r', long = "region", required = false, help = "Region(s) to extract, requires <input>.tai")]
        regions: Vec<String>,

        // Run-length encode the bases of TAF output
        #[arg(short = 'a', long = "run-length-encode-bases", default_value_t = false)]
        run_length_encode_bases: bool,

        // Repeat coordinates of each row at least every n columns
        #[arg(short = 's', long = "repeat-coordinates-every-n-columns", default_value_t = 10_000)]
        repeat_coordinates_every_n_columns: i64,

        // BGZF compress the output
        #[arg(short = 'c', long = "compress", default_value_t = false)]
        compress: bool,

        // Verbosity
        #[arg(short = 'v', long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Index a MAF or TAF file for random access
    Index {
        // Input file, the index is written to <input>.tai
        #[arg(short = 'i', long = "input", required = true)]
        input_file: PathBuf,

        // Distance in reference bases between index entries
        #[arg(short = 'b', long = "block-size", default_value_t = 10_000)]
        index_block_size: i64,

        // Verbosity
        #[arg(short = 'v', long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Print statistics of an indexed MAF or TAF file
    Stats {
        // Input file, needs <input>.tai
        #[arg(short = 'i', long = "input", required = true)]
        input_file: PathBuf,

        // Print the length of each reference sequence
        #[arg(short = 's', long = "sequence-lengths", default_value_t = false)]
        sequence_lengths: bool,

        // Verbosity
        #[arg(short = 'v', long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Merge small adjacent blocks
    Norm {
        // Input MAF or TAF file, reads from stdin if not given
        #[arg(short = 'i', long = "input", required = false)]
        input_file: Option<PathBuf>,

        // Output file path, writes to stdout if not given
        #[arg(short = 'o', long = "output", required = false)]
        output_file: Option<PathBuf>,

        // Write MAF instead of TAF
        #[arg(short = 'm', long = "maf", default_value_t = false)]
        maf: bool,

        // Merge two blocks only if one of them has at most this many columns
        #[arg(short = 'k', long = "maximum-block-length-to-merge", default_value_t = 200)]
        maximum_block_length_to_merge: usize,

        // Merge two blocks only if the unaligned sequence between them is at most this long
        #[arg(short = 'n', long = "maximum-gap-length", default_value_t = 30)]
        maximum_gap_length: i64,

        // Fraction of rows the two blocks need to share to be merged
        #[arg(short = 'q', long = "fraction-shared-rows", default_value_t = 0.6)]
        fraction_shared_rows: f64,

        // Repeat coordinates of each row at least every n columns
        #[arg(short = 's', long = "repeat-coordinates-every-n-columns", default_value_t = 1_000)]
        repeat_coordinates_every_n_columns: i64,

        // BGZF compress the output
        #[arg(short = 'c', long = "compress", default_value_t = false)]
        compress: bool,

        // Verbosity
        #[arg(short = 'v', long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
