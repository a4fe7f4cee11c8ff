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
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use taffy::Format;
use taffy::error::{Result, TafError};
use taffy::index::{parse_region, tai_path, Region, Tai};
use taffy::normalize::NormalizeOptions;
use taffy::printer::WriterOptions;

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    let initialized = stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init();
    if let Err(e) = initialized {
        eprintln!("taffy: could not set up logging: {}", e);
    }
}

fn open_input(
    path: &Option<PathBuf>,
) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(std::io::stdin()),
    })
}

fn open_output(
    path: &Option<PathBuf>,
) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

/// Reads the `.tai` index next to `input_file`.
fn read_index(
    input_file: &Path,
) -> Result<Tai> {
    let index_file = tai_path(input_file);
    let conn_index = File::open(&index_file).map_err(|e| {
        TafError::Precondition(format!("could not open index {}: {}, create it with `taffy index`", index_file.display(), e))
    })?;
    Tai::read(BufReader::new(conn_index))
}

fn run(
    cli: &cli::Cli,
) -> Result<()> {
    // Subcommands:
    match &cli.command {
        // View
        Some(cli::Commands::View {
            input_file,
            output_file,
            maf,
            regions,
            run_length_encode_bases,
            repeat_coordinates_every_n_columns,
            compress,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let format = if *maf { Format::Maf } else { Format::Taf };
            let options = WriterOptions {
                run_length_encode_bases: *run_length_encode_bases,
                repeat_coordinates_every_n_columns: *repeat_coordinates_every_n_columns,
                compress: *compress,
            };
            let conn_out = open_output(output_file)?;

            if regions.is_empty() {
                taffy::convert(open_input(input_file)?, conn_out, format, options)?;
                return Ok(())
            }

            let input_file = input_file.as_ref().ok_or_else(|| {
                TafError::Precondition("extracting regions needs an indexed input file (-i)".to_string())
            })?;
            let regions = regions.iter().map(|region| parse_region(region)).collect::<Result<Vec<Region>>>()?;

            let tai = read_index(input_file)?;
            taffy::extract(File::open(input_file)?, &tai, regions, conn_out, format, options)?;
        },

        // Index
        Some(cli::Commands::Index {
            input_file,
            index_block_size,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let tai = taffy::index(File::open(input_file)?, *index_block_size)?;

            let out_path = tai_path(input_file);
            let mut conn_out = BufWriter::new(File::create(&out_path)?);
            tai.write(&mut conn_out)?;
            conn_out.flush()?;
            log::info!("Wrote index with {} entries to {}", tai.len(), out_path.display());
        },

        // Stats
        Some(cli::Commands::Stats {
            input_file,
            sequence_lengths,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            if !*sequence_lengths {
                return Err(TafError::Precondition("pick a statistic to print, e.g. --sequence-lengths".to_string()))
            }
            let tai = read_index(input_file)?;
            let lengths = taffy::sequence_lengths(File::open(input_file)?, &tai)?;

            let mut conn_out = BufWriter::new(std::io::stdout());
            for (name, length) in lengths.iter() {
                writeln!(conn_out, "{}\t{}", name, length)?;
            }
            conn_out.flush()?;
        },

        // Norm
        Some(cli::Commands::Norm {
            input_file,
            output_file,
            maf,
            maximum_block_length_to_merge,
            maximum_gap_length,
            fraction_shared_rows,
            repeat_coordinates_every_n_columns,
            compress,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let format = if *maf { Format::Maf } else { Format::Taf };
            let options = NormalizeOptions {
                maximum_block_length_to_merge: *maximum_block_length_to_merge,
                maximum_gap_length: *maximum_gap_length,
                fraction_shared_rows: *fraction_shared_rows,
            };
            let writer_options = WriterOptions {
                repeat_coordinates_every_n_columns: *repeat_coordinates_every_n_columns,
                compress: *compress,
                ..Default::default()
            };
            log::info!("Merging blocks of at most {} columns over gaps of at most {} bases sharing {} of rows",
                       options.maximum_block_length_to_merge, options.maximum_gap_length, options.fraction_shared_rows);

            taffy::normalize(open_input(input_file)?, open_output(output_file)?, format, options, writer_options)?;
        },

        None => {
            cli::Cli::command().print_help()?;
        },
    }
    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("taffy: {}", e);
        std::process::exit(1);
    }
}
