// mafpipe: Composable filtering pipelines for multiple alignment blocks.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
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
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use flate2::read::MultiGzDecoder;

use mafpipe::pipeline::{Pipeline, TrashSink, WindowParams};
use mafpipe::window::criteria::QualityStatistic;
use mafpipe::window::track::{EmbeddedQuality, SoftMask};

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) -> Result<(), E> {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()?;
    Ok(())
}

/// Opens `path` for reading, or stdin if it is missing or `-`.
///
/// Files ending in .gz are decompressed.
fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn BufRead>, E> {
    match path {
        Some(file) if file.as_os_str() != "-" => {
            let f = File::open(file)?;
            if file.extension().is_some_and(|x| x == "gz") {
                Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
            } else {
                Ok(Box::new(BufReader::new(f)))
            }
        },
        _ => Ok(Box::new(BufReader::new(std::io::stdin()))),
    }
}

/// Opens `path` for writing, or stdout if it is missing.
fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>, E> {
    match path {
        Some(file) => Ok(Box::new(BufWriter::new(File::create(file)?))),
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
    }
}

fn open_trash(path: &Option<PathBuf>) -> Result<Option<TrashSink<'static>>, E> {
    match path {
        Some(file) => Ok(Some(Box::new(BufWriter::new(File::create(file)?)))),
        None => Ok(None),
    }
}

fn main() -> Result<(), E> {
    let cli = cli::Cli::parse();

    // Subcommands:
    match &cli.command {
        // Filter
        Some(cli::Commands::Filter {
            input_file,
            out_file,
            no_mask,
            min_size,
            species,
            strict,
            remove_duplicates,
            merge,
            full_gap,
            gap,
            mask,
            quality,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 })?;

            let mut pipeline = Pipeline::from_reader(open_input(input_file)?).verbose(*verbose);

            if let Some(min_size) = min_size {
                pipeline = pipeline.filter_size(*min_size);
            }
            if !species.is_empty() {
                pipeline = pipeline.filter_species(species, *strict, *remove_duplicates);
            }
            if merge.merge {
                pipeline = pipeline.merge_blocks(species, merge.max_distance, &merge.ignore_chromosomes);
            }
            if *full_gap {
                pipeline = pipeline.filter_full_gaps(species);
            }
            if let Some(window_size) = gap.window {
                let params = WindowParams { species: species.clone(), window_size, step: gap.step };
                pipeline = pipeline.filter_alignment(&params, gap.max_gap, gap.count_unknown, open_trash(&gap.trash)?)?;
            }
            if let Some(window_size) = mask.window {
                let params = WindowParams { species: species.clone(), window_size, step: mask.step };
                pipeline = pipeline.filter_mask(&params, SoftMask, mask.max_masked, open_trash(&mask.trash)?)?;
            }
            if let Some(window_size) = quality.window {
                let params = WindowParams { species: species.clone(), window_size, step: quality.step };
                let statistic = QualityStatistic::from_str(&quality.statistic)?;
                pipeline = pipeline.filter_quality(&params, EmbeddedQuality, quality.min_quality, statistic, open_trash(&quality.trash)?)?;
            }

            let n = pipeline.write_to(open_output(out_file)?, !*no_mask)?.run()?;
            log::info!("wrote {} blocks", n);
        },
        None => {},
    }

    Ok(())
}
