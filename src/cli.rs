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
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Run a .maf file through the filtering stages
    Filter {
        // Input .maf file, reads stdin if missing or `-`
        #[arg(group = "input", required = false, help = "Input .maf file (.gz supported)")]
        input_file: Option<PathBuf>,

        // Output file path
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Write soft-masked residues in upper case
        #[arg(long = "no-mask", default_value_t = false)]
        no_mask: bool,

        // Drop blocks with fewer columns
        #[arg(long = "min-size", required = false)]
        min_size: Option<usize>,

        // Species kept by the species filter and examined by the other stages
        #[arg(long = "species", value_delimiter = ',', required = false)]
        species: Vec<String>,

        // Drop blocks that are missing any of the species
        #[arg(long = "strict", default_value_t = false)]
        strict: bool,

        // Drop blocks that contain a species more than once
        #[arg(long = "remove-duplicates", default_value_t = false)]
        remove_duplicates: bool,

        #[command(flatten)]
        merge: MergeArgs,

        // Remove columns that are gaps in all of the species
        #[arg(long = "full-gap", requires = "species", default_value_t = false)]
        full_gap: bool,

        #[command(flatten)]
        gap: GapArgs,

        #[command(flatten)]
        mask: MaskArgs,

        #[command(flatten)]
        quality: QualityArgs,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}

#[derive(Args)]
pub struct MergeArgs {
    // Merge blocks that are adjacent in the species
    #[arg(long = "merge", requires = "species", default_value_t = false)]
    pub merge: bool,

    // Largest gap between merged blocks
    #[arg(long = "max-dist", default_value_t = 0)]
    pub max_distance: u64,

    // Chromosomes that are never merged across
    #[arg(long = "ignore-chr", value_delimiter = ',', required = false)]
    pub ignore_chromosomes: Vec<String>,
}

#[derive(Args)]
pub struct GapArgs {
    // Window size of the alignment filter, disabled if missing
    #[arg(id = "gap_window", long = "gap-window", requires = "species", required = false)]
    pub window: Option<usize>,

    #[arg(id = "gap_step", long = "gap-step", default_value_t = 1)]
    pub step: usize,

    // Most gaps allowed in a window
    #[arg(long = "max-gap", default_value_t = 0)]
    pub max_gap: usize,

    // Count unknown residues as gaps
    #[arg(long = "gap-count-unknown", default_value_t = false)]
    pub count_unknown: bool,

    // Write removed windows here
    #[arg(id = "gap_trash", long = "gap-trash", required = false)]
    pub trash: Option<PathBuf>,
}

#[derive(Args)]
pub struct MaskArgs {
    // Window size of the mask filter, disabled if missing
    #[arg(id = "mask_window", long = "mask-window", requires = "species", required = false)]
    pub window: Option<usize>,

    #[arg(id = "mask_step", long = "mask-step", default_value_t = 1)]
    pub step: usize,

    // Most soft-masked residues allowed in a window
    #[arg(long = "max-masked", default_value_t = 0)]
    pub max_masked: usize,

    // Write removed windows here
    #[arg(id = "mask_trash", long = "mask-trash", required = false)]
    pub trash: Option<PathBuf>,
}

#[derive(Args)]
pub struct QualityArgs {
    // Window size of the quality filter, disabled if missing
    #[arg(id = "quality_window", long = "quality-window", requires = "species", required = false)]
    pub window: Option<usize>,

    #[arg(id = "quality_step", long = "quality-step", default_value_t = 1)]
    pub step: usize,

    // Lowest mean quality allowed in a window
    #[arg(long = "min-quality", default_value_t = 0.0)]
    pub min_quality: f64,

    // How the species are combined in a column, `min` or `mean`
    #[arg(long = "quality-statistic", default_value = "min")]
    pub statistic: String,

    // Write removed windows here
    #[arg(id = "quality_trash", long = "quality-trash", required = false)]
    pub trash: Option<PathBuf>,
}
