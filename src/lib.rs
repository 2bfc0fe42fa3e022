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

//! mafpipe is a library and a command-line client for filtering multiple
//! sequence alignments stored in the
//! [MAF](https://genome.ucsc.edu/FAQ/FAQformat.html#format5) format.
//!
//! Alignment blocks are read one at a time and passed through a chain of
//! stages, each of which can drop, trim, split, or merge blocks:
//!
//!   - Dropping blocks with too few columns.
//!   - Keeping the sequences of selected species.
//!   - Merging blocks that are adjacent in the genomes of selected species.
//!   - Removing columns that are gaps in all selected species.
//!   - Removing windows of columns with too many gaps, too many masked
//!     residues, or too low quality.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The mafpipe CLI supports the following subcommands:
//!   - `mafpipe filter` run a .maf file through the filtering stages.
//!
//! The stages run in the order: size, species, merge, full-gap, alignment,
//! mask, quality. Blocks removed by the windowed filters can be written to
//! separate files.
//!
//! ### Rust API
//!
//! Every stage implements [BlockSource] and takes the stage before it as
//! its input, so stages compose by wrapping each other. The following
//! structs are provided:
//!
//!   - [MafParser](parser::MafParser): reads blocks from a [BufRead](std::io::BufRead).
//!   - [BlockSizeFilter](filter::BlockSizeFilter), [SpeciesFilter](filter::SpeciesFilter), [FullGapFilter](filter::FullGapFilter): one block at a time.
//!   - [BlockMerger](merger::BlockMerger): joins adjacent blocks.
//!   - [WindowFilter](window::WindowFilter): removes windows of columns.
//!   - [OutputTee](output::OutputTee): writes blocks to a [Write](std::io::Write) as they pass.
//!   - [Synchronizer](sync::Synchronizer): runs a second chain in lock-step.
//!
//! [Pipeline](pipeline::Pipeline) builds chains of these in the order its
//! methods are called.
//!
//! ```rust
//! use mafpipe::BlockSource;
//! use mafpipe::filter::BlockSizeFilter;
//! use mafpipe::parser::MafParser;
//! use std::io::Cursor;
//!
//! let mut data: Vec<u8> = b"a score=1\n".to_vec();
//! data.append(&mut b"s hg19.chr1 0 4 + 100 ACGT\n\n".to_vec());
//! data.append(&mut b"a score=2\n".to_vec());
//! data.append(&mut b"s hg19.chr1 4 2 + 100 AC\n\n".to_vec());
//!
//! let mut filter = BlockSizeFilter::new(MafParser::new(Cursor::new(data)), 3);
//!
//! assert_eq!(filter.next_block().unwrap().unwrap().score(), Some(1.0));
//! assert!(filter.next_block().unwrap().is_none());
//! ```
//!

use std::io::BufRead;
use std::io::Write;

pub mod alphabet;
pub mod block;
pub mod error;
pub mod filter;
pub mod merger;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod printer;
pub mod source;
pub mod sync;
pub mod window;

pub use block::AlignedSequence;
pub use block::AlignmentBlock;
pub use block::Strand;
pub use error::Error;
pub use error::Result;
pub use source::BlockSource;
pub use source::Blocks;
pub use source::FilterBase;

/// Read all blocks from something that implements [BufRead].
///
/// ## Usage
/// ```rust
/// use mafpipe::parse_from_read;
/// use std::io::Cursor;
///
/// let mut data: Vec<u8> = b"##maf version=1\n\n".to_vec();
/// data.append(&mut b"a score=1\n".to_vec());
/// data.append(&mut b"s hg19.chr1 0 4 + 100 ACGT\n".to_vec());
/// data.append(&mut b"s mm10.chr1 0 3 + 100 AC-T\n\n".to_vec());
///
/// let blocks = parse_from_read(&mut Cursor::new(data)).unwrap();
///
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].species_list(), vec!["hg19", "mm10"]);
/// ```
///
pub fn parse_from_read<R: BufRead>(
    conn_in: &mut R,
) -> Result<Vec<AlignmentBlock>> {
    crate::parser::MafParser::new(conn_in).blocks().collect()
}

/// Write blocks in .maf format to something that implements [Write].
///
/// ## Usage
/// ```rust
/// use mafpipe::{parse_from_read, print_to_write};
/// use std::io::Cursor;
///
/// let mut data: Vec<u8> = b"##maf version=1 program=mafpipe\n\n".to_vec();
/// data.append(&mut b"a score=1\n".to_vec());
/// data.append(&mut b"s hg19.chr1 0 4 + 100 ACGT\n\n".to_vec());
///
/// let blocks = parse_from_read(&mut Cursor::new(data.clone())).unwrap();
///
/// let mut output: Vec<u8> = Vec::new();
/// print_to_write(&blocks, &mut output).unwrap();
///
/// assert_eq!(output, data);
/// ```
///
pub fn print_to_write<W: Write>(
    blocks: &[AlignmentBlock],
    conn_out: &mut W,
) -> Result<()> {
    crate::printer::format_maf_header(conn_out)?;
    for block in blocks {
        crate::printer::format_maf_block(block, true, conn_out)?;
    }
    conn_out.flush()?;
    Ok(())
}
