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

//! Printer for writing [AlignmentBlock](crate::AlignmentBlock) records as plain text.
//!
//! ## Usage
//!
//! ```rust
//! use mafpipe::{AlignedSequence, AlignmentBlock, Strand};
//! use mafpipe::printer::{format_maf_block, format_maf_header};
//!
//! let mut block = AlignmentBlock::new();
//! block.add_sequence(AlignedSequence::with_coordinates("hg19.chr1", b"AC-GT".to_vec(), 10, Strand::Forward, 1000)).unwrap();
//! block.add_sequence(AlignedSequence::with_coordinates("mm10.chr2", b"ACTGT".to_vec(), 1500, Strand::Reverse, 2000)).unwrap();
//! block.set_score(Some(10.5));
//!
//! let mut output: Vec<u8> = Vec::new();
//! format_maf_header(&mut output).unwrap();
//! format_maf_block(&block, true, &mut output).unwrap();
//!
//! let mut expected: Vec<u8> = b"##maf version=1 program=mafpipe\n\n".to_vec();
//! expected.append(&mut b"a score=10.5\n".to_vec());
//! expected.append(&mut b"s hg19.chr1   10 4 + 1000 AC-GT\n".to_vec());
//! expected.append(&mut b"s mm10.chr2 1500 5 - 2000 ACTGT\n".to_vec());
//! expected.append(&mut b"\n".to_vec());
//!
//! assert_eq!(output, expected);
//! ```
//!

pub mod maf;

pub use maf::format_maf_block;
pub use maf::format_maf_header;
