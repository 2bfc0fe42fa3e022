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

//! Filters that look at one block at a time.
//!
//! - [BlockSizeFilter](size::BlockSizeFilter) drops blocks with too few columns.
//! - [SpeciesFilter](species::SpeciesFilter) keeps the sequences of selected species.
//! - [FullGapFilter](full_gap::FullGapFilter) removes columns that are gaps in all selected species.
//!

pub mod full_gap;
pub mod size;
pub mod species;

pub use full_gap::FullGapFilter;
pub use size::BlockSizeFilter;
pub use species::SpeciesFilter;
