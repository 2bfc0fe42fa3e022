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

//! Symbol predicates for the DNA alphabet used in alignment blocks.
//!
//! Symbols are stored as the raw bytes read from the .maf file. Lower case
//! letters denote soft-masked positions and compare equal to their upper case
//! counterparts in every predicate here.

/// Symbol written into alignment columns that have no residue.
pub const GAP: u8 = b'-';

/// Symbol used to pad a join between two merged blocks.
pub const UNKNOWN: u8 = b'N';

pub fn is_gap(
    symbol: u8,
) -> bool {
    symbol == b'-' || symbol == b'.'
}

/// True for `N` and every other non-ACGT, non-gap symbol.
pub fn is_unknown(
    symbol: u8,
) -> bool {
    !is_gap(symbol) && !matches!(symbol.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

pub fn is_soft_masked(
    symbol: u8,
) -> bool {
    symbol.is_ascii_lowercase()
}

/// Number of residues (non-gap symbols) in `symbols`.
pub fn count_residues(
    symbols: &[u8],
) -> u64 {
    symbols.iter().filter(|x| !is_gap(**x)).count() as u64
}
