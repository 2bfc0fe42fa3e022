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
//! Per-position mask and quality lookups used by the windowed filters.
//!
//! Tracks are queried with a [Site]: one column of one sequence together
//! with the genomic position of its residue. [Site::walk] visits the columns
//! of a sequence in order and keeps a running residue count, so a block is
//! located in a single pass.
//!
//! Closures taking the species name and the genomic position of a residue
//! can be used directly as a [MaskTrack] or a [QualityTrack]:
//!
//! ```rust
//! use mafpipe::{AlignedSequence, Strand};
//! use mafpipe::window::track::{MaskTrack, Site};
//!
//! let repeats = |species: &str, pos: u64| species == "hg19" && (100..200).contains(&pos);
//! let seq = AlignedSequence::with_coordinates("hg19.chr1", b"A-CG".to_vec(), 98, Strand::Forward, 1000);
//!
//! let got: Vec<bool> = Site::walk(&seq).map(|site| repeats.is_masked(&site)).collect();
//! assert_eq!(got, vec![false, false, false, true]);
//! ```
//!

use crate::alphabet::is_gap;
use crate::alphabet::is_soft_masked;
use crate::AlignedSequence;

/// One column of an aligned sequence.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    pub sequence: &'a AlignedSequence,
    pub column: usize,
    /// Genomic position of the residue. None for gaps and for sequences
    /// without coordinates.
    pub position: Option<u64>,
}

impl<'a> Site<'a> {
    /// Site at `column`, located by counting the residues before it.
    pub fn locate(
        sequence: &'a AlignedSequence,
        column: usize,
    ) -> Self {
        Site { sequence, column, position: sequence.genomic_position(column) }
    }

    /// Every column of `sequence` in order.
    pub fn walk(
        sequence: &'a AlignedSequence,
    ) -> impl Iterator<Item = Site<'a>> {
        let mut next_position = sequence.start().ok();
        sequence.symbols().iter().enumerate().map(move |(column, x)| {
            let position = if is_gap(*x) {
                None
            } else {
                let pos = next_position;
                next_position = next_position.map(|p| p + 1);
                pos
            };
            Site { sequence, column, position }
        })
    }

    pub fn symbol(&self) -> Option<u8> { self.sequence.symbols().get(self.column).copied() }
}

pub trait MaskTrack {
    /// True if the residue at `site` is masked.
    fn is_masked(&self, site: &Site) -> bool;
}

pub trait QualityTrack {
    /// Quality score of the residue at `site`, if known.
    fn quality(&self, site: &Site) -> Option<i32>;
}

/// Lower case residues are masked.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftMask;

impl MaskTrack for SoftMask {
    fn is_masked(
        &self,
        site: &Site,
    ) -> bool {
        site.symbol().is_some_and(is_soft_masked)
    }
}

/// Qualities from the `q` lines of the .maf file.
///
/// `0`-`9` are taken as is and `F` (finished sequence) is 10. Gaps and
/// sequences without a `q` line have no quality.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedQuality;

impl QualityTrack for EmbeddedQuality {
    fn quality(
        &self,
        site: &Site,
    ) -> Option<i32> {
        if site.sequence.is_gap_at(site.column) {
            return None
        }
        match site.sequence.quality()?.get(site.column)? {
            x @ b'0'..=b'9' => Some((x - b'0') as i32),
            b'F' => Some(10),
            _ => None,
        }
    }
}

impl<F> MaskTrack for F where F: Fn(&str, u64) -> bool {
    fn is_masked(
        &self,
        site: &Site,
    ) -> bool {
        site.position.is_some_and(|pos| self(site.sequence.species(), pos))
    }
}

impl<F> QualityTrack for F where F: Fn(&str, u64) -> Option<i32> {
    fn quality(
        &self,
        site: &Site,
    ) -> Option<i32> {
        site.position.and_then(|pos| self(site.sequence.species(), pos))
    }
}
