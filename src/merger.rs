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

//! Merging of consecutive blocks whose sequences are contiguous in the genome.
//!
//! The caller chooses the focus species. Two consecutive blocks are merged
//! when every focus species present in both blocks continues on the same
//! chromosome and strand, at most `max_distance` positions after the end of
//! the first block, and all focus species are separated by the same
//! distance. The separating positions are filled with `N` in the merged
//! sequences.
//!
//! Sequences of the other species are merged without testing and lose their
//! coordinates. The merged score is the column-weighted mean of the input
//! scores and the pass value is kept only if both blocks agree on it.
//!
//! ## Usage
//!
//! ```rust
//! use mafpipe::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
//! use mafpipe::merger::BlockMerger;
//! use std::collections::VecDeque;
//!
//! let first = AlignmentBlock::from_sequences(vec![
//!     AlignedSequence::with_coordinates("hg19.chr1", b"ACGT".to_vec(), 100, Strand::Forward, 5000),
//! ]).unwrap();
//! let second = AlignmentBlock::from_sequences(vec![
//!     AlignedSequence::with_coordinates("hg19.chr1", b"GG".to_vec(), 104, Strand::Forward, 5000),
//! ]).unwrap();
//!
//! let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![first, second]);
//! let mut merger = BlockMerger::new(source, &["hg19".to_string()], 0);
//!
//! let merged = merger.next_block().unwrap().unwrap();
//! assert_eq!(merged.sequence(0).unwrap().symbols(), b"ACGTGG");
//! assert_eq!(merged.sequence(0).unwrap().stop().unwrap(), 105);
//! assert!(merger.next_block().unwrap().is_none());
//! ```
//!

use crate::alphabet::GAP;
use crate::alphabet::UNKNOWN;
use crate::AlignedSequence;
use crate::AlignmentBlock;
use crate::BlockSource;
use crate::FilterBase;
use crate::Result;

pub struct BlockMerger<S: BlockSource> {
    base: FilterBase<S>,
    species: Vec<String>,
    ignore_chromosomes: Vec<String>,
    max_distance: u64,

    // Lookahead
    incoming: Option<AlignmentBlock>,
    started: bool,
}

impl<S: BlockSource> BlockMerger<S> {
    pub fn new(
        upstream: S,
        species: &[String],
        max_distance: u64,
    ) -> Self {
        BlockMerger {
            base: FilterBase::new(upstream, "mafpipe::block_merger"),
            species: species.to_vec(),
            ignore_chromosomes: Vec::new(),
            max_distance,
            incoming: None, started: false,
        }
    }

    /// Like [new](BlockMerger::new), but reads the first block right away
    /// so that upstream errors are reported on construction.
    pub fn try_new(
        upstream: S,
        species: &[String],
        max_distance: u64,
    ) -> Result<Self> {
        let mut merger = BlockMerger::new(upstream, species, max_distance);
        merger.incoming = merger.base.pull()?;
        merger.started = true;
        Ok(merger)
    }

    pub fn base_mut(&mut self) -> &mut FilterBase<S> { &mut self.base }

    /// Never merge across blocks on `chromosome` (eg. `Un`).
    pub fn ignore_chromosome(
        &mut self,
        chromosome: &str,
    ) {
        self.ignore_chromosomes.push(chromosome.to_string());
    }

    fn is_target(
        &self,
        species: &str,
    ) -> bool {
        self.species.iter().any(|x| x == species)
    }

    fn is_ignored(
        &self,
        chromosome: &str,
    ) -> bool {
        self.ignore_chromosomes.iter().any(|x| x == chromosome)
    }

    /// Number of positions separating `current` from `next`, or None if
    /// the blocks cannot be merged.
    ///
    /// Errors if a focus species present in both blocks lacks coordinates.
    fn spacer(
        &self,
        current: &AlignmentBlock,
        next: &AlignmentBlock,
    ) -> Result<Option<u64>> {
        let mut spacer: Option<u64> = None;
        for species in self.species.iter() {
            let (Ok(first), Ok(second)) = (current.sequence_for_species(species), next.sequence_for_species(species)) else {
                continue
            };
            let end = first.start()? + first.genomic_size();
            let start = second.start()?;

            if first.chromosome() != second.chromosome()
                || self.is_ignored(first.chromosome())
                || first.strand() != second.strand()
                || first.src_size() != second.src_size()
            {
                return Ok(None)
            }
            if start < end || start - end > self.max_distance {
                return Ok(None)
            }
            match spacer {
                Some(space) if space != start - end => return Ok(None),
                _ => spacer = Some(start - end),
            }
        }
        Ok(spacer)
    }

    fn merge(
        &self,
        current: AlignmentBlock,
        next: AlignmentBlock,
        space: usize,
    ) -> Result<AlignmentBlock> {
        let n1 = current.number_of_columns();
        let n2 = next.number_of_columns();

        let mut merged = AlignmentBlock::new();
        merged.set_score(merged_score(current.score(), n1, next.score(), n2));
        merged.set_pass(if current.pass() == next.pass() { current.pass() } else { None });

        let mut partners: Vec<Option<AlignedSequence>> = next.into_sequences().into_iter().map(Some).collect();
        for mut seq in current.into_sequences() {
            // k-th occurrence of a species pairs with its k-th occurrence in `next`
            let partner = partners.iter_mut()
                .find(|x| x.as_ref().is_some_and(|other| other.species() == seq.species()))
                .and_then(|x| x.take());

            match partner {
                Some(other) => {
                    let description = seq.description();
                    let contiguous = joins_exactly(&seq, &other, space);
                    seq.pad_right(space, UNKNOWN);
                    seq.append(&other);
                    if !contiguous {
                        seq.remove_coordinates();
                    }
                    if space > 0 {
                        self.base.debug(format_args!("a spacer of size {} was inserted in sequence for species {}", space, seq.species()));
                    }
                    self.base.debug(format_args!("merging {} with {} into {}", description, other.description(), seq.description()));
                },
                None => seq.pad_right(space + n2, GAP),
            }
            if !self.is_target(seq.species()) {
                seq.remove_coordinates();
            }
            merged.add_sequence(seq)?;
        }

        for mut seq in partners.into_iter().flatten() {
            seq.pad_left(n1 + space, GAP);
            if !self.is_target(seq.species()) {
                seq.remove_coordinates();
            }
            merged.add_sequence(seq)?;
        }

        Ok(merged)
    }
}

/// True if `second` continues `first` on the same contig after `space` positions.
fn joins_exactly(
    first: &AlignedSequence,
    second: &AlignedSequence,
    space: usize,
) -> bool {
    match (first.start(), second.start()) {
        (Ok(start1), Ok(start2)) => {
            first.chromosome() == second.chromosome()
                && first.strand() == second.strand()
                && start1 + first.genomic_size() + space as u64 == start2
        },
        _ => false,
    }
}

/// Mean of the available scores weighted by the number of columns.
pub fn merged_score(
    score1: Option<f64>,
    n1: usize,
    score2: Option<f64>,
    n2: usize,
) -> Option<f64> {
    match (score1, score2) {
        (Some(s1), Some(s2)) => {
            let total = (n1 + n2) as f64;
            if total > 0.0 {
                Some((s1 * n1 as f64 + s2 * n2 as f64) / total)
            } else {
                Some((s1 + s2) / 2.0)
            }
        },
        (Some(s1), None) => Some(s1),
        (None, Some(s2)) => Some(s2),
        (None, None) => None,
    }
}

impl<S: BlockSource> BlockSource for BlockMerger<S> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        if !self.started {
            self.started = true;
            self.incoming = self.base.pull()?;
        }
        let Some(mut current) = self.incoming.take() else { return Ok(None) };

        loop {
            let Some(next) = self.base.pull()? else { return Ok(Some(current)) };
            match self.spacer(&current, &next)? {
                Some(space) => {
                    self.base.log(format_args!("merging two consecutive blocks"));
                    current = self.merge(current, next, space as usize)?;
                },
                None => {
                    self.incoming = Some(next);
                    return Ok(Some(current))
                },
            }
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn single(name: &str, symbols: &[u8], start: u64) -> crate::AlignmentBlock {
        use crate::{AlignedSequence, AlignmentBlock, Strand};
        AlignmentBlock::from_sequences(vec![AlignedSequence::with_coordinates(name, symbols.to_vec(), start, Strand::Forward, 10000)]).unwrap()
    }

    #[test]
    fn merges_contiguous_blocks() {
        use super::BlockMerger;
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            single("A.chr1", &[b'C'; 100], 100),
            single("A.chr1", &[b'G'; 50], 200),
        ]);
        let mut merger = BlockMerger::new(source, &["A".to_string()], 0);

        let got = merger.next_block().unwrap().unwrap();
        assert_eq!(got.number_of_columns(), 150);
        let seq = got.sequence_for_species("A").unwrap();
        assert_eq!(seq.start().unwrap(), 100);
        assert_eq!(seq.stop().unwrap(), 249);
        assert!(merger.next_block().unwrap().is_none());
        assert!(merger.next_block().unwrap().is_none());
    }

    #[test]
    fn keeps_separated_blocks_apart() {
        use super::BlockMerger;
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            single("A.chr1", &[b'C'; 100], 100),
            single("A.chr1", &[b'G'; 50], 201),
        ]);
        let mut merger = BlockMerger::new(source, &["A".to_string()], 0);

        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 100);
        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 50);
        assert!(merger.next_block().unwrap().is_none());
    }

    #[test]
    fn pads_gap_with_unknown_symbols() {
        use super::BlockMerger;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
        use std::collections::VecDeque;

        let first = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", b"ACGT".to_vec(), 100, Strand::Forward, 10000),
            AlignedSequence::with_coordinates("C.chr9", b"AC-T".to_vec(), 7, Strand::Forward, 10000),
        ]).unwrap();
        let second = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", b"GG".to_vec(), 107, Strand::Forward, 10000),
        ]).unwrap();

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![first, second]);
        let mut merger = BlockMerger::new(source, &["A".to_string()], 5);

        let got = merger.next_block().unwrap().unwrap();
        assert_eq!(got.number_of_columns(), 9);
        let seq = got.sequence_for_species("A").unwrap();
        assert_eq!(seq.symbols(), b"ACGTNNNGG");
        assert_eq!(seq.start().unwrap(), 100);
        assert_eq!(seq.stop().unwrap(), 108);

        let other = got.sequence_for_species("C").unwrap();
        assert_eq!(other.symbols(), b"AC-T-----");
        assert!(!other.has_coordinates());
    }

    #[test]
    fn distance_must_agree_across_species() {
        use super::BlockMerger;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
        use std::collections::VecDeque;

        let first = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", b"ACGT".to_vec(), 100, Strand::Forward, 10000),
            AlignedSequence::with_coordinates("B.chr2", b"ACGT".to_vec(), 500, Strand::Forward, 10000),
        ]).unwrap();
        let second = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", b"GG".to_vec(), 106, Strand::Forward, 10000),
            AlignedSequence::with_coordinates("B.chr2", b"GG".to_vec(), 505, Strand::Forward, 10000),
        ]).unwrap();

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![first, second]);
        let mut merger = BlockMerger::new(source, &["A".to_string(), "B".to_string()], 5);

        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 4);
        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 2);
    }

    #[test]
    fn strand_and_ignored_chromosomes_break_synteny() {
        use super::BlockMerger;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
        use std::collections::VecDeque;

        let reverse = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", b"GG".to_vec(), 104, Strand::Reverse, 10000),
        ]).unwrap();
        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![single("A.chr1", b"ACGT", 100), reverse]);
        let mut merger = BlockMerger::new(source, &["A".to_string()], 0);
        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 4);
        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 2);

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![single("A.Un", b"ACGT", 100), single("A.Un", b"GG", 104)]);
        let mut merger = BlockMerger::new(source, &["A".to_string()], 0);
        merger.ignore_chromosome("Un");
        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 4);
        assert_eq!(merger.next_block().unwrap().unwrap().number_of_columns(), 2);
    }

    #[test]
    fn merges_chains_of_blocks_and_pads_missing_species() {
        use super::BlockMerger;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
        use std::collections::VecDeque;

        let mut first = single("A.chr1", b"AC", 0);
        first.set_score(Some(10.0));
        first.set_pass(Some(2));
        let mut second = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", b"GT".to_vec(), 2, Strand::Forward, 10000),
            AlignedSequence::with_coordinates("B.chr4", b"G-".to_vec(), 40, Strand::Forward, 10000),
        ]).unwrap();
        second.set_score(Some(40.0));
        second.set_pass(Some(2));
        let mut third = single("A.chr1", b"TTTT", 4);
        third.set_pass(Some(3));

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![first, second, third]);
        let mut merger = BlockMerger::new(source, &["A".to_string(), "B".to_string()], 0);

        let got = merger.next_block().unwrap().unwrap();
        assert_eq!(got.number_of_columns(), 8);
        assert_eq!(got.sequence_for_species("A").unwrap().symbols(), b"ACGTTTTT");
        let b = got.sequence_for_species("B").unwrap();
        assert_eq!(b.symbols(), b"--G-----");
        assert_eq!(b.start().unwrap(), 40);
        assert_eq!(got.score(), Some(25.0));
        assert_eq!(got.pass(), None);
        assert!(merger.next_block().unwrap().is_none());
    }

    #[test]
    fn missing_coordinates_are_an_error() {
        use super::BlockMerger;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Error};
        use std::collections::VecDeque;

        let first = AlignmentBlock::from_sequences(vec![AlignedSequence::new("A.chr1", b"AC".to_vec())]).unwrap();
        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![first, single("A.chr1", b"GT", 2)]);
        let mut merger = BlockMerger::new(source, &["A".to_string()], 0);

        assert!(matches!(merger.next_block(), Err(Error::MissingCoordinates { .. })));
    }

    #[test]
    fn score_weighting() {
        use super::merged_score;

        assert_eq!(merged_score(Some(10.0), 10, Some(40.0), 30), Some(32.5));
        assert_eq!(merged_score(None, 10, Some(40.0), 30), Some(40.0));
        assert_eq!(merged_score(Some(10.0), 10, None, 30), Some(10.0));
        assert_eq!(merged_score(None, 10, None, 30), None);
    }

    #[test]
    fn try_new_reads_first_block() {
        use super::BlockMerger;
        use crate::{AlignmentBlock, BlockSource, Error, Result};
        use std::cell::RefCell;
        use std::collections::VecDeque;
        use std::rc::Rc;

        let queue: Rc<RefCell<VecDeque<AlignmentBlock>>> = Rc::new(RefCell::new(VecDeque::from(vec![
            single("hg19.chr1", b"ACGT", 0),
            single("hg19.chr1", b"GG", 4),
        ])));
        let species = vec!["hg19".to_string()];

        let mut merger = BlockMerger::try_new(Rc::clone(&queue), &species, 0).unwrap();
        assert_eq!(queue.borrow().len(), 1);

        assert_eq!(merger.next_block().unwrap().unwrap().sequence(0).unwrap().symbols(), b"ACGTGG");
        assert!(merger.next_block().unwrap().is_none());

        struct Failing;
        impl BlockSource for Failing {
            fn next_block(&mut self) -> Result<Option<AlignmentBlock>> {
                Err(Error::InvalidParameter("broken".to_string()))
            }
        }
        assert!(matches!(BlockMerger::try_new(Failing, &species, 0), Err(Error::InvalidParameter(_))));
    }
}
