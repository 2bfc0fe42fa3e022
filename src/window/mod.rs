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

//! Sliding window filters that remove ambiguously aligned or low quality regions.
//!
//! A [WindowFilter] slides a window of `window_size` columns over the
//! concatenated columns of the incoming blocks, moving `step` columns at a
//! time, so windows may span several blocks. Each column gets a statistic
//! from a [ColumnCriterion] and the criterion decides whether a window is
//! removed. Blocks are cut at the boundaries of removed regions; the
//! remaining pieces are returned one at a time and the removed pieces can be
//! kept and read back with [TrashSource::next_removed_block] or through a
//! [TrashAdapter].
//!
//! Three filters are provided:
//!   - [alignment](WindowFilter::alignment): too many gaps in the focus species.
//!   - [mask](WindowFilter::mask): too many masked residues.
//!   - [quality](WindowFilter::quality): too low quality.
//!
//! ## Usage
//!
//! ```rust
//! use mafpipe::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
//! use mafpipe::window::{TrashAdapter, WindowFilter};
//! use std::cell::RefCell;
//! use std::collections::VecDeque;
//! use std::rc::Rc;
//!
//! let block = AlignmentBlock::from_sequences(vec![
//!     AlignedSequence::with_coordinates("hg19.chr1", b"ACGTACGTAC".to_vec(), 0, Strand::Forward, 1000),
//!     AlignedSequence::with_coordinates("mm10.chr4", b"ACGT----AC".to_vec(), 0, Strand::Forward, 1000),
//! ]).unwrap();
//! let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![block]);
//!
//! let species = vec!["hg19".to_string(), "mm10".to_string()];
//! let filter = WindowFilter::alignment(source, &species, 2, 2, 1, true).unwrap();
//! let filter = Rc::new(RefCell::new(filter));
//!
//! let mut kept = filter.clone();
//! let mut trash = TrashAdapter::new(filter.clone());
//!
//! assert_eq!(kept.next_block().unwrap().unwrap().sequence(1).unwrap().symbols(), b"ACGT");
//! assert_eq!(kept.next_block().unwrap().unwrap().sequence(1).unwrap().symbols(), b"AC");
//! assert!(kept.next_block().unwrap().is_none());
//!
//! assert_eq!(trash.next_block().unwrap().unwrap().sequence(1).unwrap().symbols(), b"----");
//! assert!(trash.next_block().unwrap().is_none());
//! ```
//!

pub mod criteria;
pub mod track;

pub use criteria::ColumnCriterion;
pub use criteria::GapCriterion;
pub use criteria::MaskCriterion;
pub use criteria::QualityCriterion;
pub use criteria::QualityStatistic;

use crate::window::track::MaskTrack;
use crate::window::track::QualityTrack;
use crate::window::track::Site;
use crate::AlignedSequence;
use crate::AlignmentBlock;
use crate::BlockSource;
use crate::Error;
use crate::FilterBase;
use crate::Result;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Source of the blocks a filter has removed.
pub trait TrashSource {
    /// Get the next removed block, or None if there is none available.
    fn next_removed_block(&mut self) -> Result<Option<AlignmentBlock>>;
}

/// Reads the removed blocks of a shared filter as an ordinary [BlockSource].
pub struct TrashAdapter<T: TrashSource> {
    filter: Rc<RefCell<T>>,
}

impl<T: TrashSource> TrashAdapter<T> {
    pub fn new(
        filter: Rc<RefCell<T>>,
    ) -> Self {
        TrashAdapter { filter }
    }
}

impl<T: TrashSource> BlockSource for TrashAdapter<T> {
    fn next_block(&mut self) -> Result<Option<AlignmentBlock>> {
        self.filter.borrow_mut().next_removed_block()
    }
}

#[derive(Clone, Copy, Debug)]
struct ColumnState {
    stat: Option<f64>,
    failed: bool,
}

pub struct WindowFilter<S: BlockSource, C: ColumnCriterion> {
    base: FilterBase<S>,
    species: Vec<String>,
    criterion: C,
    window_size: usize,
    step: usize,
    keep_trash: bool,

    // Buffers
    blocks: VecDeque<AlignmentBlock>,
    columns: VecDeque<ColumnState>,
    kept: VecDeque<AlignmentBlock>,
    trash: VecDeque<AlignmentBlock>,

    // Positions in the concatenated columns of all blocks read so far
    offset: usize,
    next_window: usize,
    evaluated_to: usize,
    exhausted: bool,
}

pub type AlignmentFilter<S> = WindowFilter<S, GapCriterion>;
pub type MaskFilter<S, M> = WindowFilter<S, MaskCriterion<M>>;
pub type QualityFilter<S, Q> = WindowFilter<S, QualityCriterion<Q>>;

impl<S: BlockSource, C: ColumnCriterion> WindowFilter<S, C> {
    /// Filter examining the sequences of `species` with `criterion`.
    ///
    /// Errors if `window_size` or `step` is zero.
    pub fn new(
        upstream: S,
        species: &[String],
        window_size: usize,
        step: usize,
        criterion: C,
        keep_trash: bool,
    ) -> Result<Self> {
        if window_size == 0 || step == 0 {
            return Err(Error::InvalidParameter(format!("window size ({}) and step ({}) must be positive", window_size, step)))
        }
        Ok(WindowFilter {
            base: FilterBase::new(upstream, "mafpipe::window_filter"),
            species: species.to_vec(),
            criterion, window_size, step, keep_trash,
            blocks: VecDeque::new(), columns: VecDeque::new(),
            kept: VecDeque::new(), trash: VecDeque::new(),
            offset: 0, next_window: 0, evaluated_to: 0, exhausted: false,
        })
    }
}

impl<S: BlockSource> WindowFilter<S, GapCriterion> {
    /// Removes windows with more than `max_gap` gaps in the focus species.
    pub fn alignment(
        upstream: S,
        species: &[String],
        window_size: usize,
        step: usize,
        max_gap: usize,
        keep_trash: bool,
    ) -> Result<Self> {
        let criterion = GapCriterion { max_gap, count_unknown: false };
        let mut filter = WindowFilter::new(upstream, species, window_size, step, criterion, keep_trash)?;
        filter.base.set_target("mafpipe::alignment_filter");
        Ok(filter)
    }

    /// Also count unknown residues (eg. `N`) as gaps.
    pub fn count_unknown(
        &mut self,
        count_unknown: bool,
    ) {
        self.criterion.count_unknown = count_unknown;
    }
}

impl<S: BlockSource, M: MaskTrack> WindowFilter<S, MaskCriterion<M>> {
    /// Removes windows with more than `max_masked` masked residues in the focus species.
    pub fn mask(
        upstream: S,
        species: &[String],
        window_size: usize,
        step: usize,
        track: M,
        max_masked: usize,
        keep_trash: bool,
    ) -> Result<Self> {
        let criterion = MaskCriterion { track, max_masked };
        let mut filter = WindowFilter::new(upstream, species, window_size, step, criterion, keep_trash)?;
        filter.base.set_target("mafpipe::mask_filter");
        Ok(filter)
    }
}

impl<S: BlockSource, Q: QualityTrack> WindowFilter<S, QualityCriterion<Q>> {
    /// Removes windows whose quality in the focus species is below `min_quality`.
    #[allow(clippy::too_many_arguments)]
    pub fn quality(
        upstream: S,
        species: &[String],
        window_size: usize,
        step: usize,
        track: Q,
        min_quality: f64,
        statistic: QualityStatistic,
        keep_trash: bool,
    ) -> Result<Self> {
        let criterion = QualityCriterion { track, min_quality, statistic };
        let mut filter = WindowFilter::new(upstream, species, window_size, step, criterion, keep_trash)?;
        filter.base.set_target("mafpipe::quality_filter");
        Ok(filter)
    }
}

impl<S: BlockSource, C: ColumnCriterion> WindowFilter<S, C> {
    pub fn base_mut(&mut self) -> &mut FilterBase<S> { &mut self.base }

    pub fn criterion(&self) -> &C { &self.criterion }

    fn buffered_end(&self) -> usize {
        self.offset + self.columns.len()
    }

    fn push_block(
        &mut self,
        block: AlignmentBlock,
    ) {
        let targets: Vec<&AlignedSequence> = block.sequences().iter()
            .filter(|seq| self.species.iter().any(|x| x == seq.species()))
            .collect();
        let mut walks: Vec<_> = targets.into_iter().map(Site::walk).collect();
        for _ in 0..block.number_of_columns() {
            let column: Vec<Site> = walks.iter_mut().filter_map(|x| x.next()).collect();
            let stat = self.criterion.observe(&column);
            self.columns.push_back(ColumnState { stat, failed: false });
        }
        drop(walks);
        self.blocks.push_back(block);
    }

    fn evaluate(
        &mut self,
        begin: usize,
        end: usize,
    ) {
        let range = (begin - self.offset)..(end - self.offset);
        let stats: Vec<Option<f64>> = self.columns.range(range.clone()).map(|x| x.stat).collect();
        if self.criterion.window_fails(&stats) {
            self.base.debug(format_args!("window {}-{} fails", begin, end));
            self.columns.range_mut(range).for_each(|x| x.failed = true);
        }
        self.evaluated_to = self.evaluated_to.max(end);
    }

    fn evaluate_windows(&mut self) {
        while self.next_window + self.window_size <= self.buffered_end() {
            self.evaluate(self.next_window, self.next_window + self.window_size);
            self.next_window += self.step;
        }
    }

    /// Covers the end of the stream with one last window if needed.
    fn evaluate_last_window(&mut self) {
        let end = self.buffered_end();
        if end > self.evaluated_to {
            let begin = end.saturating_sub(self.window_size).max(self.offset);
            self.evaluate(begin, end);
        }
    }

    /// Splits the blocks that no pending window can reach anymore.
    fn release_blocks(
        &mut self,
    ) -> Result<()> {
        while let Some(front) = self.blocks.front() {
            let end = self.offset + front.number_of_columns();
            let settled = end <= self.next_window && end + self.window_size <= self.buffered_end();
            if !(self.exhausted || settled) {
                break
            }
            let Some(block) = self.blocks.pop_front() else { break };
            let failed: Vec<bool> = self.columns.drain(0..block.number_of_columns()).map(|x| x.failed).collect();
            self.offset = end;
            self.split(block, &failed)?;
        }
        Ok(())
    }

    fn split(
        &mut self,
        block: AlignmentBlock,
        failed: &[bool],
    ) -> Result<()> {
        if !failed.iter().any(|x| *x) {
            self.kept.push_back(block);
            return Ok(())
        }
        if failed.iter().all(|x| *x) {
            self.base.log(format_args!("block with size {} was removed", block.number_of_columns()));
            if self.keep_trash {
                self.trash.push_back(block);
            }
            return Ok(())
        }

        let mut begin = 0;
        while begin < failed.len() {
            let state = failed[begin];
            let end = failed[begin..].iter().position(|x| *x != state).map(|x| x + begin).unwrap_or(failed.len());
            let sub = block.sub_block(begin, end - begin)?;
            if state {
                self.base.log(format_args!("region of size {} was removed", end - begin));
                if self.keep_trash {
                    self.trash.push_back(sub);
                }
            } else {
                self.kept.push_back(sub);
            }
            begin = end;
        }
        Ok(())
    }
}

impl<S: BlockSource, C: ColumnCriterion> BlockSource for WindowFilter<S, C> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        loop {
            if let Some(block) = self.kept.pop_front() {
                return Ok(Some(block))
            }
            if self.exhausted {
                return Ok(None)
            }
            match self.base.pull()? {
                Some(block) => {
                    self.push_block(block);
                    self.evaluate_windows();
                },
                None => {
                    self.exhausted = true;
                    self.evaluate_last_window();
                },
            }
            self.release_blocks()?;
        }
    }
}

impl<S: BlockSource, C: ColumnCriterion> TrashSource for WindowFilter<S, C> {
    fn next_removed_block(&mut self) -> Result<Option<AlignmentBlock>> {
        Ok(self.trash.pop_front())
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn anchored(a: &[u8], b: &[u8], start: u64) -> crate::AlignmentBlock {
        use crate::{AlignedSequence, AlignmentBlock, Strand};
        AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", a.to_vec(), start, Strand::Forward, 100000),
            AlignedSequence::with_coordinates("B.chr1", b.to_vec(), start, Strand::Forward, 100000),
        ]).unwrap()
    }

    #[test]
    fn windows_span_block_boundaries() {
        use super::{TrashSource, WindowFilter};
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            anchored(b"AAAAAA", b"ACGT--", 0),
            anchored(b"AAAAAA", b"--ACGT", 6),
        ]);
        let species = vec!["A".to_string(), "B".to_string()];
        let mut filter = WindowFilter::alignment(source, &species, 2, 2, 1, true).unwrap();

        let first = filter.next_block().unwrap().unwrap();
        assert_eq!(first.sequence(1).unwrap().symbols(), b"ACGT");
        assert_eq!(first.sequence(0).unwrap().start().unwrap(), 0);

        let second = filter.next_block().unwrap().unwrap();
        assert_eq!(second.sequence(1).unwrap().symbols(), b"ACGT");
        assert_eq!(second.sequence(0).unwrap().start().unwrap(), 8);
        assert_eq!(second.sequence(1).unwrap().start().unwrap(), 6);

        assert!(filter.next_block().unwrap().is_none());
        assert!(filter.next_block().unwrap().is_none());

        let trash_1 = filter.next_removed_block().unwrap().unwrap();
        assert_eq!(trash_1.sequence(1).unwrap().symbols(), b"--");
        assert_eq!(trash_1.sequence(0).unwrap().start().unwrap(), 4);
        let trash_2 = filter.next_removed_block().unwrap().unwrap();
        assert_eq!(trash_2.sequence(0).unwrap().start().unwrap(), 6);
        assert!(filter.next_removed_block().unwrap().is_none());
    }

    #[test]
    fn kept_and_removed_columns_cover_the_input() {
        use super::{TrashSource, WindowFilter};
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let input = vec![
            anchored(b"AAAAAAA", b"A-A-AAA", 0),
            anchored(b"AAAAA", b"A---A", 7),
            anchored(b"AAAAAAAAA", b"AAAAAAA--", 12),
            anchored(b"AAA", b"---", 21),
        ];
        let expected: Vec<u8> = input.iter().flat_map(|x| x.sequence(1).unwrap().symbols().to_vec()).collect();

        let source: VecDeque<AlignmentBlock> = VecDeque::from(input);
        let species = vec!["A".to_string(), "B".to_string()];
        let mut filter = WindowFilter::alignment(source, &species, 4, 3, 1, true).unwrap();

        let mut pieces: Vec<AlignmentBlock> = Vec::new();
        while let Some(block) = filter.next_block().unwrap() {
            pieces.push(block);
        }
        let n_kept = pieces.len();
        while let Some(block) = filter.next_removed_block().unwrap() {
            pieces.push(block);
        }
        assert!(n_kept > 0);
        assert!(pieces.len() > n_kept);

        for piece in pieces.iter() {
            assert_eq!(piece.sequence(0).unwrap().len(), piece.sequence(1).unwrap().len());
        }

        pieces.sort_by_key(|x| x.sequence(0).unwrap().start().unwrap());
        let got: Vec<u8> = pieces.iter().flat_map(|x| x.sequence(1).unwrap().symbols().to_vec()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn removed_blocks_are_dropped_without_trash() {
        use super::{TrashSource, WindowFilter};
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            anchored(b"AAAA", b"----", 0),
            anchored(b"AAAA", b"AAAA", 4),
        ]);
        let species = vec!["B".to_string()];
        let mut filter = WindowFilter::alignment(source, &species, 4, 4, 0, false).unwrap();

        let got = filter.next_block().unwrap().unwrap();
        assert_eq!(got.sequence(0).unwrap().start().unwrap(), 4);
        assert!(filter.next_block().unwrap().is_none());
        assert!(filter.next_removed_block().unwrap().is_none());
    }

    #[test]
    fn short_stream_is_evaluated_as_one_window() {
        use super::WindowFilter;
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![anchored(b"AAA", b"A--", 0)]);
        let species = vec!["B".to_string()];
        let mut filter = WindowFilter::alignment(source, &species, 10, 1, 1, false).unwrap();
        assert!(filter.next_block().unwrap().is_none());
    }

    #[test]
    fn unknown_residues_counted_as_gaps() {
        use super::WindowFilter;
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let input = || VecDeque::from(vec![anchored(b"AAAA", b"ANNA", 0)]);
        let species = vec!["B".to_string()];

        let mut lenient = WindowFilter::alignment(input(), &species, 4, 4, 1, false).unwrap();
        assert!(lenient.next_block().unwrap().is_some());

        let mut strict = WindowFilter::alignment(input(), &species, 4, 4, 1, false).unwrap();
        strict.count_unknown(true);
        let got: Option<AlignmentBlock> = strict.next_block().unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn mask_filter_with_soft_masking() {
        use super::WindowFilter;
        use crate::window::track::SoftMask;
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![anchored(b"ACGTacgtACGT", b"ACGTACGTACGT", 0)]);
        let species = vec!["A".to_string()];
        let mut filter = WindowFilter::mask(source, &species, 4, 4, SoftMask, 2, false).unwrap();

        let first = filter.next_block().unwrap().unwrap();
        assert_eq!(first.sequence(0).unwrap().symbols(), b"ACGT");
        let second = filter.next_block().unwrap().unwrap();
        assert_eq!(second.sequence(0).unwrap().symbols(), b"ACGT");
        assert_eq!(second.sequence(0).unwrap().start().unwrap(), 8);
        assert!(filter.next_block().unwrap().is_none());
    }

    #[test]
    fn mask_filter_with_position_track() {
        use super::WindowFilter;
        use crate::{AlignmentBlock, BlockSource};
        use std::collections::VecDeque;

        let repeats = |_species: &str, pos: u64| (104..106).contains(&pos);
        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![anchored(b"AC--GTACGT", b"AC--GTACGT", 100)]);
        let species = vec!["A".to_string()];
        let mut filter = WindowFilter::mask(source, &species, 2, 2, repeats, 0, false).unwrap();

        let first = filter.next_block().unwrap().unwrap();
        assert_eq!(first.sequence(0).unwrap().symbols(), b"AC--GT");
        let second = filter.next_block().unwrap().unwrap();
        assert_eq!(second.sequence(0).unwrap().symbols(), b"GT");
        assert_eq!(second.sequence(0).unwrap().start().unwrap(), 106);
        assert!(filter.next_block().unwrap().is_none());
    }

    #[test]
    fn quality_filter_with_embedded_qualities() {
        use super::{QualityStatistic, WindowFilter};
        use crate::window::track::EmbeddedQuality;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
        use std::collections::VecDeque;

        let mut seq = AlignedSequence::with_coordinates("A.chr1", b"ACGTACGT".to_vec(), 50, Strand::Forward, 1000);
        seq.set_quality(Some(b"99991199".to_vec())).unwrap();
        let block = AlignmentBlock::from_sequences(vec![seq]).unwrap();

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![block]);
        let species = vec!["A".to_string()];
        let mut filter = WindowFilter::quality(source, &species, 2, 2, EmbeddedQuality, 5.0, QualityStatistic::Minimum, false).unwrap();

        let first = filter.next_block().unwrap().unwrap();
        assert_eq!(first.sequence(0).unwrap().quality(), Some(&b"9999"[..]));
        let second = filter.next_block().unwrap().unwrap();
        assert_eq!(second.sequence(0).unwrap().start().unwrap(), 56);
        assert!(filter.next_block().unwrap().is_none());
    }

    #[test]
    fn zero_window_is_rejected() {
        use super::WindowFilter;
        use crate::{AlignmentBlock, Error};
        use std::collections::VecDeque;

        let source: VecDeque<AlignmentBlock> = VecDeque::new();
        let got = WindowFilter::alignment(source, &[], 0, 1, 1, false);
        assert!(matches!(got, Err(Error::InvalidParameter(_))));
    }
}
