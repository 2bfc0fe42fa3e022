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

//! Builder for chains of filtering stages.
//!
//! A [Pipeline] starts from any [BlockSource] and wraps it in one stage per
//! method call, in the order the methods are called. The chain is run by
//! [run](Pipeline::run), or used as a plain BlockSource through
//! [into_source](Pipeline::into_source).
//!
//! Windowed filters can write the blocks they remove to a separate sink.
//! The removed blocks are written while the main chain is being read, and
//! the remaining ones when it is exhausted.
//!
//! ## Usage
//!
//! ```rust
//! use mafpipe::pipeline::Pipeline;
//! use std::io::Cursor;
//!
//! let mut data: Vec<u8> = b"a score=1\n".to_vec();
//! data.append(&mut b"s hg19.chr1 0 4 + 100 ACGT\n".to_vec());
//! data.append(&mut b"s mm10.chr1 0 4 + 100 ACGT\n\n".to_vec());
//! data.append(&mut b"a score=2\n".to_vec());
//! data.append(&mut b"s hg19.chr1 4 2 + 100 AC\n\n".to_vec());
//!
//! let species = vec!["hg19".to_string(), "mm10".to_string()];
//! let mut output: Vec<u8> = Vec::new();
//!
//! let n = Pipeline::from_reader(Cursor::new(data))
//!     .verbose(false)
//!     .filter_species(&species, true, false)
//!     .write_to(&mut output, true).unwrap()
//!     .run().unwrap();
//!
//! assert_eq!(n, 1);
//!
//! let mut expected: Vec<u8> = b"##maf version=1 program=mafpipe\n\n".to_vec();
//! expected.append(&mut b"a score=1\n".to_vec());
//! expected.append(&mut b"s hg19.chr1 0 4 + 100 ACGT\n".to_vec());
//! expected.append(&mut b"s mm10.chr1 0 4 + 100 ACGT\n\n".to_vec());
//! assert_eq!(output, expected);
//! ```
//!

use crate::filter::BlockSizeFilter;
use crate::filter::FullGapFilter;
use crate::filter::SpeciesFilter;
use crate::merger::BlockMerger;
use crate::output::OutputTee;
use crate::parser::MafParser;
use crate::sync::Synchronizer;
use crate::window::criteria::ColumnCriterion;
use crate::window::criteria::QualityStatistic;
use crate::window::track::MaskTrack;
use crate::window::track::QualityTrack;
use crate::window::TrashAdapter;
use crate::window::WindowFilter;
use crate::BlockSource;
use crate::Result;

use std::cell::RefCell;
use std::io::BufRead;
use std::io::Write;
use std::rc::Rc;

/// Sink for the blocks removed by a windowed filter.
pub type TrashSink<'a> = Box<dyn Write + 'a>;

/// Parameters shared by the windowed filters.
#[derive(Clone, Debug)]
pub struct WindowParams {
    pub species: Vec<String>,
    pub window_size: usize,
    pub step: usize,
}

pub struct Pipeline<'a> {
    head: Box<dyn BlockSource + 'a>,
    verbose: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new<S: BlockSource + 'a>(
        source: S,
    ) -> Self {
        Pipeline { head: Box::new(source), verbose: true }
    }

    /// Pipeline reading .maf records from `reader`.
    pub fn from_reader<R: BufRead + 'a>(
        reader: R,
    ) -> Self {
        Pipeline::new(MafParser::new(reader))
    }
}

impl<'a> Pipeline<'a> {
    /// Toggle logging for the stages added after this call.
    pub fn verbose(
        mut self,
        verbose: bool,
    ) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn filter_size(
        self,
        min_size: usize,
    ) -> Self {
        let mut filter = BlockSizeFilter::new(self.head, min_size);
        filter.base_mut().set_verbose(self.verbose);
        Pipeline { head: Box::new(filter), verbose: self.verbose }
    }

    pub fn filter_species(
        self,
        species: &[String],
        strict: bool,
        remove_duplicates: bool,
    ) -> Self {
        let mut filter = SpeciesFilter::new(self.head, species, strict, remove_duplicates);
        filter.base_mut().set_verbose(self.verbose);
        Pipeline { head: Box::new(filter), verbose: self.verbose }
    }

    pub fn merge_blocks(
        self,
        species: &[String],
        max_distance: u64,
        ignore_chromosomes: &[String],
    ) -> Self {
        let mut merger = BlockMerger::new(self.head, species, max_distance);
        ignore_chromosomes.iter().for_each(|chr| merger.ignore_chromosome(chr));
        merger.base_mut().set_verbose(self.verbose);
        Pipeline { head: Box::new(merger), verbose: self.verbose }
    }

    pub fn filter_full_gaps(
        self,
        species: &[String],
    ) -> Self {
        let mut filter = FullGapFilter::new(self.head, species);
        filter.base_mut().set_verbose(self.verbose);
        Pipeline { head: Box::new(filter), verbose: self.verbose }
    }

    /// Remove windows with more than `max_gap` gaps in the focus species.
    pub fn filter_alignment(
        self,
        params: &WindowParams,
        max_gap: usize,
        count_unknown: bool,
        trash: Option<TrashSink<'a>>,
    ) -> Result<Self> {
        let mut filter = WindowFilter::alignment(self.head, &params.species, params.window_size, params.step, max_gap, trash.is_some())?;
        filter.count_unknown(count_unknown);
        Pipeline::attach_window(filter, trash, self.verbose)
    }

    /// Remove windows with more than `max_masked` masked residues in the focus species.
    pub fn filter_mask<M: MaskTrack + 'a>(
        self,
        params: &WindowParams,
        track: M,
        max_masked: usize,
        trash: Option<TrashSink<'a>>,
    ) -> Result<Self> {
        let filter = WindowFilter::mask(self.head, &params.species, params.window_size, params.step, track, max_masked, trash.is_some())?;
        Pipeline::attach_window(filter, trash, self.verbose)
    }

    /// Remove windows with quality below `min_quality` in the focus species.
    pub fn filter_quality<Q: QualityTrack + 'a>(
        self,
        params: &WindowParams,
        track: Q,
        min_quality: f64,
        statistic: QualityStatistic,
        trash: Option<TrashSink<'a>>,
    ) -> Result<Self> {
        let filter = WindowFilter::quality(self.head, &params.species, params.window_size, params.step, track, min_quality, statistic, trash.is_some())?;
        Pipeline::attach_window(filter, trash, self.verbose)
    }

    /// Write every block reaching this point to `sink`.
    ///
    /// Soft-masked residues are written in upper case if `mask` is false.
    pub fn write_to<W: Write + 'a>(
        self,
        sink: W,
        mask: bool,
    ) -> Result<Self> {
        let mut tee = OutputTee::new(self.head, Some(sink))?;
        tee.mask(mask);
        tee.base_mut().set_verbose(self.verbose);
        Ok(Pipeline { head: Box::new(tee), verbose: self.verbose })
    }

    /// Pull every block through the chain.
    ///
    /// Returns the number of blocks that came out of the last stage.
    pub fn run(
        mut self,
    ) -> Result<usize> {
        let mut n: usize = 0;
        while self.head.next_block()?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    pub fn into_source(self) -> Box<dyn BlockSource + 'a> { self.head }

    fn attach_window<C: ColumnCriterion + 'a>(
        mut filter: WindowFilter<Box<dyn BlockSource + 'a>, C>,
        trash: Option<TrashSink<'a>>,
        verbose: bool,
    ) -> Result<Self> {
        filter.base_mut().set_verbose(verbose);
        let head: Box<dyn BlockSource + 'a> = match trash {
            Some(sink) => {
                let shared = Rc::new(RefCell::new(filter));
                let mut tee = OutputTee::new(TrashAdapter::new(Rc::clone(&shared)), Some(sink))?;
                tee.base_mut().set_verbose(verbose);
                Box::new(Synchronizer::new(shared, tee))
            },
            None => Box::new(filter),
        };
        Ok(Pipeline { head, verbose })
    }
}

// Tests
#[cfg(test)]
mod tests {

    fn anchored(
        a: &[u8],
        b: &[u8],
        start: u64,
    ) -> crate::AlignmentBlock {
        use crate::{AlignedSequence, AlignmentBlock, Strand};
        AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("A.chr1", a.to_vec(), start, Strand::Forward, 1000),
            AlignedSequence::with_coordinates("B.chr1", b.to_vec(), start, Strand::Forward, 1000),
        ]).unwrap()
    }

    #[test]
    fn stages_run_in_call_order() {
        use super::Pipeline;
        use crate::AlignmentBlock;
        use std::collections::VecDeque;

        let species = vec!["A".to_string(), "B".to_string()];
        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            anchored(b"AC", b"AC", 0),
            anchored(b"GT", b"GT", 2),
            anchored(b"ACGTA", b"ACGTA", 10),
        ]);

        // Merging first makes the first two blocks long enough to pass.
        let n = Pipeline::new(source.clone()).verbose(false)
            .merge_blocks(&species, 0, &[])
            .filter_size(4)
            .run().unwrap();
        assert_eq!(n, 2);

        let n = Pipeline::new(source).verbose(false)
            .filter_size(4)
            .merge_blocks(&species, 0, &[])
            .run().unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn removed_windows_written_to_trash() {
        use super::{Pipeline, WindowParams};
        use crate::parser::MafParser;
        use crate::{AlignmentBlock, BlockSource};
        use std::cell::RefCell;
        use std::collections::VecDeque;
        use std::io::{Cursor, Write};
        use std::rc::Rc;

        #[derive(Clone, Default)]
        struct Shared(Rc<RefCell<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.borrow_mut().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
        }

        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            anchored(b"AAAA", b"AAAA", 0),
            anchored(b"AAAA", b"----", 4),
            anchored(b"AAAA", b"AAAA", 8),
        ]);
        let params = WindowParams { species: vec!["B".to_string()], window_size: 4, step: 4 };
        let trash = Shared::default();
        let output = Shared::default();

        let n = Pipeline::new(source).verbose(false)
            .filter_alignment(&params, 0, false, Some(Box::new(trash.clone()))).unwrap()
            .write_to(output.clone(), true).unwrap()
            .run().unwrap();
        assert_eq!(n, 2);

        let kept: Vec<AlignmentBlock> = MafParser::new(Cursor::new(output.0.borrow().clone())).blocks().map(|x| x.unwrap()).collect();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].sequence(0).unwrap().start().unwrap(), 8);

        let mut removed = MafParser::new(Cursor::new(trash.0.borrow().clone()));
        let block = removed.next_block().unwrap().unwrap();
        assert_eq!(block.sequence(0).unwrap().start().unwrap(), 4);
        assert!(removed.next_block().unwrap().is_none());
    }

    #[test]
    fn trash_is_flushed_after_run() {
        use super::{Pipeline, WindowParams};
        use crate::AlignmentBlock;
        use std::cell::Cell;
        use std::collections::VecDeque;
        use std::io::Write;
        use std::rc::Rc;

        #[derive(Clone, Default)]
        struct Recorder { bytes: Rc<Cell<usize>>, flushed: Rc<Cell<usize>> }
        impl Write for Recorder {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.bytes.set(self.bytes.get() + buf.len());
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                self.flushed.set(self.bytes.get());
                Ok(())
            }
        }

        // The trash queue empties after the second block and fills again later.
        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![
            anchored(b"AAAA", b"AAAA", 0),
            anchored(b"AAAA", b"AAAA", 4),
            anchored(b"AAAA", b"----", 8),
            anchored(b"AAAA", b"AAAA", 12),
        ]);
        let params = WindowParams { species: vec!["B".to_string()], window_size: 4, step: 4 };
        let trash = Recorder::default();

        let n = Pipeline::new(source).verbose(false)
            .filter_alignment(&params, 0, false, Some(Box::new(trash.clone()))).unwrap()
            .run().unwrap();

        assert_eq!(n, 3);
        assert!(trash.bytes.get() > "##maf version=1 program=mafpipe\n\n".len());
        assert_eq!(trash.flushed.get(), trash.bytes.get());
    }

    #[test]
    fn unmasked_output() {
        use super::Pipeline;
        use std::io::Cursor;

        let data: Vec<u8> = b"a\ns hg19.chr1 0 4 + 100 acGT\n\n".to_vec();
        let mut output: Vec<u8> = Vec::new();

        Pipeline::from_reader(Cursor::new(data)).verbose(false)
            .write_to(&mut output, false).unwrap()
            .run().unwrap();

        let mut expected: Vec<u8> = b"##maf version=1 program=mafpipe\n\n".to_vec();
        expected.append(&mut b"a\ns hg19.chr1 0 4 + 100 ACGT\n\n".to_vec());
        assert_eq!(output, expected);
    }

    #[test]
    fn invalid_window_is_reported() {
        use super::{Pipeline, WindowParams};
        use crate::window::track::SoftMask;
        use crate::{AlignmentBlock, Error};
        use std::collections::VecDeque;

        let params = WindowParams { species: vec!["A".to_string()], window_size: 0, step: 1 };
        let got = Pipeline::new(VecDeque::<AlignmentBlock>::new()).filter_mask(&params, SoftMask, 1, None);

        assert!(matches!(got, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn full_gap_and_quality_filters() {
        use super::{Pipeline, WindowParams};
        use crate::window::criteria::QualityStatistic;
        use crate::window::track::EmbeddedQuality;
        use crate::{AlignedSequence, AlignmentBlock, BlockSource, Strand};
        use std::collections::VecDeque;

        let mut a = AlignedSequence::with_coordinates("A.chr1", b"AC-GT".to_vec(), 0, Strand::Forward, 1000);
        a.set_quality(Some(b"99-99".to_vec())).unwrap();
        let b = AlignedSequence::with_coordinates("B.chr1", b"ACTGT".to_vec(), 0, Strand::Forward, 1000);
        let source: VecDeque<AlignmentBlock> = VecDeque::from(vec![AlignmentBlock::from_sequences(vec![a, b]).unwrap()]);

        let species = vec!["A".to_string()];
        let params = WindowParams { species: species.clone(), window_size: 2, step: 2 };

        let mut chain = Pipeline::new(source).verbose(false)
            .filter_full_gaps(&species)
            .filter_quality(&params, EmbeddedQuality, 5.0, QualityStatistic::Minimum, None).unwrap()
            .into_source();

        let got = chain.next_block().unwrap().unwrap();
        assert_eq!(got.number_of_columns(), 4);
        assert_eq!(got.sequence(0).unwrap().quality(), Some(b"9999".as_slice()));
        assert!(!got.sequence(1).unwrap().has_coordinates());
        assert!(chain.next_block().unwrap().is_none());
    }
}
