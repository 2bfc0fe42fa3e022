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

//! The pull interface shared by every pipeline stage.
//!
//! A [BlockSource] produces one [AlignmentBlock] per call to
//! [next_block](BlockSource::next_block) and signals the end of the stream
//! with `Ok(None)`. Every filter both consumes a BlockSource and implements
//! one, so stages compose by wrapping each other.
//!
//! ## Usage
//!
//! ```rust
//! use mafpipe::{AlignedSequence, AlignmentBlock, BlockSource};
//! use std::collections::VecDeque;
//!
//! let block = AlignmentBlock::from_sequences(vec![AlignedSequence::new("hg19.chr1", b"ACGT".to_vec())]).unwrap();
//! let mut source: VecDeque<AlignmentBlock> = VecDeque::from(vec![block]);
//!
//! assert!(source.next_block().unwrap().is_some());
//! assert!(source.next_block().unwrap().is_none());
//! assert!(source.next_block().unwrap().is_none());
//! ```
//!

use crate::AlignmentBlock;
use crate::Result;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Produces alignment blocks one at a time.
///
/// Implementations must keep returning `Ok(None)` once the stream is
/// exhausted. Errors are reported as `Err` and are never confused with the
/// end of the stream.
pub trait BlockSource {
    /// Get the next block, or None if no more blocks are available.
    fn next_block(&mut self) -> Result<Option<AlignmentBlock>>;

    /// Iterate over the remaining blocks.
    fn blocks(self) -> Blocks<Self> where Self: Sized {
        Blocks { source: self, done: false }
    }
}

impl<S: BlockSource + ?Sized> BlockSource for Box<S> {
    fn next_block(&mut self) -> Result<Option<AlignmentBlock>> {
        (**self).next_block()
    }
}

impl<S: BlockSource + ?Sized> BlockSource for &mut S {
    fn next_block(&mut self) -> Result<Option<AlignmentBlock>> {
        (**self).next_block()
    }
}

/// Shared handle to a stage whose other side is read through a
/// [TrashAdapter](crate::window::TrashAdapter).
impl<S: BlockSource + ?Sized> BlockSource for Rc<RefCell<S>> {
    fn next_block(&mut self) -> Result<Option<AlignmentBlock>> {
        self.borrow_mut().next_block()
    }
}

impl BlockSource for VecDeque<AlignmentBlock> {
    fn next_block(&mut self) -> Result<Option<AlignmentBlock>> {
        Ok(self.pop_front())
    }
}

/// Iterator over the blocks of a [BlockSource].
///
/// Stops after the first error.
pub struct Blocks<S: BlockSource> {
    source: S,
    done: bool,
}

impl<S: BlockSource> Iterator for Blocks<S> {
    type Item = Result<AlignmentBlock>;

    fn next(
        &mut self,
    ) -> Option<Result<AlignmentBlock>> {
        if self.done {
            return None
        }
        match self.source.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}

/// State shared by the filtering stages.
///
/// Holds the upstream source, the log target the stage writes its
/// diagnostics under, and whether the stage logs at all. Logging goes
/// through the [log] facade, so nothing is printed unless the application
/// installs a logger.
pub struct FilterBase<S: BlockSource> {
    upstream: S,
    target: &'static str,
    verbose: bool,
}

impl<S: BlockSource> FilterBase<S> {
    pub fn new(
        upstream: S,
        target: &'static str,
    ) -> Self {
        FilterBase { upstream, target, verbose: true }
    }
}

impl<S: BlockSource> FilterBase<S> {
    pub fn verbose(&self) -> bool { self.verbose }

    pub fn set_verbose(&mut self, verbose: bool) { self.verbose = verbose; }

    pub fn target(&self) -> &'static str { self.target }

    pub fn set_target(&mut self, target: &'static str) { self.target = target; }

    pub fn pull(&mut self) -> Result<Option<AlignmentBlock>> {
        self.upstream.next_block()
    }

    pub fn upstream_mut(&mut self) -> &mut S { &mut self.upstream }

    pub fn into_upstream(self) -> S { self.upstream }

    /// Write one diagnostic line at info level.
    pub fn log(
        &self,
        args: std::fmt::Arguments,
    ) {
        if self.verbose {
            log::info!(target: self.target, "{}", args);
        }
    }

    /// Write one diagnostic line at debug level.
    pub fn debug(
        &self,
        args: std::fmt::Arguments,
    ) {
        if self.verbose {
            log::debug!(target: self.target, "{}", args);
        }
    }
}
