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
use crate::AlignmentBlock;
use crate::BlockSource;
use crate::Result;

/// Advances a secondary chain in lock-step with a primary one.
///
/// Every call pulls one block from the primary and then one from the
/// secondary, also when the primary fails. The secondary's block is dropped
/// and the primary's block or error is returned. Once the primary is exhausted the secondary is drained to its
/// end, so stages with side effects in the secondary chain (such as writing
/// removed blocks) see every block.
pub struct Synchronizer<P: BlockSource, Q: BlockSource> {
    primary: P,
    secondary: Q,
    drained: bool,
}

impl<P: BlockSource, Q: BlockSource> Synchronizer<P, Q> {
    pub fn new(
        primary: P,
        secondary: Q,
    ) -> Self {
        Synchronizer { primary, secondary, drained: false }
    }
}

impl<P: BlockSource, Q: BlockSource> Synchronizer<P, Q> {
    pub fn primary_mut(&mut self) -> &mut P { &mut self.primary }

    pub fn secondary_mut(&mut self) -> &mut Q { &mut self.secondary }

    /// Pull and drop blocks from the secondary until it is exhausted.
    ///
    /// Returns the number of blocks dropped.
    pub fn drain_secondary(
        &mut self,
    ) -> Result<usize> {
        let mut n: usize = 0;
        while self.secondary.next_block()?.is_some() {
            n += 1;
        }
        self.drained = true;
        Ok(n)
    }
}

impl<P: BlockSource, Q: BlockSource> BlockSource for Synchronizer<P, Q> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        let block = match self.primary.next_block() {
            Ok(block) => block,
            Err(e) => {
                let _ = self.secondary.next_block();
                return Err(e)
            },
        };
        if block.is_none() {
            if !self.drained {
                self.drain_secondary()?;
            }
        } else {
            let _ = self.secondary.next_block()?;
        }
        Ok(block)
    }
}
