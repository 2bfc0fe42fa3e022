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
use crate::FilterBase;
use crate::Result;

/// Keeps only the blocks that have at least `min_size` columns.
pub struct BlockSizeFilter<S: BlockSource> {
    base: FilterBase<S>,
    min_size: usize,
}

impl<S: BlockSource> BlockSizeFilter<S> {
    pub fn new(
        upstream: S,
        min_size: usize,
    ) -> Self {
        BlockSizeFilter { base: FilterBase::new(upstream, "mafpipe::size_filter"), min_size }
    }

    pub fn base_mut(&mut self) -> &mut FilterBase<S> { &mut self.base }
}

impl<S: BlockSource> BlockSource for BlockSizeFilter<S> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        while let Some(block) = self.base.pull()? {
            if block.number_of_columns() >= self.min_size {
                return Ok(Some(block))
            }
            self.base.log(format_args!("block with size {} was discarded", block.number_of_columns()));
        }
        Ok(None)
    }
}
