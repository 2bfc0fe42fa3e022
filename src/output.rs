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
use crate::printer::format_maf_block;
use crate::printer::format_maf_header;
use crate::AlignmentBlock;
use crate::BlockSource;
use crate::FilterBase;
use crate::Result;

use std::io::Write;

/// Writes every block that passes through it to a sink.
///
/// The .maf header is written when the tee is created. Blocks are returned
/// unchanged after they have been written. Without a sink the tee only
/// forwards blocks.
///
/// The sink is flushed every time upstream runs out of blocks. A trash
/// source runs out whenever its queue is empty, so this happens more than
/// once per stream.
///
/// With masking turned off, soft-masked residues are written in upper case.
pub struct OutputTee<S: BlockSource, W: Write> {
    base: FilterBase<S>,
    sink: Option<W>,
    written: usize,
    mask: bool,
    reported: bool,
}

impl<S: BlockSource, W: Write> OutputTee<S, W> {
    pub fn new(
        upstream: S,
        mut sink: Option<W>,
    ) -> Result<Self> {
        if let Some(conn) = sink.as_mut() {
            format_maf_header(conn)?;
        }
        Ok(OutputTee {
            base: FilterBase::new(upstream, "mafpipe::output"),
            sink,
            written: 0,
            mask: true,
            reported: false,
        })
    }
}

impl<S: BlockSource, W: Write> OutputTee<S, W> {
    pub fn base_mut(&mut self) -> &mut FilterBase<S> { &mut self.base }

    /// Write soft-masked residues in lower case (the default) or upper case.
    pub fn mask(
        &mut self,
        mask: bool,
    ) {
        self.mask = mask;
    }

    /// Number of blocks written to the sink.
    pub fn written(&self) -> usize { self.written }

    /// Take the sink out of the tee, flushing it first.
    pub fn into_sink(
        mut self,
    ) -> Result<Option<W>> {
        if let Some(conn) = self.sink.as_mut() {
            conn.flush()?;
        }
        Ok(self.sink)
    }
}

impl<S: BlockSource, W: Write> BlockSource for OutputTee<S, W> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        let Some(block) = self.base.pull()? else {
            if let Some(conn) = self.sink.as_mut() {
                conn.flush()?;
                if !self.reported {
                    self.reported = true;
                    self.base.debug(format_args!("wrote {} blocks", self.written));
                }
            }
            return Ok(None)
        };

        if let Some(conn) = self.sink.as_mut() {
            format_maf_block(&block, self.mask, conn)?;
            self.written += 1;
        }

        Ok(Some(block))
    }
}
