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

/// Removes the columns that contain only gaps in a set of species.
///
/// The coordinates of the examined species are unaffected because only their
/// gap columns are removed. The other sequences may lose residues in the
/// removed columns, so their coordinates are dropped whenever a column is
/// removed. Blocks are forwarded even if no column is left.
pub struct FullGapFilter<S: BlockSource> {
    base: FilterBase<S>,
    species: Vec<String>,
}

impl<S: BlockSource> FullGapFilter<S> {
    pub fn new(
        upstream: S,
        species: &[String],
    ) -> Self {
        FullGapFilter { base: FilterBase::new(upstream, "mafpipe::full_gap_filter"), species: species.to_vec() }
    }

    pub fn base_mut(&mut self) -> &mut FilterBase<S> { &mut self.base }

    fn is_target(
        &self,
        species: &str,
    ) -> bool {
        self.species.iter().any(|x| x == species)
    }
}

impl<S: BlockSource> BlockSource for FullGapFilter<S> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        let Some(mut block) = self.base.pull()? else { return Ok(None) };

        let targets: Vec<usize> = block.sequences().iter().enumerate()
            .filter(|(_, seq)| self.is_target(seq.species()))
            .map(|(idx, _)| idx)
            .collect();
        if targets.is_empty() {
            return Ok(Some(block))
        }

        let full_gap: Vec<bool> = (0..block.number_of_columns()).map(|col| {
            targets.iter().all(|idx| block.sequences()[*idx].is_gap_at(col))
        }).collect();

        let removed = block.remove_columns(&full_gap)?;
        if removed > 0 {
            self.base.log(format_args!("{} gap-only columns were removed", removed));
            for idx in 0..block.number_of_sequences() {
                if !targets.contains(&idx) {
                    block.remove_coordinates_from_sequence(idx)?;
                }
            }
        }

        Ok(Some(block))
    }
}
