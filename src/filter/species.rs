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

use indexmap::IndexMap;

/// Keeps a subset of the sequences in each block, selected by species.
///
/// Blocks left without sequences are removed. With `strict`, blocks that
/// miss any of the species are removed too, and with `remove_duplicates`
/// blocks that contain a species more than once.
pub struct SpeciesFilter<S: BlockSource> {
    base: FilterBase<S>,
    species: Vec<String>,
    strict: bool,
    remove_duplicates: bool,
}

impl<S: BlockSource> SpeciesFilter<S> {
    pub fn new(
        upstream: S,
        species: &[String],
        strict: bool,
        remove_duplicates: bool,
    ) -> Self {
        SpeciesFilter {
            base: FilterBase::new(upstream, "mafpipe::species_filter"),
            species: species.to_vec(),
            strict, remove_duplicates,
        }
    }

    pub fn base_mut(&mut self) -> &mut FilterBase<S> { &mut self.base }

    /// Reason for discarding `block`, or None if it should be kept.
    fn rejection(
        &self,
        block: &AlignmentBlock,
    ) -> Option<String> {
        if block.number_of_sequences() == 0 {
            return Some("no sequence left".to_string())
        }

        let mut counts: IndexMap<&str, usize> = self.species.iter().map(|x| (x.as_str(), 0)).collect();
        block.sequences().iter().for_each(|seq| {
            if let Some(count) = counts.get_mut(seq.species()) {
                *count += 1;
            }
        });

        if self.strict {
            if let Some((species, _)) = counts.iter().find(|(_, count)| **count == 0) {
                return Some(format!("species {} is missing", species))
            }
        }
        if self.remove_duplicates {
            if let Some((species, count)) = counts.iter().find(|(_, count)| **count > 1) {
                return Some(format!("species {} is present {} times", species, count))
            }
        }
        None
    }
}

impl<S: BlockSource> BlockSource for SpeciesFilter<S> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        while let Some(mut block) = self.base.pull()? {
            block.retain_sequences(|seq| self.species.iter().any(|x| x == seq.species()));
            match self.rejection(&block) {
                Some(reason) => self.base.log(format_args!("block was discarded: {}", reason)),
                None => return Ok(Some(block)),
            }
        }
        Ok(None)
    }
}
