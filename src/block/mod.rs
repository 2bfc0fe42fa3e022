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

//! Alignment blocks and the sequences they contain.
//!
//! An [AlignmentBlock] is the unit that flows through a pipeline: an ordered
//! list of [AlignedSequence] records that all have the same number of
//! alignment columns, plus the optional `score` and `pass` values from the
//! `a` line of a .maf file.
//!
//! Blocks are plain owned values. A stage that returns a block from
//! [next_block](crate::BlockSource::next_block) hands it over completely,
//! and a stage that decides not to forward a block simply drops it.
//!

pub mod sequence;

pub use sequence::AlignedSequence;
pub use sequence::Strand;

use crate::Error;
use crate::Result;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlignmentBlock {
    sequences: Vec<AlignedSequence>,
    score: Option<f64>,
    pass: Option<u32>,
}

impl AlignmentBlock {
    pub fn new() -> Self {
        AlignmentBlock::default()
    }

    /// Block from `sequences`, checking that they have the same number of columns.
    pub fn from_sequences(
        sequences: Vec<AlignedSequence>,
    ) -> Result<Self> {
        let mut block = AlignmentBlock::new();
        for seq in sequences {
            block.add_sequence(seq)?;
        }
        Ok(block)
    }
}

impl AlignmentBlock {
    pub fn score(&self) -> Option<f64> { self.score }

    pub fn set_score(&mut self, score: Option<f64>) { self.score = score; }

    pub fn pass(&self) -> Option<u32> { self.pass }

    pub fn set_pass(&mut self, pass: Option<u32>) { self.pass = pass; }

    pub fn number_of_sequences(&self) -> usize { self.sequences.len() }

    /// Number of alignment columns, zero for a block without sequences.
    pub fn number_of_columns(
        &self,
    ) -> usize {
        self.sequences.first().map(|x| x.len()).unwrap_or(0)
    }

    pub fn sequences(&self) -> &[AlignedSequence] { &self.sequences }

    pub fn into_sequences(self) -> Vec<AlignedSequence> { self.sequences }

    /// Species of the sequences in block order, duplicates included.
    pub fn species_list(&self) -> Vec<&str> {
        self.sequences.iter().map(|x| x.species()).collect()
    }

    pub fn has_species(
        &self,
        species: &str,
    ) -> bool {
        self.sequences.iter().any(|x| x.species() == species)
    }

    pub fn add_sequence(
        &mut self,
        sequence: AlignedSequence,
    ) -> Result<()> {
        if !self.sequences.is_empty() && sequence.len() != self.number_of_columns() {
            return Err(Error::ColumnMismatch {
                sequence: sequence.name().to_string(),
                expected: self.number_of_columns(),
                found: sequence.len(),
            })
        }
        self.sequences.push(sequence);
        Ok(())
    }

    pub fn sequence(
        &self,
        index: usize,
    ) -> Result<&AlignedSequence> {
        self.sequences.get(index).ok_or(Error::IndexOutOfBounds { index, len: self.sequences.len() })
    }

    /// First sequence in the block whose species is `species`.
    pub fn sequence_for_species(
        &self,
        species: &str,
    ) -> Result<&AlignedSequence> {
        self.sequences.iter()
            .find(|x| x.species() == species)
            .ok_or_else(|| Error::SpeciesNotFound { species: species.to_string() })
    }

    pub fn remove_coordinates_from_sequence(
        &mut self,
        index: usize,
    ) -> Result<()> {
        let len = self.sequences.len();
        self.sequences.get_mut(index).ok_or(Error::IndexOutOfBounds { index, len })?.remove_coordinates();
        Ok(())
    }

    /// Keeps the sequences for which `keep` returns true, in their original order.
    pub fn retain_sequences<F>(
        &mut self,
        keep: F,
    ) where F: FnMut(&AlignedSequence) -> bool {
        self.sequences.retain(keep);
    }

    /// Removes the columns flagged in `remove` from every sequence.
    ///
    /// Returns the number of removed columns.
    pub fn remove_columns(
        &mut self,
        remove: &[bool],
    ) -> Result<usize> {
        let keep: Vec<bool> = remove.iter().map(|x| !x).collect();
        for seq in self.sequences.iter_mut() {
            seq.retain_columns(&keep)?;
        }
        Ok(remove.iter().filter(|x| **x).count())
    }

    /// Copy of `len` columns starting at `begin`, with score and pass.
    pub fn sub_block(
        &self,
        begin: usize,
        len: usize,
    ) -> Result<AlignmentBlock> {
        let sequences = self.sequences.iter()
            .map(|seq| seq.sub_sequence(begin, len))
            .collect::<Result<Vec<AlignedSequence>>>()?;
        Ok(AlignmentBlock { sequences, score: self.score, pass: self.pass })
    }

    pub(crate) fn sequences_mut(&mut self) -> &mut [AlignedSequence] { &mut self.sequences }
}
