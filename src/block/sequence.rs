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
use crate::alphabet::count_residues;
use crate::alphabet::is_gap;
use crate::Error;
use crate::Result;

use std::ops::Range;

/// Quality character used for columns that carry no quality value.
const NO_QUALITY: u8 = b'-';

/// Strand of a sequence relative to its source contig.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '?',
        }
    }
}

impl std::str::FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "?" => Ok(Strand::Unknown),
            _ => Err(format!("'{}' is not a valid Strand", s)),
        }
    }
}

/// A gapped sequence in an alignment block.
///
/// The species and chromosome are derived once from the name by splitting
/// it on the first `.`: `hg19.chr7` has species `hg19` and chromosome
/// `chr7`. A name without a `.` is all species and has an empty chromosome.
///
/// The genomic size (number of residues) is recomputed by every method that
/// edits the symbols, so it always matches the current content. The start
/// coordinate is optional and can be dropped with
/// [remove_coordinates](AlignedSequence::remove_coordinates) when an edit
/// made for another sequence leaves this one without a meaningful position.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignedSequence {
    name: String,
    species: String,
    chromosome: String,

    symbols: Vec<u8>,
    quality: Option<Vec<u8>>,

    start: Option<u64>,
    strand: Strand,
    size: u64,
    src_size: u64,
}

impl AlignedSequence {
    /// Sequence without coordinates.
    pub fn new(
        name: &str,
        symbols: Vec<u8>,
    ) -> Self {
        let (species, chromosome) = match name.split_once('.') {
            Some((species, chromosome)) => (species.to_string(), chromosome.to_string()),
            None => (name.to_string(), String::new()),
        };
        let size = count_residues(&symbols);
        AlignedSequence {
            name: name.to_string(), species, chromosome,
            symbols, quality: None,
            start: None, strand: Strand::Unknown, size, src_size: 0,
        }
    }

    /// Sequence anchored at the 0-based `start` on a contig of length `src_size`.
    pub fn with_coordinates(
        name: &str,
        symbols: Vec<u8>,
        start: u64,
        strand: Strand,
        src_size: u64,
    ) -> Self {
        let mut seq = AlignedSequence::new(name, symbols);
        seq.start = Some(start);
        seq.strand = strand;
        seq.src_size = src_size;
        seq
    }
}

impl AlignedSequence {
    pub fn name(&self) -> &str { &self.name }

    pub fn species(&self) -> &str { &self.species }

    pub fn chromosome(&self) -> &str { &self.chromosome }

    pub fn strand(&self) -> Strand { self.strand }

    /// Number of residues in the sequence.
    pub fn genomic_size(&self) -> u64 { self.size }

    pub fn src_size(&self) -> u64 { self.src_size }

    pub fn symbols(&self) -> &[u8] { &self.symbols }

    /// Per-column quality characters, if the sequence has them.
    pub fn quality(&self) -> Option<&[u8]> { self.quality.as_deref() }

    /// Number of alignment columns, gaps included.
    pub fn len(&self) -> usize { self.symbols.len() }

    pub fn is_empty(&self) -> bool { self.symbols.is_empty() }

    pub fn has_coordinates(&self) -> bool { self.start.is_some() }

    pub fn start(
        &self,
    ) -> Result<u64> {
        self.start.ok_or_else(|| Error::MissingCoordinates { sequence: self.name.clone() })
    }

    /// Last residue covered by the sequence, `start + genomic_size - 1`.
    pub fn stop(
        &self,
    ) -> Result<u64> {
        Ok((self.start()? + self.size).saturating_sub(1))
    }

    /// `name` followed by strand and range, e.g. `hg19.chr7+:100-199`.
    pub fn description(&self) -> String {
        match (self.start, self.stop()) {
            (Some(start), Ok(stop)) => format!("{}{}:{}-{}", self.name, self.strand.as_char(), start, stop),
            _ => format!("{}{}", self.name, self.strand.as_char()),
        }
    }

    pub fn is_gap_at(
        &self,
        column: usize,
    ) -> bool {
        self.symbols.get(column).is_some_and(|x| is_gap(*x))
    }

    /// Genomic position of the residue in `column`.
    ///
    /// Returns None for gap columns, columns past the end, and sequences
    /// without coordinates.
    pub fn genomic_position(
        &self,
        column: usize,
    ) -> Option<u64> {
        let start = self.start?;
        if column >= self.symbols.len() || self.is_gap_at(column) {
            return None
        }
        Some(start + count_residues(&self.symbols[0..column]))
    }

    pub fn set_start(&mut self, start: u64) { self.start = Some(start); }

    pub fn set_chromosome(&mut self, chromosome: &str) { self.chromosome = chromosome.to_string(); }

    pub fn set_strand(&mut self, strand: Strand) { self.strand = strand; }

    pub fn set_src_size(&mut self, src_size: u64) { self.src_size = src_size; }

    /// Drops the start coordinate, leaving the symbols untouched.
    pub fn remove_coordinates(&mut self) { self.start = None; }

    /// Attaches per-column quality characters.
    pub fn set_quality(
        &mut self,
        quality: Option<Vec<u8>>,
    ) -> Result<()> {
        if let Some(qual) = quality.as_ref() {
            if qual.len() != self.symbols.len() {
                return Err(Error::ColumnMismatch { sequence: self.name.clone(), expected: self.symbols.len(), found: qual.len() })
            }
        }
        self.quality = quality;
        Ok(())
    }

    fn update_size(&mut self) {
        self.size = count_residues(&self.symbols);
    }

    fn check_column(
        &self,
        column: usize,
        len: usize,
    ) -> Result<()> {
        if column > len {
            return Err(Error::IndexOutOfBounds { index: column, len })
        }
        Ok(())
    }

    /// Replaces the content, dropping any quality track.
    pub fn set_symbols(
        &mut self,
        symbols: Vec<u8>,
    ) {
        self.symbols = symbols;
        self.quality = None;
        self.update_size();
    }

    pub fn insert(
        &mut self,
        column: usize,
        symbols: &[u8],
    ) -> Result<()> {
        self.check_column(column, self.symbols.len())?;
        self.symbols.splice(column..column, symbols.iter().copied());
        if let Some(qual) = self.quality.as_mut() {
            qual.splice(column..column, std::iter::repeat(NO_QUALITY).take(symbols.len()));
        }
        self.update_size();
        Ok(())
    }

    pub fn remove(
        &mut self,
        columns: Range<usize>,
    ) -> Result<()> {
        self.check_column(columns.end, self.symbols.len())?;
        self.check_column(columns.start, columns.end)?;
        self.symbols.drain(columns.clone());
        if let Some(qual) = self.quality.as_mut() {
            qual.drain(columns);
        }
        self.update_size();
        Ok(())
    }

    pub fn substitute(
        &mut self,
        column: usize,
        symbol: u8,
    ) -> Result<()> {
        let len = self.symbols.len();
        let target = self.symbols.get_mut(column).ok_or(Error::IndexOutOfBounds { index: column, len })?;
        *target = symbol;
        self.update_size();
        Ok(())
    }

    /// Appends `n` copies of `symbol`.
    pub fn pad_right(
        &mut self,
        n: usize,
        symbol: u8,
    ) {
        self.symbols.extend(std::iter::repeat(symbol).take(n));
        if let Some(qual) = self.quality.as_mut() {
            qual.extend(std::iter::repeat(NO_QUALITY).take(n));
        }
        self.update_size();
    }

    /// Prepends `n` copies of `symbol`. The start coordinate is unchanged.
    pub fn pad_left(
        &mut self,
        n: usize,
        symbol: u8,
    ) {
        self.symbols.splice(0..0, std::iter::repeat(symbol).take(n));
        if let Some(qual) = self.quality.as_mut() {
            qual.splice(0..0, std::iter::repeat(NO_QUALITY).take(n));
        }
        self.update_size();
    }

    /// Appends the columns of `other`, keeping the name and coordinates of self.
    pub fn append(
        &mut self,
        other: &AlignedSequence,
    ) {
        match (self.quality.as_mut(), other.quality.as_ref()) {
            (Some(qual), Some(other_qual)) => qual.extend_from_slice(other_qual),
            (Some(qual), None) => qual.extend(std::iter::repeat(NO_QUALITY).take(other.len())),
            (None, Some(other_qual)) => {
                let mut qual = vec![NO_QUALITY; self.symbols.len()];
                qual.extend_from_slice(other_qual);
                self.quality = Some(qual);
            },
            (None, None) => (),
        }
        self.symbols.extend_from_slice(&other.symbols);
        self.update_size();
    }

    /// Keeps the columns for which `keep` is true.
    pub fn retain_columns(
        &mut self,
        keep: &[bool],
    ) -> Result<()> {
        if keep.len() != self.symbols.len() {
            return Err(Error::ColumnMismatch { sequence: self.name.clone(), expected: keep.len(), found: self.symbols.len() })
        }
        let mut flags = keep.iter();
        self.symbols.retain(|_| *flags.next().unwrap_or(&false));
        if let Some(qual) = self.quality.as_mut() {
            let mut flags = keep.iter();
            qual.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.update_size();
        Ok(())
    }

    /// Copy of `len` columns starting at `begin`.
    ///
    /// The start coordinate of the copy moves forward by the number of
    /// residues before `begin`.
    pub fn sub_sequence(
        &self,
        begin: usize,
        len: usize,
    ) -> Result<AlignedSequence> {
        let end = begin + len;
        self.check_column(end, self.symbols.len())?;
        let mut seq = AlignedSequence {
            name: self.name.clone(),
            species: self.species.clone(),
            chromosome: self.chromosome.clone(),
            symbols: self.symbols[begin..end].to_vec(),
            quality: self.quality.as_ref().map(|x| x[begin..end].to_vec()),
            start: self.start.map(|x| x + count_residues(&self.symbols[0..begin])),
            strand: self.strand,
            size: 0,
            src_size: self.src_size,
        };
        seq.update_size();
        Ok(seq)
    }
}
