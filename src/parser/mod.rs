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

//! Parser for reading [AlignmentBlock] records from .maf files.
//!
//! [MafParser] is the first stage of a pipeline: it implements
//! [BlockSource] and returns one block per call to
//! [next_block](BlockSource::next_block).
//!
//! Blocks start with an `a` line and end at an empty line, at the next `a`
//! line, or at the end of the input. `s` and `q` lines are read; `i` and `e`
//! lines and comments are skipped.
//!
//! ## Usage
//!
//! ```rust
//! use mafpipe::BlockSource;
//! use mafpipe::parser::MafParser;
//! use std::io::Cursor;
//!
//! let mut data: Vec<u8> = b"##maf version=1 scoring=tba.v8\n\n".to_vec();
//! data.append(&mut b"a score=23262.0\n".to_vec());
//! data.append(&mut b"s hg18.chr7    27578828 38 + 158545518 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG\n".to_vec());
//! data.append(&mut b"s panTro1.chr6 28741140 38 + 161576975 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG\n".to_vec());
//! data.append(&mut b"\n".to_vec());
//!
//! let mut parser = MafParser::new(Cursor::new(data));
//!
//! let block = parser.next_block().unwrap().unwrap();
//! assert_eq!(block.number_of_sequences(), 2);
//! assert_eq!(block.number_of_columns(), 41);
//! assert_eq!(block.score(), Some(23262.0));
//!
//! assert!(parser.next_block().unwrap().is_none());
//! ```
//!

// Format specific implementations
pub mod maf;

use crate::parser::maf::read_a_line;
use crate::parser::maf::read_q_line;
use crate::parser::maf::read_s_line;

use crate::AlignmentBlock;
use crate::BlockSource;
use crate::Error;
use crate::Result;

use bstr::ByteSlice;

use std::io::BufRead;

pub struct MafParser<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    // `a` line that ended the previous block
    pending: Option<Vec<u8>>,
    line_number: usize,
    exhausted: bool,
}

impl<R: BufRead> MafParser<R> {
    pub fn new(
        reader: R,
    ) -> Self {
        MafParser {
            reader,
            buf: Vec::new(),
            pending: None,
            line_number: 0,
            exhausted: false,
        }
    }
}

impl<R: BufRead> MafParser<R> {
    /// Number of lines read so far.
    pub fn line_number(&self) -> usize { self.line_number }

    fn malformed(
        &self,
        message: String,
    ) -> Error {
        Error::MalformedInput { line: self.line_number, message }
    }

    // Next line without the line terminator, or None at the end of input.
    fn read_line(
        &mut self,
    ) -> Result<Option<Vec<u8>>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line))
        }
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None)
        }
        self.line_number += 1;
        Ok(Some(self.buf.trim_end_with(|x| x == '\n' || x == '\r').to_vec()))
    }

    fn attach_quality(
        &self,
        block: &mut AlignmentBlock,
        fields: &[&[u8]],
    ) -> Result<()> {
        let (name, quality) = read_q_line(fields).map_err(|e| self.malformed(e))?;
        let seq = block.sequences_mut().iter_mut().rev()
            .find(|seq| seq.name() == name)
            .ok_or_else(|| self.malformed(format!("'q' line for '{}' has no matching 's' line", name)))?;
        seq.set_quality(Some(quality)).map_err(|e| self.malformed(e.to_string()))
    }
}

impl<R: BufRead> BlockSource for MafParser<R> {
    fn next_block(
        &mut self,
    ) -> Result<Option<AlignmentBlock>> {
        if self.exhausted {
            return Ok(None)
        }

        let mut block: Option<AlignmentBlock> = None;
        loop {
            let Some(line) = self.read_line()? else {
                self.exhausted = true;
                return Ok(block)
            };

            let fields: Vec<&[u8]> = line.fields().collect();
            match fields.first().copied() {
                None => {
                    if block.is_some() {
                        return Ok(block)
                    }
                },
                Some(field) if field.starts_with(b"#") => (),
                Some(b"a") => {
                    if block.is_some() {
                        self.pending = Some(line);
                        return Ok(block)
                    }
                    let (score, pass) = read_a_line(&fields).map_err(|e| self.malformed(e))?;
                    let mut new = AlignmentBlock::new();
                    new.set_score(score);
                    new.set_pass(pass);
                    block = Some(new);
                },
                Some(b"s") => {
                    let seq = read_s_line(&fields).map_err(|e| self.malformed(e))?;
                    let current = block.as_mut().ok_or_else(|| self.malformed("'s' line outside of a block".to_string()))?;
                    current.add_sequence(seq).map_err(|e| self.malformed(e.to_string()))?;
                },
                Some(b"q") => {
                    let mut current = block.take().ok_or_else(|| self.malformed("'q' line outside of a block".to_string()))?;
                    self.attach_quality(&mut current, &fields)?;
                    block = Some(current);
                },
                Some(b"i") | Some(b"e") => (),
                Some(other) => {
                    return Err(self.malformed(format!("unrecognized line type '{}'", other.as_bstr())))
                },
            }
        }
    }
}
