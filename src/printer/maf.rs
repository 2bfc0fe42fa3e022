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
use std::io::Write;

use crate::AlignmentBlock;
use crate::Result;

/// Format the header line of a .maf file
pub fn format_maf_header<W: Write>(
    conn: &mut W,
) -> Result<()> {
    conn.write_all(b"##maf version=1 program=mafpipe\n\n")?;
    Ok(())
}

/// Format one alignment block in .maf format
///
/// Writes the `a` line, one `s` line per sequence and a `q` line for every
/// sequence that has qualities, followed by an empty line. The fields of the
/// `s` lines are padded so that the sequences line up.
///
/// Sequences without coordinates are written with start position 0. If
/// `mask` is false, soft-masked (lower case) residues are written in upper
/// case.
///
pub fn format_maf_block<W: Write>(
    block: &AlignmentBlock,
    mask: bool,
    conn: &mut W,
) -> Result<()> {
    let mut formatted: String = "a".to_string();
    if let Some(score) = block.score() {
        formatted += &format!(" score={}", score);
    }
    if let Some(pass) = block.pass() {
        formatted += &format!(" pass={}", pass);
    }
    formatted += "\n";
    conn.write_all(formatted.as_bytes())?;

    let starts: Vec<String> = block.sequences().iter().map(|seq| seq.start().unwrap_or(0).to_string()).collect();
    let w_name = block.sequences().iter().map(|seq| seq.name().len()).max().unwrap_or(0);
    let w_start = starts.iter().map(|x| x.len()).max().unwrap_or(0);
    let w_size = block.sequences().iter().map(|seq| seq.genomic_size().to_string().len()).max().unwrap_or(0);
    let w_src = block.sequences().iter().map(|seq| seq.src_size().to_string().len()).max().unwrap_or(0);
    let w_quality = w_name + w_start + w_size + w_src + 5;

    for (seq, start) in block.sequences().iter().zip(starts.iter()) {
        let line = format!("s {:<w_name$} {:>w_start$} {:>w_size$} {} {:>w_src$} ",
                           seq.name(), start, seq.genomic_size(), seq.strand().as_char(), seq.src_size());
        conn.write_all(line.as_bytes())?;
        if mask {
            conn.write_all(seq.symbols())?;
        } else {
            conn.write_all(&seq.symbols().to_ascii_uppercase())?;
        }
        conn.write_all(b"\n")?;

        if let Some(quality) = seq.quality() {
            conn.write_all(format!("q {:<w_quality$} ", seq.name()).as_bytes())?;
            conn.write_all(quality)?;
            conn.write_all(b"\n")?;
        }
    }
    conn.write_all(b"\n")?;

    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn format_maf_block() {
        use super::format_maf_block;
        use crate::{AlignedSequence, AlignmentBlock, Strand};

        let mut block = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("hg18.chr7", b"AAA-GGGAAT".to_vec(), 27578828, Strand::Forward, 158545518),
            AlignedSequence::with_coordinates("panTro1.chr6", b"AAA-GGGAAT".to_vec(), 28741140, Strand::Reverse, 161576975),
            AlignedSequence::new("mm4", b"-AATGGGAAT".to_vec()),
        ]).unwrap();
        block.set_score(Some(23262.0));
        block.set_pass(Some(2));

        let mut expected: Vec<u8> = b"a score=23262 pass=2\n".to_vec();
        expected.append(&mut b"s hg18.chr7    27578828 9 + 158545518 AAA-GGGAAT\n".to_vec());
        expected.append(&mut b"s panTro1.chr6 28741140 9 - 161576975 AAA-GGGAAT\n".to_vec());
        expected.append(&mut b"s mm4                 0 9 ?         0 -AATGGGAAT\n".to_vec());
        expected.append(&mut b"\n".to_vec());

        let mut got: Vec<u8> = Vec::new();
        format_maf_block(&block, true, &mut got).unwrap();

        assert_eq!(String::from_utf8(got).unwrap(), String::from_utf8(expected).unwrap());
    }

    #[test]
    fn format_maf_block_with_quality() {
        use super::format_maf_block;
        use crate::{AlignedSequence, AlignmentBlock, Strand};

        let mut seq = AlignedSequence::with_coordinates("rn3.chr4", b"AC-T".to_vec(), 81444246, Strand::Forward, 187371129);
        seq.set_quality(Some(b"99-9".to_vec())).unwrap();
        let block = AlignmentBlock::from_sequences(vec![seq]).unwrap();

        let mut expected: Vec<u8> = b"a\n".to_vec();
        expected.append(&mut b"s rn3.chr4 81444246 3 + 187371129 AC-T\n".to_vec());
        expected.append(&mut b"q rn3.chr4                        99-9\n".to_vec());
        expected.append(&mut b"\n".to_vec());

        let mut got: Vec<u8> = Vec::new();
        format_maf_block(&block, true, &mut got).unwrap();

        assert_eq!(String::from_utf8(got).unwrap(), String::from_utf8(expected).unwrap());
    }

    #[test]
    fn format_maf_block_without_mask() {
        use super::format_maf_block;
        use crate::{AlignedSequence, AlignmentBlock, Strand};

        let block = AlignmentBlock::from_sequences(vec![
            AlignedSequence::with_coordinates("hg19.chr1", b"acGT-n".to_vec(), 10, Strand::Forward, 1000),
        ]).unwrap();

        let mut masked: Vec<u8> = Vec::new();
        format_maf_block(&block, true, &mut masked).unwrap();
        assert_eq!(masked, b"a\ns hg19.chr1 10 5 + 1000 acGT-n\n\n".to_vec());

        let mut unmasked: Vec<u8> = Vec::new();
        format_maf_block(&block, false, &mut unmasked).unwrap();
        assert_eq!(unmasked, b"a\ns hg19.chr1 10 5 + 1000 ACGT-N\n\n".to_vec());
        assert_eq!(block.sequence(0).unwrap().symbols(), b"acGT-n");
    }
}
