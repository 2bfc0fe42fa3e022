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
use bstr::ByteSlice;

use crate::AlignedSequence;
use crate::Strand;

fn parse_field<T: std::str::FromStr>(
    field: &[u8],
    what: &str,
) -> Result<T, String> {
    field.to_str().ok()
        .and_then(|x| x.parse::<T>().ok())
        .ok_or_else(|| format!("'{}' is not a valid {}", field.as_bstr(), what))
}

/// Parse an `a` line
///
/// Reads the `score` and `pass` variables from the line. Other variables
/// are ignored and a `pass` of 0 is treated as missing.
///
pub fn read_a_line(
    fields: &[&[u8]],
) -> Result<(Option<f64>, Option<u32>), String> {
    let mut score: Option<f64> = None;
    let mut pass: Option<u32> = None;

    for field in fields.iter().skip(1) {
        match field.split_once_str("=") {
            Some((b"score", value)) => score = Some(parse_field::<f64>(value, "score")?),
            Some((b"pass", value)) => {
                let value = parse_field::<u32>(value, "pass")?;
                pass = if value > 0 { Some(value) } else { None };
            },
            _ => (),
        }
    }

    Ok((score, pass))
}

/// Parse an `s` line
///
/// Reads the 7 fields `s src start size strand srcSize text` into an
/// [AlignedSequence]. The size must equal the number of residues in the text.
///
pub fn read_s_line(
    fields: &[&[u8]],
) -> Result<AlignedSequence, String> {
    if fields.len() != 7 {
        return Err(format!("expected 7 fields on an 's' line, found {}", fields.len()))
    }

    let name = fields[1].to_str().map_err(|_| format!("'{}' is not a valid sequence name", fields[1].as_bstr()))?;
    let start = parse_field::<u64>(fields[2], "start position")?;
    let size = parse_field::<u64>(fields[3], "size")?;
    let strand = parse_field::<Strand>(fields[4], "strand")?;
    let src_size = parse_field::<u64>(fields[5], "source size")?;

    let seq = AlignedSequence::with_coordinates(name, fields[6].to_vec(), start, strand, src_size);
    if seq.genomic_size() != size {
        return Err(format!("size of '{}' is {} but the text contains {} residues", name, size, seq.genomic_size()))
    }

    Ok(seq)
}

/// Parse a `q` line
///
/// Returns the source name and the quality text.
///
pub fn read_q_line(
    fields: &[&[u8]],
) -> Result<(String, Vec<u8>), String> {
    if fields.len() != 3 {
        return Err(format!("expected 3 fields on a 'q' line, found {}", fields.len()))
    }
    let name = fields[1].to_str().map_err(|_| format!("'{}' is not a valid sequence name", fields[1].as_bstr()))?;
    Ok((name.to_string(), fields[2].to_vec()))
}
