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

//! Errors raised while reading, filtering, or writing alignment blocks.
//!
//! Running out of blocks is never an error: sources signal the end of the
//! stream by returning `Ok(None)`.

/// Errors from the block model and the pipeline stages.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// A record in the input does not have the expected shape.
    MalformedInput { line: usize, message: String },
    /// Coordinates were requested from a sequence that has none.
    MissingCoordinates { sequence: String },
    /// No sequence for the species in the block.
    SpeciesNotFound { species: String },
    /// Sequence index past the end of the block.
    IndexOutOfBounds { index: usize, len: usize },
    /// A sequence does not have the same number of columns as the block.
    ColumnMismatch { sequence: String, expected: usize, found: usize },
    /// A stage was configured with values it cannot work with.
    InvalidParameter(String),
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MalformedInput { line, message } => write!(f, "Malformed input on line {}: {}", line, message),
            Error::MissingCoordinates { sequence } => write!(f, "Sequence '{}' does not have coordinates", sequence),
            Error::SpeciesNotFound { species } => write!(f, "No sequence for species '{}' in this block", species),
            Error::IndexOutOfBounds { index, len } => write!(f, "Sequence index {} is out of bounds for a block of {} sequences", index, len),
            Error::ColumnMismatch { sequence, expected, found } => write!(f, "Sequence '{}' has {} columns, the block has {}", sequence, found, expected),
            Error::InvalidParameter(message) => write!(f, "Invalid parameter: {}", message),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn display_malformed_input() {
        use super::Error;

        let err = Error::MalformedInput { line: 12, message: "expected 7 fields, found 5".to_string() };
        assert_eq!(err.to_string(), "Malformed input on line 12: expected 7 fields, found 5");
    }

    #[test]
    fn io_error_has_source() {
        use super::Error;
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(err.source().is_some());
        assert!(Error::SpeciesNotFound { species: "hg19".to_string() }.source().is_none());
    }
}
