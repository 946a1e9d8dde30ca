//! Error classification shared by every error type in the crate.

use std::fmt;

/// Broad failure class shared by every error in this crate.
///
/// Every class aborts the conversion; the class only tells callers whether
/// the input, its encoding, a consistency check or the output store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input could not be opened or read, or violates a hard limit.
    Input,
    /// The input bytes are not valid protobuf or compressed data.
    Decode,
    /// Decoded data contradicts its own declarations.
    Validation,
    /// The output container could not be written.
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Decode => "decode",
            Self::Validation => "validation",
            Self::Persistence => "persistence",
        })
    }
}
