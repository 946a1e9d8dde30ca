use std::io;

use thiserror::Error;

use crate::ErrorKind;

/// Errors raised while framing and decompressing blobs.
///
/// `offset` is the byte position in the input where the failing blob's
/// length prefix starts.
#[derive(Debug, Error)]
pub enum BlobReadError {
    /// Reading from the underlying stream failed.
    #[error("failed to read blob at byte {offset}")]
    Read {
        /// Start of the blob.
        offset: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The stream ended inside a blob.
    #[error("input truncated in {section} at byte {offset}: expected {expected} bytes, found {actual}")]
    Truncated {
        /// Start of the blob.
        offset: u64,
        /// Part of the blob being read.
        section: &'static str,
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },
    /// The declared blob header length exceeds the format limit.
    #[error("blob header at byte {offset} declares {size} bytes, above the {limit} byte limit")]
    HeaderTooLarge {
        /// Start of the blob.
        offset: u64,
        /// Declared header length.
        size: usize,
        /// Largest accepted header.
        limit: usize,
    },
    /// The declared blob size exceeds the format limit.
    #[error("blob at byte {offset} declares {size} bytes, above the {limit} byte limit")]
    BlobTooLarge {
        /// Start of the blob.
        offset: u64,
        /// Declared payload or inflated size.
        size: usize,
        /// Largest accepted blob.
        limit: usize,
    },
    /// A declared size is negative.
    #[error("blob at byte {offset} declares a negative size {size}")]
    InvalidSize {
        /// Start of the blob.
        offset: u64,
        /// Declared size.
        size: i32,
    },
    /// The blob header is not a valid message.
    #[error("failed to decode blob header at byte {offset}")]
    DecodeHeader {
        /// Start of the blob.
        offset: u64,
        /// Protobuf decode error.
        #[source]
        source: prost::DecodeError,
    },
    /// The blob header names a type other than `OSMHeader` or `OSMData`.
    #[error("blob at byte {offset} has unknown type {blob_type:?}")]
    UnknownBlobType {
        /// Start of the blob.
        offset: u64,
        /// Type string from the blob header.
        blob_type: String,
    },
    /// The blob body is not a valid message.
    #[error("failed to decode blob at byte {offset}")]
    DecodeBlob {
        /// Start of the blob.
        offset: u64,
        /// Protobuf decode error.
        #[source]
        source: prost::DecodeError,
    },
    /// The blob holds no payload, or one in an unsupported encoding.
    #[error("blob at byte {offset} has no supported payload ({encoding})")]
    MissingData {
        /// Start of the blob.
        offset: u64,
        /// Encoding found, or `empty`.
        encoding: &'static str,
    },
    /// The zlib stream is corrupt.
    #[error("failed to inflate blob at byte {offset}")]
    Inflate {
        /// Start of the blob.
        offset: u64,
        /// Decompression error.
        #[source]
        source: io::Error,
    },
    /// The inflated length differs from the declared raw size.
    #[error("blob at byte {offset} inflated to {actual} bytes but declares {expected}")]
    SizeMismatch {
        /// Start of the blob.
        offset: u64,
        /// Declared raw size.
        expected: usize,
        /// Inflated size (capped one byte past `expected`).
        actual: usize,
    },
}

impl BlobReadError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Read { .. }
            | Self::Truncated { .. }
            | Self::HeaderTooLarge { .. }
            | Self::BlobTooLarge { .. }
            | Self::InvalidSize { .. } => ErrorKind::Input,
            Self::DecodeHeader { .. }
            | Self::UnknownBlobType { .. }
            | Self::DecodeBlob { .. }
            | Self::MissingData { .. }
            | Self::Inflate { .. } => ErrorKind::Decode,
            Self::SizeMismatch { .. } => ErrorKind::Validation,
        }
    }
}

/// Errors raised while decoding a block payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// An `OSMHeader` payload is not a valid header block.
    #[error("failed to decode header block")]
    HeaderBlock {
        /// Protobuf decode error.
        #[source]
        source: prost::DecodeError,
    },
    /// An `OSMData` payload is not a valid primitive block.
    #[error("failed to decode primitive block")]
    PrimitiveBlock {
        /// Protobuf decode error.
        #[source]
        source: prost::DecodeError,
    },
}

impl DecodeError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::HeaderBlock { .. } | Self::PrimitiveBlock { .. } => ErrorKind::Decode,
        }
    }
}
