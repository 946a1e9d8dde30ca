//! Reading OpenStreetMap PBF extracts.
//!
//! [`BlobReader`] frames the byte stream and inflates each blob;
//! [`PrimitiveDecoder`] turns the payloads into cached features, statistics
//! and header metadata.

mod blob;
mod decode;
mod error;
pub mod proto;

pub use blob::{BlobKind, BlobReader, MAX_BLOB_SIZE, MAX_HEADER_SIZE};
pub use decode::{DEFAULT_GRANULARITY, DecodeSummary, DecodedDataset, PrimitiveDecoder};
pub use error::{BlobReadError, DecodeError};
