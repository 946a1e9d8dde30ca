//! In-memory construction of PBF extracts for tests.
//!
//! Enabled for this crate's unit tests and, through the `test-support`
//! feature, for downstream crates that need realistic input files.

use std::io::{self, Write};

use flate2::{Compression, write::ZlibEncoder};
use prost::Message;
use tilepress_core::TileCoord;

use crate::pbf::proto::{
    Blob, BlobData, BlobHeader, DenseNodes, HeaderBBox, HeaderBlock, PrimitiveBlock,
    PrimitiveGroup, Relation, StringTable, Way,
};

/// Tile at zoom 12 holding every node of [`sample_extract`].
pub const SAMPLE_TILE: TileCoord = TileCoord {
    zoom: 12,
    x: 2052,
    y: 2043,
};

/// Compress `bytes` as a zlib stream.
pub fn zlib(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Frame `blob` with a length prefix and a header of type `blob_type`.
#[must_use]
#[expect(clippy::big_endian_bytes, reason = "PBF length prefixes are big-endian")]
pub fn frame_blob(blob_type: &str, blob: &Blob) -> Vec<u8> {
    let body = blob.encode_to_vec();
    let header = BlobHeader {
        r#type: blob_type.to_owned(),
        indexdata: None,
        datasize: i32::try_from(body.len()).unwrap_or(i32::MAX),
    }
    .encode_to_vec();

    let mut framed = u32::try_from(header.len())
        .unwrap_or(u32::MAX)
        .to_be_bytes()
        .to_vec();
    framed.extend_from_slice(&header);
    framed.extend_from_slice(&body);
    framed
}

enum PendingBlob {
    Raw(String, Vec<u8>),
    Zlib(String, Vec<u8>),
}

/// Builder for a PBF byte stream; blobs are framed in insertion order.
#[derive(Default)]
pub struct PbfBuilder {
    blobs: Vec<PendingBlob>,
}

impl PbfBuilder {
    /// Start an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an uncompressed blob.
    #[must_use]
    pub fn raw_blob(mut self, blob_type: &str, payload: &[u8]) -> Self {
        self.blobs
            .push(PendingBlob::Raw(blob_type.to_owned(), payload.to_vec()));
        self
    }

    /// Append a zlib-compressed blob.
    #[must_use]
    pub fn zlib_blob(mut self, blob_type: &str, payload: &[u8]) -> Self {
        self.blobs
            .push(PendingBlob::Zlib(blob_type.to_owned(), payload.to_vec()));
        self
    }

    /// Append a compressed `OSMHeader` blob.
    #[must_use]
    pub fn header(self, block: &HeaderBlock) -> Self {
        self.zlib_blob("OSMHeader", &block.encode_to_vec())
    }

    /// Append a compressed `OSMData` blob.
    #[must_use]
    pub fn primitives(self, block: &PrimitiveBlock) -> Self {
        self.zlib_blob("OSMData", &block.encode_to_vec())
    }

    /// Serialize every blob in order.
    pub fn build(self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for pending in self.blobs {
            let (blob_type, blob) = match pending {
                PendingBlob::Raw(blob_type, payload) => (
                    blob_type,
                    Blob {
                        raw_size: None,
                        data: Some(BlobData::Raw(payload)),
                    },
                ),
                PendingBlob::Zlib(blob_type, payload) => {
                    let compressed = zlib(&payload)?;
                    (
                        blob_type,
                        Blob {
                            raw_size: Some(i32::try_from(payload.len()).unwrap_or(i32::MAX)),
                            data: Some(BlobData::ZlibData(compressed)),
                        },
                    )
                }
            };
            bytes.extend(frame_blob(&blob_type, &blob));
        }
        Ok(bytes)
    }
}

/// Header of [`sample_extract`]: a one-degree box at the origin.
#[must_use]
pub fn sample_header() -> HeaderBlock {
    HeaderBlock {
        bbox: Some(HeaderBBox {
            left: 0,
            right: 1_000_000_000,
            top: 1_000_000_000,
            bottom: 0,
        }),
        required_features: vec!["OsmSchema-V0.6".to_owned(), "DenseNodes".to_owned()],
        optional_features: Vec::new(),
        writingprogram: Some("tilepress-tests".to_owned()),
        source: Some("synthetic".to_owned()),
    }
}

/// Primitives of [`sample_extract`].
///
/// Three dense nodes at (0.41, 0.41), (0.42, 0.42) and (0.43, 0.43), a
/// footway through the first two and one tagged relation.
#[must_use]
pub fn sample_primitives() -> PrimitiveBlock {
    let strings = ["", "amenity", "bench", "highway", "footway", "ele", "12", "type", "route"];
    PrimitiveBlock {
        stringtable: Some(StringTable {
            s: strings.iter().map(|entry| entry.as_bytes().to_vec()).collect(),
        }),
        primitivegroup: vec![
            PrimitiveGroup {
                dense: Some(DenseNodes {
                    id: vec![1, 1, 1],
                    lat: vec![4_100_000, 100_000, 100_000],
                    lon: vec![4_100_000, 100_000, 100_000],
                    keys_vals: vec![1, 2, 0, 5, 6, 0, 0],
                }),
                ..PrimitiveGroup::default()
            },
            PrimitiveGroup {
                ways: vec![Way {
                    id: 10,
                    keys: vec![3],
                    vals: vec![4],
                    refs: vec![1, 1],
                }],
                ..PrimitiveGroup::default()
            },
            PrimitiveGroup {
                relations: vec![Relation {
                    id: 20,
                    keys: vec![7],
                    vals: vec![8],
                }],
                ..PrimitiveGroup::default()
            },
        ],
        granularity: None,
        date_granularity: None,
        lat_offset: None,
        lon_offset: None,
    }
}

/// A complete, valid extract: [`sample_header`] then [`sample_primitives`].
pub fn sample_extract() -> io::Result<Vec<u8>> {
    PbfBuilder::new()
        .header(&sample_header())
        .primitives(&sample_primitives())
        .build()
}
