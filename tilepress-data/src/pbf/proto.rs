//! OSM PBF wire messages (`fileformat.proto` and `osmformat.proto`).
//!
//! Declared by hand with `prost` derives. Fields the converter never reads
//! (metadata infos, changesets, relation members) are left out; `prost`
//! skips unknown fields while decoding.

/// Framing header preceding every blob.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BlobHeader {
    /// Block type, `OSMHeader` or `OSMData`.
    #[prost(string, required, tag = "1")]
    pub r#type: String,
    /// Opaque index data.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub indexdata: Option<Vec<u8>>,
    /// Size in bytes of the following serialized `Blob`.
    #[prost(int32, required, tag = "3")]
    pub datasize: i32,
}

/// A possibly compressed block payload.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Blob {
    /// Uncompressed size when the payload is compressed.
    #[prost(int32, optional, tag = "2")]
    pub raw_size: Option<i32>,
    /// Payload in one of the supported encodings.
    #[prost(oneof = "BlobData", tags = "1, 3, 4, 5, 6, 7")]
    pub data: Option<BlobData>,
}

/// Encodings a [`Blob`] payload may use.
#[derive(Clone, PartialEq, prost::Oneof)]
pub enum BlobData {
    /// Uncompressed bytes.
    #[prost(bytes, tag = "1")]
    Raw(Vec<u8>),
    /// zlib stream.
    #[prost(bytes, tag = "3")]
    ZlibData(Vec<u8>),
    /// LZMA stream.
    #[prost(bytes, tag = "4")]
    LzmaData(Vec<u8>),
    /// Retired bzip2 encoding.
    #[prost(bytes, tag = "5")]
    ObsoleteBzip2Data(Vec<u8>),
    /// LZ4 frame.
    #[prost(bytes, tag = "6")]
    Lz4Data(Vec<u8>),
    /// Zstandard frame.
    #[prost(bytes, tag = "7")]
    ZstdData(Vec<u8>),
}

/// File-level header block.
#[derive(Clone, PartialEq, prost::Message)]
pub struct HeaderBlock {
    /// Declared bounding box.
    #[prost(message, optional, tag = "1")]
    pub bbox: Option<HeaderBBox>,
    /// Features a reader must support.
    #[prost(string, repeated, tag = "4")]
    pub required_features: Vec<String>,
    /// Features a reader may use.
    #[prost(string, repeated, tag = "5")]
    pub optional_features: Vec<String>,
    /// Program that produced the file.
    #[prost(string, optional, tag = "16")]
    pub writingprogram: Option<String>,
    /// Data source attribution.
    #[prost(string, optional, tag = "17")]
    pub source: Option<String>,
}

/// Bounding box in nanodegrees.
#[derive(Clone, PartialEq, prost::Message)]
pub struct HeaderBBox {
    /// Western edge.
    #[prost(sint64, required, tag = "1")]
    pub left: i64,
    /// Eastern edge.
    #[prost(sint64, required, tag = "2")]
    pub right: i64,
    /// Northern edge.
    #[prost(sint64, required, tag = "3")]
    pub top: i64,
    /// Southern edge.
    #[prost(sint64, required, tag = "4")]
    pub bottom: i64,
}

/// A batch of map elements sharing one string table.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PrimitiveBlock {
    /// Strings referenced by index from the groups.
    #[prost(message, optional, tag = "1")]
    pub stringtable: Option<StringTable>,
    /// Element groups.
    #[prost(message, repeated, tag = "2")]
    pub primitivegroup: Vec<PrimitiveGroup>,
    /// Coordinate granularity in nanodegrees, 100 when absent.
    #[prost(int32, optional, tag = "17")]
    pub granularity: Option<i32>,
    /// Timestamp granularity in milliseconds.
    #[prost(int32, optional, tag = "18")]
    pub date_granularity: Option<i32>,
    /// Latitude offset in nanodegrees.
    #[prost(int64, optional, tag = "19")]
    pub lat_offset: Option<i64>,
    /// Longitude offset in nanodegrees.
    #[prost(int64, optional, tag = "20")]
    pub lon_offset: Option<i64>,
}

/// Elements of one kind within a block.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PrimitiveGroup {
    /// Plain nodes.
    #[prost(message, repeated, tag = "1")]
    pub nodes: Vec<Node>,
    /// Dense nodes.
    #[prost(message, optional, tag = "2")]
    pub dense: Option<DenseNodes>,
    /// Ways.
    #[prost(message, repeated, tag = "3")]
    pub ways: Vec<Way>,
    /// Relations.
    #[prost(message, repeated, tag = "4")]
    pub relations: Vec<Relation>,
}

/// Raw UTF-8 (usually) strings.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StringTable {
    /// Entries; index 0 is reserved as the dense-tag delimiter.
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub s: Vec<Vec<u8>>,
}

/// A node with explicit fields.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Node {
    /// Node id.
    #[prost(sint64, required, tag = "1")]
    pub id: i64,
    /// Tag key indices.
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub keys: Vec<u32>,
    /// Tag value indices.
    #[prost(uint32, repeated, packed = "true", tag = "3")]
    pub vals: Vec<u32>,
    /// Latitude in granularity units.
    #[prost(sint64, required, tag = "8")]
    pub lat: i64,
    /// Longitude in granularity units.
    #[prost(sint64, required, tag = "9")]
    pub lon: i64,
}

/// Column-oriented, delta-encoded nodes.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DenseNodes {
    /// Id deltas.
    #[prost(sint64, repeated, packed = "true", tag = "1")]
    pub id: Vec<i64>,
    /// Latitude deltas.
    #[prost(sint64, repeated, packed = "true", tag = "8")]
    pub lat: Vec<i64>,
    /// Longitude deltas.
    #[prost(sint64, repeated, packed = "true", tag = "9")]
    pub lon: Vec<i64>,
    /// Key/value index pairs, each node's list terminated by `0`.
    #[prost(int32, repeated, packed = "true", tag = "10")]
    pub keys_vals: Vec<i32>,
}

/// A way.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Way {
    /// Way id.
    #[prost(int64, required, tag = "1")]
    pub id: i64,
    /// Tag key indices.
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub keys: Vec<u32>,
    /// Tag value indices.
    #[prost(uint32, repeated, packed = "true", tag = "3")]
    pub vals: Vec<u32>,
    /// Node reference deltas.
    #[prost(sint64, repeated, packed = "true", tag = "8")]
    pub refs: Vec<i64>,
}

/// A relation; only its tags are used.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Relation {
    /// Relation id.
    #[prost(int64, required, tag = "1")]
    pub id: i64,
    /// Tag key indices.
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub keys: Vec<u32>,
    /// Tag value indices.
    #[prost(uint32, repeated, packed = "true", tag = "3")]
    pub vals: Vec<u32>,
}
