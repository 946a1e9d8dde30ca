//! Mapbox Vector Tile 2.1 wire messages.
//!
//! Hand-declared `prost` messages covering the subset of `vector_tile.proto`
//! the encoder writes. `Value` omits the float, double, int and uint fields,
//! so decoding a foreign tile drops such values as unknown fields.

/// A whole tile: an ordered list of layers.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Tile {
    /// Layers in the tile.
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}

/// A named layer with its own key and value tables.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Layer {
    /// Layer format version, always 2.
    #[prost(uint32, required, tag = "15")]
    pub version: u32,
    /// Layer name.
    #[prost(string, required, tag = "1")]
    pub name: String,
    /// Features in the layer.
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    /// Deduplicated property keys.
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    /// Deduplicated property values.
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    /// Tile-local coordinate extent.
    #[prost(uint32, optional, tag = "5")]
    pub extent: Option<u32>,
}

/// One encoded geometry with its properties.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Feature {
    /// Optional feature identifier.
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    /// Alternating key/value indices into the layer tables.
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub tags: Vec<u32>,
    /// Geometry family.
    #[prost(enumeration = "GeomType", optional, tag = "3")]
    pub r#type: Option<i32>,
    /// Command-encoded geometry.
    #[prost(uint32, repeated, packed = "true", tag = "4")]
    pub geometry: Vec<u32>,
}

/// A typed property value; exactly one field is set.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Value {
    /// UTF-8 string.
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    /// Signed integer with zigzag encoding.
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    /// Boolean.
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}

/// Geometry family of a [`Feature`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum GeomType {
    /// Unspecified.
    Unknown = 0,
    /// Point or multipoint.
    Point = 1,
    /// Line or multiline.
    Linestring = 2,
    /// Polygon or multipolygon.
    Polygon = 3,
}
