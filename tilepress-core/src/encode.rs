//! Mapbox Vector Tile encoding of indexed tile cells.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use flate2::{Compression, write::GzEncoder};
use geo::{Coord, LineString, Simplify};
use prost::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::Tags;
use crate::index::TileCell;
use crate::mvt;
use crate::tile::TileCoord;

/// Tile-local coordinate extent written into every layer.
pub const TILE_EXTENT: u32 = 4096;
/// Ramer-Douglas-Peucker tolerance in tile units.
pub const SIMPLIFY_TOLERANCE: f64 = 1.0;
/// Layer holding node features.
pub const POINTS_LAYER: &str = "points";
/// Layer holding way features.
pub const LINES_LAYER: &str = "lines";

const MVT_VERSION: u32 = 2;
const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;

/// Post-encoding compression applied to tile blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileCompression {
    /// Gzip, the MBTiles convention for `format=pbf`.
    #[default]
    Gzip,
    /// Store the raw protobuf bytes.
    None,
}

impl TileCompression {
    /// Lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::None => "none",
        }
    }
}

impl fmt::Display for TileCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a compression name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tile compression {0:?}; expected gzip or none")]
pub struct ParseCompressionError(pub String);

impl FromStr for TileCompression {
    type Err = ParseCompressionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "gzip" => Ok(Self::Gzip),
            "none" => Ok(Self::None),
            _ => Err(ParseCompressionError(value.to_owned())),
        }
    }
}

/// Errors raised while encoding a tile.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Gzip compression of the tile body failed.
    #[error("failed to compress tile {tile}")]
    Compress {
        /// Tile being encoded.
        tile: TileCoord,
        /// Underlying I/O error from the compressor.
        #[source]
        source: io::Error,
    },
}

/// Turns tile cells into MVT blobs.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use tilepress_core::{
///     FeatureCache, PointFeature, Tags, TileCompression, TileIndexer, VectorTileEncoder,
/// };
///
/// let mut cache = FeatureCache::new();
/// cache.put(PointFeature::new(1, Coord { x: 0.5, y: 0.5 }, Tags::new()));
/// let resolved = cache.resolve_geometry();
/// let cells = TileIndexer::new(&resolved).index_zoom(3);
///
/// let encoder = VectorTileEncoder::new(TileCompression::None);
/// let blob = encoder.encode(&cells[0]).expect("encode").expect("non-empty tile");
/// assert!(!blob.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorTileEncoder {
    extent: u32,
    tolerance: f64,
    compression: TileCompression,
}

impl Default for VectorTileEncoder {
    fn default() -> Self {
        Self::new(TileCompression::default())
    }
}

impl VectorTileEncoder {
    /// Encoder with the standard extent and tolerance.
    #[must_use]
    pub const fn new(compression: TileCompression) -> Self {
        Self {
            extent: TILE_EXTENT,
            tolerance: SIMPLIFY_TOLERANCE,
            compression,
        }
    }

    /// Compression applied to encoded tiles.
    #[must_use]
    pub const fn compression(&self) -> TileCompression {
        self.compression
    }

    /// Encode `cell`, returning `None` when no layer has any feature.
    pub fn encode(&self, cell: &TileCell<'_>) -> Result<Option<Vec<u8>>, EncodeError> {
        let tile = self.build_tile(cell);
        if tile.layers.is_empty() {
            return Ok(None);
        }
        let raw = tile.encode_to_vec();
        match self.compression {
            TileCompression::None => Ok(Some(raw)),
            TileCompression::Gzip => gzip(&raw)
                .map(Some)
                .map_err(|source| EncodeError::Compress {
                    tile: cell.coord,
                    source,
                }),
        }
    }

    /// Build the uncompressed tile message for `cell`.
    #[must_use]
    pub fn build_tile(&self, cell: &TileCell<'_>) -> mvt::Tile {
        let mut points = LayerBuilder::new(POINTS_LAYER);
        for point in &cell.points {
            let local = round_coord(cell.coord.project(point.location, self.extent));
            points.push(
                point.id,
                mvt::GeomType::Point,
                encode_point(local),
                "node",
                &point.tags,
            );
        }

        let mut lines = LayerBuilder::new(LINES_LAYER);
        for way in &cell.ways {
            let Some(vertices) = self.line_vertices(cell.coord, &way.points) else {
                continue;
            };
            lines.push(
                way.id,
                mvt::GeomType::Linestring,
                encode_line(&vertices),
                "way",
                &way.tags,
            );
        }

        mvt::Tile {
            layers: [points, lines]
                .into_iter()
                .filter_map(|layer| layer.finish(self.extent))
                .collect(),
        }
    }

    /// Project, simplify, round and deduplicate a way's vertices.
    ///
    /// Returns `None` when fewer than two distinct vertices survive.
    fn line_vertices(&self, tile: TileCoord, points: &[Coord<f64>]) -> Option<Vec<Coord<i32>>> {
        if points.len() < 2 {
            return None;
        }
        let projected: LineString<f64> = points
            .iter()
            .map(|point| tile.project(*point, self.extent))
            .collect();
        let simplified = projected.simplify(self.tolerance);

        let mut vertices: Vec<Coord<i32>> = Vec::with_capacity(simplified.0.len());
        for coord in simplified.0 {
            let rounded = round_coord(coord);
            if vertices.last() != Some(&rounded) {
                vertices.push(rounded);
            }
        }
        (vertices.len() >= 2).then_some(vertices)
    }
}

/// Feature list plus deduplicated key/value tables for one layer.
struct LayerBuilder {
    name: &'static str,
    features: Vec<mvt::Feature>,
    keys: Vec<String>,
    key_index: HashMap<String, u32>,
    values: Vec<mvt::Value>,
    value_index: HashMap<mvt::Value, u32>,
}

impl LayerBuilder {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            features: Vec::new(),
            keys: Vec::new(),
            key_index: HashMap::new(),
            values: Vec::new(),
            value_index: HashMap::new(),
        }
    }

    /// Append a feature carrying `id`, `type` and every tag.
    ///
    /// Tags named `id` or `type` are shadowed by the synthetic properties.
    fn push(
        &mut self,
        id: i64,
        geom_type: mvt::GeomType,
        geometry: Vec<u32>,
        kind: &str,
        tags: &Tags,
    ) {
        let mut encoded_tags = Vec::with_capacity(4 + tags.len() * 2);
        encoded_tags.push(self.key("id"));
        encoded_tags.push(self.value(mvt::Value {
            sint_value: Some(id),
            ..mvt::Value::default()
        }));
        encoded_tags.push(self.key("type"));
        encoded_tags.push(self.value(string_value(kind)));
        for (key, value) in tags {
            if key == "id" || key == "type" {
                continue;
            }
            encoded_tags.push(self.key(key));
            encoded_tags.push(self.value(string_value(value)));
        }

        self.features.push(mvt::Feature {
            id: u64::try_from(id).ok(),
            tags: encoded_tags,
            r#type: Some(geom_type.into()),
            geometry,
        });
    }

    fn key(&mut self, key: &str) -> u32 {
        if let Some(index) = self.key_index.get(key) {
            return *index;
        }
        let index = table_index(self.keys.len());
        self.key_index.insert(key.to_owned(), index);
        self.keys.push(key.to_owned());
        index
    }

    fn value(&mut self, value: mvt::Value) -> u32 {
        if let Some(index) = self.value_index.get(&value) {
            return *index;
        }
        let index = table_index(self.values.len());
        self.value_index.insert(value.clone(), index);
        self.values.push(value);
        index
    }

    fn finish(self, extent: u32) -> Option<mvt::Layer> {
        if self.features.is_empty() {
            return None;
        }
        Some(mvt::Layer {
            version: MVT_VERSION,
            name: self.name.to_owned(),
            features: self.features,
            keys: self.keys,
            values: self.values,
            extent: Some(extent),
        })
    }
}

fn string_value(value: &str) -> mvt::Value {
    mvt::Value {
        string_value: Some(value.to_owned()),
        ..mvt::Value::default()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "layer tables are bounded by the features of a single tile"
)]
const fn table_index(len: usize) -> u32 {
    len as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "tile-local positions stay within 4096 * 2^14 of the origin"
)]
fn round_coord(coord: Coord<f64>) -> Coord<i32> {
    Coord {
        x: coord.x.round() as i32,
        y: coord.y.round() as i32,
    }
}

const fn command(id: u32, count: usize) -> u32 {
    (table_index(count) << 3) | (id & 0x7)
}

const fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)).cast_unsigned()
}

fn encode_point(point: Coord<i32>) -> Vec<u32> {
    vec![command(CMD_MOVE_TO, 1), zigzag(point.x), zigzag(point.y)]
}

fn encode_line(vertices: &[Coord<i32>]) -> Vec<u32> {
    let mut geometry = Vec::with_capacity(2 + vertices.len() * 2);
    let mut cursor = Coord { x: 0, y: 0 };
    for (index, vertex) in vertices.iter().enumerate() {
        match index {
            0 => geometry.push(command(CMD_MOVE_TO, 1)),
            1 => geometry.push(command(CMD_LINE_TO, vertices.len() - 1)),
            _ => {}
        }
        geometry.push(zigzag(vertex.x - cursor.x));
        geometry.push(zigzag(vertex.y - cursor.y));
        cursor = *vertex;
    }
    geometry
}

fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}
