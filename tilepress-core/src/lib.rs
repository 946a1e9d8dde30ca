//! Domain model and tiling pipeline for tilepress.
//!
//! This crate holds everything that does not touch files or databases:
//! decoded OSM features and the cache that resolves way geometry, the
//! per-layer statistics behind the MBTiles `json` metadata row, Web-Mercator
//! tile math, the per-zoom indexer and the Mapbox Vector Tile encoder.
//!
//! The pipeline runs in two phases. While input is decoded, features flow into
//! a mutable [`FeatureCache`] and a [`MetadataAggregator`]. Once decoding is
//! complete, [`FeatureCache::resolve_geometry`] consumes the cache and yields
//! an immutable [`ResolvedFeatures`], which [`TileIndexer`] and
//! [`VectorTileEncoder`] read from, one zoom level per thread if desired.
#![forbid(unsafe_code)]

mod cache;
mod encode;
mod feature;
mod header;
mod index;
pub mod mvt;
mod stats;
pub mod tile;

pub use cache::{FeatureCache, ResolvedFeatures};
pub use encode::{
    EncodeError, LINES_LAYER, POINTS_LAYER, ParseCompressionError, SIMPLIFY_TOLERANCE,
    TILE_EXTENT, TileCompression, VectorTileEncoder,
};
pub use feature::{PointFeature, Tags, WayFeature};
pub use header::{DEFAULT_DATASET_NAME, DatasetHeader};
pub use index::{TileCell, TileIndexer};
pub use stats::{
    AttributeStat, DENSE_NODES_LAYER, FieldType, GeometryKind, LayerStat, MetadataAggregator,
    NODES_LAYER, RELATIONS_LAYER, TileJson, TileStats, VectorLayer, WAYS_LAYER,
};
pub use tile::{MAX_ZOOM, MIN_ZOOM, TileCoord};
