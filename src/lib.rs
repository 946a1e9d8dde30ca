//! Facade crate for tilepress, an OSM PBF to MBTiles converter.
//!
//! This crate re-exports the tiling pipeline types and, behind the
//! `store-mbtiles` feature, the PBF decoder, MBTiles store and the
//! `convert` entry point.

#![forbid(unsafe_code)]

pub use tilepress_core::{
    DatasetHeader, FeatureCache, MAX_ZOOM, MIN_ZOOM, MetadataAggregator, PointFeature,
    ResolvedFeatures, Tags, TileCell, TileCompression, TileCoord, TileIndexer, TileJson,
    VectorTileEncoder, WayFeature,
};

#[cfg(feature = "store-mbtiles")]
pub use tilepress_data::{
    ConvertError, ConvertOptions, ConvertReport, ErrorKind, SourceFormat, convert,
    default_output_path,
};

#[cfg(feature = "store-mbtiles")]
pub use tilepress_data::{mbtiles, pbf};
