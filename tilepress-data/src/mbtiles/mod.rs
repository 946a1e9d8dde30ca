//! MBTiles output: a SQLite file holding a tile pyramid and its metadata.
//!
//! - `schema` creates the `metadata` and `tiles` tables.
//! - `metadata` derives the metadata rows for a converted dataset.
//! - `store` upserts rows inside a single transaction.
//!
//! Tile rows are stored in TMS order, counted from the south, as MBTiles 1.3
//! requires.
#![forbid(unsafe_code)]

mod error;
mod metadata;
mod schema;
mod store;

pub use error::PersistTilesError;
pub use metadata::{CENTER_ZOOM, MBTILES_VERSION, MetadataRow, build_metadata_rows};
pub use schema::{MBTILES_APPLICATION_ID, initialise_schema};
pub use store::{OutputTile, TileStore, TileWriter};

#[cfg(test)]
mod tests;
