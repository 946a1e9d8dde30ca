//! Unit tests for the MBTiles store.

use super::*;
use crate::ErrorKind;
use camino::Utf8PathBuf;
use geo::{Coord, Rect};
use rstest::{fixture, rstest};
use rusqlite::Connection;
use tempfile::TempDir;
use tilepress_core::{DatasetHeader, GeometryKind, MetadataAggregator, TileCoord};

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn store_path(dir: &TempDir, relative: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(relative)).expect("utf-8 temp path")
}

fn row_value<'a>(rows: &'a [MetadataRow], name: &str) -> Option<&'a str> {
    rows.iter()
        .find(|row| row.name == name)
        .map(|row| row.value.as_str())
}

#[rstest]
fn open_creates_parent_directories(temp_dir: TempDir) {
    let path = store_path(&temp_dir, "nested/deeper/out.mbtiles");

    let store = TileStore::open(&path).expect("open store");

    assert_eq!(store.path(), path.as_path());
    assert!(path.as_std_path().is_file());
}

#[rstest]
fn repeated_tile_writes_upsert(temp_dir: TempDir) -> Result<(), PersistTilesError> {
    let path = store_path(&temp_dir, "tiles.mbtiles");
    let coord = TileCoord::new(3, 2, 1);
    let mut store = TileStore::open(&path)?;

    for data in [vec![1_u8], vec![2_u8, 2]] {
        let mut writer = store.writer()?;
        writer.put_tile(&OutputTile { coord, data })?;
        writer.put_metadata(&[MetadataRow::new("name", "first")])?;
        writer.put_metadata(&[MetadataRow::new("name", "second")])?;
        writer.commit()?;
    }

    assert_eq!(store.tile_count()?, 1);
    assert_eq!(store.tile(coord)?, Some(vec![2, 2]));
    assert_eq!(store.metadata("name")?.as_deref(), Some("second"));
    Ok(())
}

#[rstest]
fn tile_rows_are_stored_in_tms_order(temp_dir: TempDir) -> Result<(), PersistTilesError> {
    let path = store_path(&temp_dir, "tms.mbtiles");
    let mut store = TileStore::open(&path)?;
    let mut writer = store.writer()?;
    writer.put_tile(&OutputTile {
        coord: TileCoord::new(2, 1, 0),
        data: vec![7],
    })?;
    assert_eq!(writer.tiles_written(), 1);
    writer.commit()?;
    drop(store);

    let connection = Connection::open(path.as_std_path()).expect("reopen database");
    let (column, row): (i64, i64) = connection
        .query_row(
            "SELECT tile_column, tile_row FROM tiles WHERE zoom_level = 2",
            [],
            |found| Ok((found.get(0)?, found.get(1)?)),
        )
        .expect("read stored tile");
    assert_eq!((column, row), (1, 3));
    Ok(())
}

#[rstest]
fn out_of_grid_tiles_are_rejected(temp_dir: TempDir) {
    let path = store_path(&temp_dir, "invalid.mbtiles");
    let mut store = TileStore::open(&path).expect("open store");
    let mut writer = store.writer().expect("begin writing");

    let err = writer
        .put_tile(&OutputTile {
            coord: TileCoord::new(1, 2, 0),
            data: Vec::new(),
        })
        .expect_err("column 2 does not exist at zoom 1");

    assert!(matches!(err, PersistTilesError::CoordinateOutOfRange { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn dropped_writer_rolls_back(temp_dir: TempDir) -> Result<(), PersistTilesError> {
    let path = store_path(&temp_dir, "rollback.mbtiles");
    let mut store = TileStore::open(&path)?;
    {
        let mut writer = store.writer()?;
        writer.put_tile(&OutputTile {
            coord: TileCoord::new(0, 0, 0),
            data: vec![1],
        })?;
    }

    assert_eq!(store.tile_count()?, 0);
    Ok(())
}

#[rstest]
fn metadata_rows_use_header_bounds() {
    let header = DatasetHeader {
        name: Some("Berlin".to_owned()),
        writing_program: Some("osmium/1.16".to_owned()),
        source: None,
        bbox: Some(Rect::new(
            Coord { x: 13.0, y: 52.0 },
            Coord { x: 14.0, y: 53.0 },
        )),
    };
    let mut stats = MetadataAggregator::new();
    stats.observe("nodes", GeometryKind::Point, [("name", "Cafe")]);

    let extent = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
    let rows = build_metadata_rows(&header, Some(extent), &stats.finalize()).expect("build rows");

    assert_eq!(row_value(&rows, "name"), Some("Berlin"));
    assert_eq!(row_value(&rows, "version"), Some("1.3"));
    assert_eq!(row_value(&rows, "format"), Some("pbf"));
    assert_eq!(row_value(&rows, "type"), Some("overlay"));
    assert_eq!(row_value(&rows, "minzoom"), Some("0"));
    assert_eq!(row_value(&rows, "maxzoom"), Some("14"));
    assert_eq!(
        row_value(&rows, "bounds"),
        Some("13.000000,52.000000,14.000000,53.000000")
    );
    assert_eq!(row_value(&rows, "center"), Some("13.500000,52.500000,10"));
    assert_eq!(row_value(&rows, "writingprogram"), Some("osmium/1.16"));
    assert_eq!(row_value(&rows, "source"), None);
    let json = row_value(&rows, "json").expect("json row");
    assert!(json.contains("\"vector_layers\""));
}

#[rstest]
fn metadata_bounds_fall_back_to_node_extent() {
    let extent = Rect::new(
        Coord { x: -0.5, y: 51.25 },
        Coord { x: 0.5, y: 51.75 },
    );

    let rows = build_metadata_rows(
        &DatasetHeader::default(),
        Some(extent),
        &MetadataAggregator::new().finalize(),
    )
    .expect("build rows");

    assert_eq!(
        row_value(&rows, "bounds"),
        Some("-0.500000,51.250000,0.500000,51.750000")
    );
    assert_eq!(row_value(&rows, "center"), Some("0.000000,51.500000,10"));
}
