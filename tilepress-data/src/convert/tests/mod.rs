//! Unit tests for the conversion pipeline.

mod behaviour;

use super::*;
use crate::mbtiles::TileStore;
use crate::test_support::{
    PbfBuilder, SAMPLE_TILE, sample_extract, sample_header, sample_primitives,
};
use prost::Message;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tilepress_core::{LINES_LAYER, POINTS_LAYER, TileCoord, mvt};

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn utf8_path(dir: &TempDir, relative: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(relative)).expect("utf-8 temp path")
}

fn write_sample(dir: &TempDir) -> Utf8PathBuf {
    let path = utf8_path(dir, "sample.osm.pbf");
    let bytes = sample_extract().expect("build sample extract");
    std::fs::write(path.as_std_path(), bytes).expect("write sample extract");
    path
}

fn uncompressed() -> ConvertOptions {
    ConvertOptions {
        output: None,
        compression: TileCompression::None,
    }
}

fn layer<'a>(tile: &'a mvt::Tile, name: &str) -> Option<&'a mvt::Layer> {
    tile.layers.iter().find(|layer| layer.name == name)
}

#[rstest]
#[case("berlin.osm.pbf", "berlin.mbtiles")]
#[case("data/Berlin.OSM.PBF", "data/Berlin.mbtiles")]
fn default_output_replaces_the_input_suffix(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(
        default_output_path(Utf8Path::new(input)),
        Utf8PathBuf::from(expected)
    );
}

#[rstest]
fn rejects_inputs_that_are_not_pbf_extracts() {
    let err = convert(Utf8Path::new("tiles.mbtiles"), &ConvertOptions::default())
        .expect_err("mbtiles input rejected");

    assert!(matches!(
        err,
        ConvertError::UnsupportedFormat {
            format: SourceFormat::Mbtiles,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[rstest]
fn missing_input_is_an_input_error(temp_dir: TempDir) {
    let input = utf8_path(&temp_dir, "absent.osm.pbf");

    let err = convert(&input, &ConvertOptions::default()).expect_err("missing input");

    assert!(matches!(err, ConvertError::Open { .. }));
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(!utf8_path(&temp_dir, "absent.mbtiles").as_std_path().exists());
}

#[rstest]
fn truncated_input_aborts_before_writing(temp_dir: TempDir) {
    let input = utf8_path(&temp_dir, "cut.osm.pbf");
    let mut bytes = sample_extract().expect("build sample extract");
    bytes.truncate(bytes.len() - 3);
    std::fs::write(input.as_std_path(), bytes).expect("write truncated extract");

    let err = convert(&input, &ConvertOptions::default()).expect_err("truncated input");

    assert!(matches!(err, ConvertError::Read(BlobReadError::Truncated { .. })));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[rstest]
fn unknown_blob_type_aborts_before_writing(temp_dir: TempDir) {
    let input = utf8_path(&temp_dir, "odd.osm.pbf");
    let bytes = PbfBuilder::new()
        .header(&sample_header())
        .raw_blob("OSMBogus", b"not a block")
        .primitives(&sample_primitives())
        .build()
        .expect("build extract");
    std::fs::write(input.as_std_path(), bytes).expect("write extract");

    let err = convert(&input, &ConvertOptions::default()).expect_err("unknown blob type");

    match &err {
        ConvertError::Read(BlobReadError::UnknownBlobType { blob_type, .. }) => {
            assert_eq!(blob_type, "OSMBogus");
        }
        other => panic!("expected UnknownBlobType, found {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!utf8_path(&temp_dir, "odd.mbtiles").as_std_path().exists());
}

#[rstest]
fn converts_sample_extract(temp_dir: TempDir) -> Result<(), ConvertError> {
    let input = write_sample(&temp_dir);

    let report = convert(&input, &uncompressed())?;

    assert_eq!(report.output, utf8_path(&temp_dir, "sample.mbtiles"));
    assert_eq!((report.nodes, report.ways, report.relations), (3, 1, 1));
    assert_eq!(report.unresolved_refs, 0);
    assert!(
        report.tiles_written >= u64::from(MAX_ZOOM - MIN_ZOOM + 1),
        "every zoom level holds at least one tile"
    );

    let store = TileStore::open(&report.output)?;
    assert_eq!(store.tile_count()?, report.tiles_written);
    let bytes = store.tile(SAMPLE_TILE)?.expect("sample tile stored");
    let tile = mvt::Tile::decode(bytes.as_slice()).expect("decode vector tile");

    let points = layer(&tile, POINTS_LAYER).expect("points layer");
    assert_eq!(points.features.len(), 3);
    let lines = layer(&tile, LINES_LAYER).expect("lines layer");
    assert_eq!(lines.features.len(), 1);
    let line = lines.features.first().expect("line feature");
    // MoveTo(1) x y, LineTo(1) dx dy
    assert_eq!(line.geometry.len(), 6);
    Ok(())
}

#[rstest]
fn sample_metadata_describes_the_dataset(temp_dir: TempDir) -> Result<(), ConvertError> {
    let input = write_sample(&temp_dir);
    let report = convert(&input, &uncompressed())?;

    let store = TileStore::open(&report.output)?;
    assert_eq!(store.metadata("name")?.as_deref(), Some("OsmSchema-V0.6"));
    assert_eq!(
        store.metadata("bounds")?.as_deref(),
        Some("0.000000,0.000000,1.000000,1.000000")
    );
    assert_eq!(
        store.metadata("center")?.as_deref(),
        Some("0.500000,0.500000,10")
    );
    assert_eq!(
        store.metadata("writingprogram")?.as_deref(),
        Some("tilepress-tests")
    );
    let json = store.metadata("json")?.expect("json row");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(
        parsed.pointer("/tilestats/layerCount"),
        Some(&serde_json::Value::from(3))
    );
    Ok(())
}

#[rstest]
fn gzip_is_the_default_tile_compression(temp_dir: TempDir) -> Result<(), ConvertError> {
    let input = write_sample(&temp_dir);
    let output = utf8_path(&temp_dir, "out/gzip.mbtiles");

    let report = convert(
        &input,
        &ConvertOptions {
            output: Some(output.clone()),
            ..ConvertOptions::default()
        },
    )?;

    assert_eq!(report.output, output);
    let store = TileStore::open(&output)?;
    let bytes = store
        .tile(TileCoord::new(0, 0, 0))?
        .expect("world tile stored");
    assert_eq!(bytes.get(..2), Some([0x1f_u8, 0x8b].as_slice()));
    Ok(())
}

#[rstest]
fn rerunning_a_conversion_is_idempotent(temp_dir: TempDir) -> Result<(), ConvertError> {
    let input = write_sample(&temp_dir);

    let first = convert(&input, &uncompressed())?;
    let second = convert(&input, &uncompressed())?;

    let store = TileStore::open(&second.output)?;
    assert_eq!(store.tile_count()?, first.tiles_written);
    Ok(())
}
