//! Behavioural tests for whole-file conversion using rstest-bdd.

use super::super::{ConvertError, ConvertOptions, ConvertReport, convert};
use crate::ErrorKind;
use crate::mbtiles::TileStore;
use crate::pbf::proto::{BlobHeader, PrimitiveBlock};
use crate::test_support::{PbfBuilder, SAMPLE_TILE, sample_header, sample_primitives};
use camino::Utf8PathBuf;
use prost::Message;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rusqlite::Connection;
use std::cell::RefCell;
use tempfile::TempDir;
use tilepress_core::{LINES_LAYER, POINTS_LAYER, TileCompression, mvt};

#[fixture]
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[fixture]
pub fn input_path() -> RefCell<Option<Utf8PathBuf>> {
    RefCell::new(None)
}

#[fixture]
pub fn convert_result() -> RefCell<Option<Result<ConvertReport, ConvertError>>> {
    RefCell::new(None)
}

fn write_input(temp_dir: &TempDir, bytes: &[u8]) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("extract.osm.pbf"))
        .expect("utf-8 temp path");
    std::fs::write(path.as_std_path(), bytes).expect("write extract");
    path
}

fn extract_with(block: &PrimitiveBlock) -> Vec<u8> {
    PbfBuilder::new()
        .header(&sample_header())
        .primitives(block)
        .build()
        .expect("build extract")
}

fn report(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) -> ConvertReport {
    match convert_result.borrow().as_ref() {
        Some(Ok(report)) => report.clone(),
        Some(Err(err)) => panic!("expected success, got error: {err}"),
        None => panic!("conversion result must be recorded"),
    }
}

fn decode_tile(bytes: &[u8]) -> mvt::Tile {
    mvt::Tile::decode(bytes).expect("decode vector tile")
}

#[given("a PBF extract with three nodes and a footway")]
fn sample_extract(temp_dir: &TempDir, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let path = write_input(temp_dir, &extract_with(&sample_primitives()));
    *input_path.borrow_mut() = Some(path);
}

#[given("a PBF extract whose footway references a missing node")]
fn extract_with_missing_node(temp_dir: &TempDir, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let mut block = sample_primitives();
    let way = block
        .primitivegroup
        .iter_mut()
        .flat_map(|group| group.ways.iter_mut())
        .next()
        .expect("sample footway");
    // Node 1, then node 99, which is never defined.
    way.refs = vec![1, 98];
    let path = write_input(temp_dir, &extract_with(&block));
    *input_path.borrow_mut() = Some(path);
}

#[given("a PBF extract declaring a blob larger than 64 MiB")]
#[expect(clippy::big_endian_bytes, reason = "frames a length prefix by hand")]
fn extract_with_oversized_blob(temp_dir: &TempDir, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let header = BlobHeader {
        r#type: "OSMData".to_owned(),
        indexdata: None,
        datasize: 70_000_000,
    }
    .encode_to_vec();
    let mut bytes = u32::try_from(header.len())
        .expect("small header")
        .to_be_bytes()
        .to_vec();
    bytes.extend_from_slice(&header);
    let path = write_input(temp_dir, &bytes);
    *input_path.borrow_mut() = Some(path);
}

#[when("I convert the extract")]
fn convert_extract(
    input_path: &RefCell<Option<Utf8PathBuf>>,
    convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>,
) {
    let path = input_path
        .borrow()
        .as_ref()
        .cloned()
        .unwrap_or_else(|| panic!("input path must be initialised"));
    let options = ConvertOptions {
        output: None,
        compression: TileCompression::None,
    };
    *convert_result.borrow_mut() = Some(convert(&path, &options));
}

#[then("the conversion succeeds")]
fn conversion_succeeds(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) {
    let report = report(convert_result);
    assert!(report.output.as_std_path().is_file());
}

#[then("the zoom 12 tile holds three points and one line")]
fn sample_tile_contents(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) {
    let report = report(convert_result);
    let store = TileStore::open(&report.output).expect("reopen store");
    let bytes = store
        .tile(SAMPLE_TILE)
        .expect("read tile")
        .expect("sample tile stored");
    let tile = decode_tile(&bytes);

    let count = |name: &str| {
        tile.layers
            .iter()
            .find(|layer| layer.name == name)
            .map_or(0, |layer| layer.features.len())
    };
    assert_eq!(count(POINTS_LAYER), 3);
    assert_eq!(count(LINES_LAYER), 1);
}

#[then("the metadata bounds match the header bounding box")]
fn metadata_bounds(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) {
    let report = report(convert_result);
    let store = TileStore::open(&report.output).expect("reopen store");
    assert_eq!(
        store.metadata("bounds").expect("read bounds").as_deref(),
        Some("0.000000,0.000000,1.000000,1.000000")
    );
}

#[then("one way node reference is reported unresolved")]
fn unresolved_reference(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) {
    assert_eq!(report(convert_result).unresolved_refs, 1);
}

#[then("no tile holds a line")]
fn no_lines(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) {
    let report = report(convert_result);
    let connection = Connection::open(report.output.as_std_path()).expect("open output");
    let mut statement = connection
        .prepare("SELECT tile_data FROM tiles")
        .expect("prepare select");
    let tiles: Vec<Vec<u8>> = statement
        .query_map([], |row| row.get(0))
        .expect("query tiles")
        .collect::<Result<_, _>>()
        .expect("collect tiles");

    assert!(!tiles.is_empty());
    for bytes in &tiles {
        let tile = decode_tile(bytes);
        assert!(tile.layers.iter().all(|layer| layer.name != LINES_LAYER));
    }
}

#[then("the conversion fails with an input error")]
fn input_error(convert_result: &RefCell<Option<Result<ConvertReport, ConvertError>>>) {
    match convert_result.borrow().as_ref() {
        Some(Err(err)) => assert_eq!(err.kind(), ErrorKind::Input),
        Some(Ok(report)) => panic!("expected an input error, wrote {}", report.output),
        None => panic!("conversion result must be recorded"),
    }
}

#[scenario(path = "tests/features/convert_osm_pbf.feature", index = 0)]
fn converts_nodes_and_ways(
    temp_dir: TempDir,
    input_path: RefCell<Option<Utf8PathBuf>>,
    convert_result: RefCell<Option<Result<ConvertReport, ConvertError>>>,
) {
    let _ = (temp_dir, input_path, convert_result);
}

#[scenario(path = "tests/features/convert_osm_pbf.feature", index = 1)]
fn skips_unresolved_ways(
    temp_dir: TempDir,
    input_path: RefCell<Option<Utf8PathBuf>>,
    convert_result: RefCell<Option<Result<ConvertReport, ConvertError>>>,
) {
    let _ = (temp_dir, input_path, convert_result);
}

#[scenario(path = "tests/features/convert_osm_pbf.feature", index = 2)]
fn rejects_oversized_blobs(
    temp_dir: TempDir,
    input_path: RefCell<Option<Utf8PathBuf>>,
    convert_result: RefCell<Option<Result<ConvertReport, ConvertError>>>,
) {
    let _ = (temp_dir, input_path, convert_result);
}
