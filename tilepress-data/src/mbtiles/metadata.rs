//! Rows of the MBTiles `metadata` table.

use geo::Rect;
use tilepress_core::{DatasetHeader, MAX_ZOOM, MIN_ZOOM, TileJson};

use super::error::PersistTilesError;

/// MBTiles specification version written to the `version` row.
pub const MBTILES_VERSION: &str = "1.3";
/// Zoom level appended to the `center` row.
pub const CENTER_ZOOM: u8 = 10;

/// One `name`/`value` pair of the `metadata` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    /// Row key, unique within the table.
    pub name: String,
    /// Row value.
    pub value: String,
}

impl MetadataRow {
    /// Construct a row.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Metadata rows describing a converted dataset.
///
/// `bounds` and `center` come from the header's bounding box, or from
/// `node_extent` when the header declares none; with neither they are
/// omitted.
///
/// # Examples
/// ```
/// use tilepress_core::{DatasetHeader, MetadataAggregator};
/// use tilepress_data::mbtiles::build_metadata_rows;
///
/// let rows = build_metadata_rows(
///     &DatasetHeader::default(),
///     None,
///     &MetadataAggregator::new().finalize(),
/// )
/// .expect("build rows");
/// let name = rows.iter().find(|row| row.name == "name").expect("name row");
/// assert_eq!(name.value, "OSM Data");
/// assert!(rows.iter().all(|row| row.name != "bounds"));
/// ```
pub fn build_metadata_rows(
    header: &DatasetHeader,
    node_extent: Option<Rect<f64>>,
    tilejson: &TileJson,
) -> Result<Vec<MetadataRow>, PersistTilesError> {
    let mut rows = vec![
        MetadataRow::new("name", header.display_name()),
        MetadataRow::new("version", MBTILES_VERSION),
        MetadataRow::new("format", "pbf"),
        MetadataRow::new("type", "overlay"),
        MetadataRow::new("minzoom", MIN_ZOOM.to_string()),
        MetadataRow::new("maxzoom", MAX_ZOOM.to_string()),
    ];

    if let Some(bounds) = header.bbox.or(node_extent) {
        rows.push(MetadataRow::new("bounds", format_bounds(bounds)));
        rows.push(MetadataRow::new("center", format_center(bounds)));
    }
    if let Some(program) = &header.writing_program {
        rows.push(MetadataRow::new("writingprogram", program.as_str()));
    }
    if let Some(source) = &header.source {
        rows.push(MetadataRow::new("source", source.as_str()));
    }

    let json = tilejson
        .to_json()
        .map_err(|source| PersistTilesError::SerializeMetadata { source })?;
    rows.push(MetadataRow::new("json", json));
    Ok(rows)
}

fn format_bounds(bounds: Rect<f64>) -> String {
    let (min, max) = (bounds.min(), bounds.max());
    format!("{:.6},{:.6},{:.6},{:.6}", min.x, min.y, max.x, max.y)
}

fn format_center(bounds: Rect<f64>) -> String {
    let center = bounds.center();
    format!("{:.6},{:.6},{CENTER_ZOOM}", center.x, center.y)
}
