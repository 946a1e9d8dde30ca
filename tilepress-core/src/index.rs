//! Binning of resolved features into the tile grid, one zoom at a time.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::cache::ResolvedFeatures;
use crate::feature::{PointFeature, WayFeature};
use crate::tile::TileCoord;

/// Features that fall inside one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCell<'a> {
    /// Tile address.
    pub coord: TileCoord,
    /// Nodes located in the tile.
    pub points: Vec<&'a PointFeature>,
    /// Drawable ways with at least one vertex in the tile.
    pub ways: Vec<&'a WayFeature>,
}

impl TileCell<'_> {
    const fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            points: Vec::new(),
            ways: Vec::new(),
        }
    }
}

/// Assigns frozen features to tiles.
///
/// The indexer only borrows the features, so one instance can be shared by
/// threads indexing different zoom levels.
#[derive(Debug, Clone, Copy)]
pub struct TileIndexer<'a> {
    features: &'a ResolvedFeatures,
}

impl<'a> TileIndexer<'a> {
    /// Create an indexer over `features`.
    #[must_use]
    pub const fn new(features: &'a ResolvedFeatures) -> Self {
        Self { features }
    }

    /// Build every non-empty cell at `zoom`, ordered by tile address.
    ///
    /// A node lands in the tile containing it. A way lands in every tile whose
    /// box holds at least one of its vertices, edges inclusive, so a vertex on
    /// a shared edge places the way in both neighbours.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use tilepress_core::{FeatureCache, PointFeature, Tags, TileIndexer};
    ///
    /// let mut cache = FeatureCache::new();
    /// cache.put(PointFeature::new(1, Coord { x: 0.5, y: 0.5 }, Tags::new()));
    /// let resolved = cache.resolve_geometry();
    ///
    /// let cells = TileIndexer::new(&resolved).index_zoom(0);
    /// assert_eq!(cells.len(), 1);
    /// assert_eq!(cells[0].points.len(), 1);
    /// ```
    #[must_use]
    pub fn index_zoom(&self, zoom: u8) -> Vec<TileCell<'a>> {
        let mut cells: BTreeMap<TileCoord, TileCell<'a>> = BTreeMap::new();

        for point in self.features.points() {
            let coord = TileCoord::containing(point.location, zoom);
            cells
                .entry(coord)
                .or_insert_with(|| TileCell::new(coord))
                .points
                .push(point);
        }

        let mut touched = BTreeSet::new();
        for way in self.features.drawable_ways() {
            touched.clear();
            for vertex in &way.points {
                touched.extend(
                    TileCoord::containing(*vertex, zoom)
                        .with_neighbours()
                        .filter(|candidate| candidate.contains(*vertex)),
                );
            }
            for coord in &touched {
                cells
                    .entry(*coord)
                    .or_insert_with(|| TileCell::new(*coord))
                    .ways
                    .push(way);
            }
        }

        debug!("zoom {zoom}: {} populated tiles", cells.len());
        cells.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FeatureCache;
    use crate::feature::Tags;
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn resolved() -> ResolvedFeatures {
        let mut cache = FeatureCache::new();
        cache.put(PointFeature::new(1, Coord { x: -10.0, y: 10.0 }, Tags::new()));
        cache.put(PointFeature::new(2, Coord { x: 10.0, y: 10.0 }, Tags::new()));
        cache.put(PointFeature::new(3, Coord { x: 10.0, y: -10.0 }, Tags::new()));
        cache.append(WayFeature::new(20, vec![1, 2], Tags::new()));
        cache.append(WayFeature::new(21, vec![3, 404], Tags::new()));
        cache.resolve_geometry()
    }

    #[rstest]
    fn zoom_zero_holds_everything_in_one_cell(resolved: ResolvedFeatures) {
        let cells = TileIndexer::new(&resolved).index_zoom(0);

        assert_eq!(cells.len(), 1);
        let cell = cells.first().expect("one cell");
        assert_eq!(cell.points.len(), 3);
        assert_eq!(cell.ways.len(), 1, "only the drawable way is indexed");
    }

    #[rstest]
    fn way_spans_every_tile_holding_a_vertex(resolved: ResolvedFeatures) {
        let cells = TileIndexer::new(&resolved).index_zoom(1);

        let with_way: Vec<_> = cells
            .iter()
            .filter(|cell| cell.ways.iter().any(|way| way.id == 20))
            .map(|cell| cell.coord)
            .collect();
        assert_eq!(
            with_way,
            vec![TileCoord::new(1, 0, 0), TileCoord::new(1, 1, 0)]
        );
    }

    #[rstest]
    fn empty_cells_are_not_emitted(resolved: ResolvedFeatures) {
        for zoom in 0..=6 {
            for cell in TileIndexer::new(&resolved).index_zoom(zoom) {
                assert!(!cell.points.is_empty() || !cell.ways.is_empty());
            }
        }
    }

    #[rstest]
    fn vertex_on_shared_edge_lands_in_both_tiles() {
        let mut cache = FeatureCache::new();
        cache.put(PointFeature::new(1, Coord { x: 0.0, y: 20.0 }, Tags::new()));
        cache.put(PointFeature::new(2, Coord { x: 5.0, y: 20.0 }, Tags::new()));
        cache.append(WayFeature::new(30, vec![1, 2], Tags::new()));
        let resolved = cache.resolve_geometry();

        let way_tiles: Vec<_> = TileIndexer::new(&resolved)
            .index_zoom(1)
            .into_iter()
            .filter(|cell| !cell.ways.is_empty())
            .map(|cell| cell.coord)
            .collect();

        assert_eq!(
            way_tiles,
            vec![TileCoord::new(1, 0, 0), TileCoord::new(1, 1, 0)]
        );
    }
}
