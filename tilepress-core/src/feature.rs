use std::collections::BTreeMap;

use geo::Coord;

/// Free-form OpenStreetMap tags, ordered by key.
pub type Tags = BTreeMap<String, String>;

/// A decoded map node.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use tilepress_core::{PointFeature, Tags};
///
/// let point = PointFeature::new(
///     7,
///     Coord { x: 13.4, y: 52.5 },
///     Tags::from([("amenity".into(), "cafe".into())]),
/// );
///
/// assert_eq!(point.id, 7);
/// assert_eq!(point.tags.get("amenity").map(String::as_str), Some("cafe"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    /// OSM node identifier.
    pub id: i64,
    /// Decoded position.
    pub location: Coord<f64>,
    /// Node tags.
    pub tags: Tags,
}

impl PointFeature {
    /// Construct a `PointFeature`.
    #[must_use]
    pub const fn new(id: i64, location: Coord<f64>, tags: Tags) -> Self {
        Self { id, location, tags }
    }
}

/// A decoded map way.
///
/// `points` stays empty until the owning cache resolves node references;
/// references to unknown nodes are skipped, so `points` may be shorter than
/// `node_refs`.
#[derive(Debug, Clone, PartialEq)]
pub struct WayFeature {
    /// OSM way identifier.
    pub id: i64,
    /// Ordered node identifiers making up the way.
    pub node_refs: Vec<i64>,
    /// Way tags.
    pub tags: Tags,
    /// Resolved vertex positions in reference order.
    pub points: Vec<Coord<f64>>,
}

impl WayFeature {
    /// Construct an unresolved `WayFeature`.
    #[must_use]
    pub const fn new(id: i64, node_refs: Vec<i64>, tags: Tags) -> Self {
        Self {
            id,
            node_refs,
            tags,
            points: Vec::new(),
        }
    }

    /// Whether enough vertices resolved to draw a line.
    #[must_use]
    pub const fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}
