//! Per-layer feature counts and attribute type inference.
//!
//! The aggregator is fed every decoded primitive and produces the TileJSON
//! style `json` metadata document (`vector_layers` plus `tilestats`) once the
//! decode pass is complete.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::tile::{MAX_ZOOM, MIN_ZOOM};

/// Statistics layer for plain nodes.
pub const NODES_LAYER: &str = "nodes";
/// Statistics layer for dense-encoded nodes.
pub const DENSE_NODES_LAYER: &str = "dense_nodes";
/// Statistics layer for ways.
pub const WAYS_LAYER: &str = "ways";
/// Statistics layer for relations.
pub const RELATIONS_LAYER: &str = "relations";

/// Geometry family reported for a statistics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    /// Single positions.
    Point,
    /// Polylines.
    LineString,
    /// Mixed member collections.
    GeometryCollection,
}

/// Attribute type inferred from observed tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Every value parsed as a finite float.
    Number,
    /// Every value was one of `true`, `false`, `yes` or `no`.
    Boolean,
    /// Anything else, or a mix of types.
    String,
}

impl FieldType {
    /// Infer the type of a single tag value.
    ///
    /// # Examples
    /// ```
    /// use tilepress_core::FieldType;
    ///
    /// assert_eq!(FieldType::infer("7.5"), FieldType::Number);
    /// assert_eq!(FieldType::infer("yes"), FieldType::Boolean);
    /// assert_eq!(FieldType::infer("NaN"), FieldType::String);
    /// ```
    #[must_use]
    pub fn infer(value: &str) -> Self {
        if value.parse::<f64>().is_ok_and(f64::is_finite) {
            return Self::Number;
        }
        match value {
            "true" | "false" | "yes" | "no" => Self::Boolean,
            _ => Self::String,
        }
    }

    fn merge(self, other: Self) -> Self {
        if self == other { self } else { Self::String }
    }
}

#[derive(Debug, Clone)]
struct LayerAccumulator {
    geometry: GeometryKind,
    count: u64,
    fields: BTreeMap<String, FieldType>,
}

/// Running statistics for every layer seen during decode.
#[derive(Debug, Clone, Default)]
pub struct MetadataAggregator {
    layers: BTreeMap<String, LayerAccumulator>,
}

impl MetadataAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one feature on `layer` and fold its tags into the field types.
    ///
    /// The geometry recorded for a layer is the one supplied on first
    /// observation.
    pub fn observe<'a, I>(&mut self, layer: &str, geometry: GeometryKind, tags: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let entry = self
            .layers
            .entry(layer.to_owned())
            .or_insert_with(|| LayerAccumulator {
                geometry,
                count: 0,
                fields: BTreeMap::new(),
            });
        entry.count += 1;
        for (key, value) in tags {
            let inferred = FieldType::infer(value);
            entry
                .fields
                .entry(key.to_owned())
                .and_modify(|current| *current = current.merge(inferred))
                .or_insert(inferred);
        }
    }

    /// Features counted on `layer` so far.
    #[must_use]
    pub fn layer_count(&self, layer: &str) -> u64 {
        self.layers.get(layer).map_or(0, |entry| entry.count)
    }

    /// Current inferred type of `field` on `layer`.
    #[must_use]
    pub fn field_type(&self, layer: &str, field: &str) -> Option<FieldType> {
        self.layers
            .get(layer)
            .and_then(|entry| entry.fields.get(field).copied())
    }

    /// Build the metadata document.
    ///
    /// Layers and attributes appear in lexicographic order.
    #[must_use]
    pub fn finalize(&self) -> TileJson {
        let vector_layers = self
            .layers
            .iter()
            .map(|(name, entry)| VectorLayer {
                id: name.clone(),
                minzoom: MIN_ZOOM,
                maxzoom: MAX_ZOOM,
                fields: entry.fields.clone(),
            })
            .collect::<Vec<_>>();

        let layers = self
            .layers
            .iter()
            .map(|(name, entry)| LayerStat {
                layer: name.clone(),
                count: entry.count,
                geometry: entry.geometry,
                attribute_count: entry.fields.len(),
                attributes: entry
                    .fields
                    .iter()
                    .map(|(attribute, field_type)| AttributeStat {
                        attribute: attribute.clone(),
                        count: 1,
                        field_type: *field_type,
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        TileJson {
            tilestats: TileStats {
                layer_count: layers.len(),
                layers,
            },
            vector_layers,
        }
    }
}

/// The `json` metadata document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileJson {
    /// One entry per layer with its field types.
    pub vector_layers: Vec<VectorLayer>,
    /// Layer counts and attribute summaries.
    pub tilestats: TileStats,
}

impl TileJson {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A layer entry under `vector_layers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorLayer {
    /// Layer name.
    pub id: String,
    /// Lowest zoom the layer appears at.
    pub minzoom: u8,
    /// Highest zoom the layer appears at.
    pub maxzoom: u8,
    /// Field name to inferred type.
    pub fields: BTreeMap<String, FieldType>,
}

/// The `tilestats` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileStats {
    /// Number of layers.
    pub layer_count: usize,
    /// Per-layer summaries.
    pub layers: Vec<LayerStat>,
}

/// Summary for one layer under `tilestats.layers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStat {
    /// Layer name.
    pub layer: String,
    /// Features observed.
    pub count: u64,
    /// Geometry family.
    pub geometry: GeometryKind,
    /// Number of distinct attributes.
    pub attribute_count: usize,
    /// Attribute summaries.
    pub attributes: Vec<AttributeStat>,
}

/// Summary for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeStat {
    /// Attribute name.
    pub attribute: String,
    /// Fixed placeholder; per-value counts are not tracked.
    pub count: u32,
    /// Inferred type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}
