//! Decoding of header and primitive blocks into the feature cache.

use std::borrow::Cow;

use geo::{Coord, Rect};
use log::debug;
use prost::Message;
use tilepress_core::{
    DENSE_NODES_LAYER, DatasetHeader, FeatureCache, GeometryKind, MetadataAggregator,
    NODES_LAYER, PointFeature, RELATIONS_LAYER, Tags, WAYS_LAYER, WayFeature,
};

use super::blob::BlobKind;
use super::error::DecodeError;
use super::proto::{DenseNodes, HeaderBBox, HeaderBlock, PrimitiveBlock, PrimitiveGroup};

/// Coordinate granularity in nanodegrees when a block omits it.
pub const DEFAULT_GRANULARITY: i32 = 100;

const NANODEGREES_PER_DEGREE: f64 = 1e9;

/// Element counts and node extent seen while decoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodeSummary {
    /// Nodes decoded, plain and dense.
    pub nodes: u64,
    /// Ways decoded.
    pub ways: u64,
    /// Relations decoded.
    pub relations: u64,
    /// Box covering every valid node coordinate, if any.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl DecodeSummary {
    fn record_node(&mut self, location: Coord<f64>) {
        self.nodes += 1;
        if location.x.is_finite()
            && location.y.is_finite()
            && (-180.0..=180.0).contains(&location.x)
            && (-90.0..=90.0).contains(&location.y)
        {
            self.include(location);
        }
    }

    fn include(&mut self, location: Coord<f64>) {
        self.bounds = Some(self.bounds.map_or_else(
            || Rect::new(location, location),
            |existing| {
                Rect::new(
                    Coord {
                        x: existing.min().x.min(location.x),
                        y: existing.min().y.min(location.y),
                    },
                    Coord {
                        x: existing.max().x.max(location.x),
                        y: existing.max().y.max(location.y),
                    },
                )
            },
        ));
    }
}

/// Everything a finished decode pass hands to the tiling phase.
#[derive(Debug, Default)]
pub struct DecodedDataset {
    /// Cached nodes and unresolved ways.
    pub cache: FeatureCache,
    /// Per-layer statistics.
    pub stats: MetadataAggregator,
    /// Last header block seen.
    pub header: DatasetHeader,
    /// Element counts and node extent.
    pub summary: DecodeSummary,
}

/// Turns block payloads into cached features and statistics.
///
/// # Examples
/// ```
/// use tilepress_data::pbf::{BlobKind, PrimitiveDecoder};
///
/// let mut decoder = PrimitiveDecoder::new();
/// // An empty payload is a valid, empty primitive block.
/// decoder.decode(BlobKind::Data, &[]).expect("decode empty block");
/// assert_eq!(decoder.finish().summary.nodes, 0);
/// ```
#[derive(Debug, Default)]
pub struct PrimitiveDecoder {
    dataset: DecodedDataset,
}

impl PrimitiveDecoder {
    /// Create a decoder with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one payload of the given kind.
    pub fn decode(&mut self, kind: BlobKind, payload: &[u8]) -> Result<(), DecodeError> {
        match kind {
            BlobKind::Header => {
                let block = HeaderBlock::decode(payload)
                    .map_err(|source| DecodeError::HeaderBlock { source })?;
                self.apply_header(block);
            }
            BlobKind::Data => {
                let block = PrimitiveBlock::decode(payload)
                    .map_err(|source| DecodeError::PrimitiveBlock { source })?;
                self.apply_primitives(&block);
            }
        }
        Ok(())
    }

    /// Header metadata decoded so far.
    #[must_use]
    pub const fn header(&self) -> &DatasetHeader {
        &self.dataset.header
    }

    /// Counts decoded so far.
    #[must_use]
    pub const fn summary(&self) -> &DecodeSummary {
        &self.dataset.summary
    }

    /// Statistics accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &MetadataAggregator {
        &self.dataset.stats
    }

    /// Features cached so far.
    #[must_use]
    pub const fn cache(&self) -> &FeatureCache {
        &self.dataset.cache
    }

    /// End the decode pass.
    #[must_use]
    pub fn finish(self) -> DecodedDataset {
        self.dataset
    }

    fn apply_header(&mut self, block: HeaderBlock) {
        let HeaderBlock {
            bbox,
            required_features,
            writingprogram,
            source,
            ..
        } = block;
        self.dataset.header = DatasetHeader {
            name: required_features.into_iter().next(),
            writing_program: writingprogram,
            source,
            bbox: bbox.as_ref().map(header_rect),
        };
        debug!("header block: {:?}", self.dataset.header);
    }

    fn apply_primitives(&mut self, block: &PrimitiveBlock) {
        let context = BlockContext::new(block);
        for group in &block.primitivegroup {
            self.apply_group(&context, group);
        }
    }

    fn apply_group(&mut self, context: &BlockContext<'_>, group: &PrimitiveGroup) {
        let dataset = &mut self.dataset;

        for node in &group.nodes {
            let pairs = context.pairs(&node.keys, &node.vals);
            let location = context.coord(node.lat, node.lon);
            dataset
                .stats
                .observe(NODES_LAYER, GeometryKind::Point, pairs.iter().copied());
            dataset.summary.record_node(location);
            dataset
                .cache
                .put(PointFeature::new(node.id, location, collect_tags(&pairs)));
        }

        if let Some(dense) = &group.dense {
            apply_dense(dataset, context, dense);
        }

        for way in &group.ways {
            let pairs = context.pairs(&way.keys, &way.vals);
            dataset
                .stats
                .observe(WAYS_LAYER, GeometryKind::LineString, pairs.iter().copied());
            dataset.summary.ways += 1;
            dataset.cache.append(WayFeature::new(
                way.id,
                cumulative(&way.refs).collect(),
                collect_tags(&pairs),
            ));
        }

        for relation in &group.relations {
            let pairs = context.pairs(&relation.keys, &relation.vals);
            dataset.stats.observe(
                RELATIONS_LAYER,
                GeometryKind::GeometryCollection,
                pairs.iter().copied(),
            );
            dataset.summary.relations += 1;
        }
    }
}

fn apply_dense(dataset: &mut DecodedDataset, context: &BlockContext<'_>, dense: &DenseNodes) {
    let mut keys_vals = dense.keys_vals.iter().copied();
    let columns = cumulative(&dense.id)
        .zip(cumulative(&dense.lat))
        .zip(cumulative(&dense.lon));

    for ((id, lat), lon) in columns {
        let pairs = dense_pairs(context, &mut keys_vals);
        let location = context.coord(lat, lon);
        dataset
            .stats
            .observe(DENSE_NODES_LAYER, GeometryKind::Point, pairs.iter().copied());
        dataset.summary.record_node(location);
        dataset
            .cache
            .put(PointFeature::new(id, location, collect_tags(&pairs)));
    }
}

/// Pull one node's key/value pairs off the shared dense tag stream.
///
/// The list ends at a `0` delimiter, at the end of the stream, or at a key
/// with no value after it.
fn dense_pairs<'a>(
    context: &'a BlockContext<'_>,
    keys_vals: &mut impl Iterator<Item = i32>,
) -> Vec<(&'a str, &'a str)> {
    let mut pairs = Vec::new();
    while let Some(key) = keys_vals.next().filter(|key| *key != 0) {
        let Some(value) = keys_vals.next() else {
            break;
        };
        if let (Ok(key_index), Ok(value_index)) = (u32::try_from(key), u32::try_from(value))
            && let Some(pair) = context.pair(key_index, value_index)
        {
            pairs.push(pair);
        }
    }
    pairs
}

/// Running sum of a delta-encoded column.
fn cumulative(deltas: &[i64]) -> impl Iterator<Item = i64> + '_ {
    deltas.iter().scan(0_i64, |total, delta| {
        *total = total.wrapping_add(*delta);
        Some(*total)
    })
}

fn collect_tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

fn header_rect(bbox: &HeaderBBox) -> Rect<f64> {
    Rect::new(
        Coord {
            x: nanodegrees(i128::from(bbox.left)),
            y: nanodegrees(i128::from(bbox.bottom)),
        },
        Coord {
            x: nanodegrees(i128::from(bbox.right)),
            y: nanodegrees(i128::from(bbox.top)),
        },
    )
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "coordinates need far fewer than 52 significant bits"
)]
fn nanodegrees(value: i128) -> f64 {
    value as f64 / NANODEGREES_PER_DEGREE
}

/// Per-block decoding state: the string table and coordinate transform.
struct BlockContext<'a> {
    strings: Vec<Cow<'a, str>>,
    granularity: i128,
    lat_offset: i128,
    lon_offset: i128,
}

impl<'a> BlockContext<'a> {
    fn new(block: &'a PrimitiveBlock) -> Self {
        let strings = block
            .stringtable
            .as_ref()
            .map(|table| {
                table
                    .s
                    .iter()
                    .map(|entry| String::from_utf8_lossy(entry))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            strings,
            granularity: i128::from(block.granularity.unwrap_or(DEFAULT_GRANULARITY)),
            lat_offset: i128::from(block.lat_offset.unwrap_or_default()),
            lon_offset: i128::from(block.lon_offset.unwrap_or_default()),
        }
    }

    fn coord(&self, lat: i64, lon: i64) -> Coord<f64> {
        Coord {
            x: nanodegrees(self.lon_offset + self.granularity * i128::from(lon)),
            y: nanodegrees(self.lat_offset + self.granularity * i128::from(lat)),
        }
    }

    /// Resolve one key/value index pair; out-of-range indices drop the pair.
    fn pair(&self, key: u32, value: u32) -> Option<(&str, &str)> {
        let key_text = self.strings.get(usize::try_from(key).ok()?)?;
        let value_text = self.strings.get(usize::try_from(value).ok()?)?;
        Some((key_text.as_ref(), value_text.as_ref()))
    }

    fn pairs(&self, keys: &[u32], vals: &[u32]) -> Vec<(&str, &str)> {
        keys.iter()
            .zip(vals)
            .filter_map(|(key, value)| self.pair(*key, *value))
            .collect()
    }
}
