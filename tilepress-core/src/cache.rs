//! In-memory store of decoded nodes and ways for a single conversion job.
//!
//! Nodes are kept in a dense vector addressed through an id-to-slot map so a
//! planet-sized run does not pay for one heap allocation per entry. Ways are
//! appended in decode order and resolved in one pass once every node is known.

use std::collections::HashMap;

use log::warn;

use crate::feature::{PointFeature, WayFeature};

/// Mutable cache filled while primitive blocks are decoded.
#[derive(Debug, Default)]
pub struct FeatureCache {
    points: Vec<PointFeature>,
    slots: HashMap<i64, usize>,
    ways: Vec<WayFeature>,
}

impl FeatureCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any earlier node with the same id in place.
    pub fn put(&mut self, point: PointFeature) {
        if let Some(slot) = self.slots.get(&point.id).copied()
            && let Some(existing) = self.points.get_mut(slot)
        {
            *existing = point;
            return;
        }
        self.slots.insert(point.id, self.points.len());
        self.points.push(point);
    }

    /// Append a way in decode order.
    pub fn append(&mut self, way: WayFeature) {
        self.ways.push(way);
    }

    /// Look up a cached node by id.
    #[must_use]
    pub fn point(&self, id: i64) -> Option<&PointFeature> {
        self.slots.get(&id).and_then(|slot| self.points.get(*slot))
    }

    /// Number of distinct node ids cached.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of ways cached.
    #[must_use]
    pub const fn way_count(&self) -> usize {
        self.ways.len()
    }

    /// Resolve every way's node references and freeze the cache.
    ///
    /// References to nodes that never appeared are skipped. The returned
    /// [`ResolvedFeatures`] is immutable, so indexing can share it across
    /// threads.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use tilepress_core::{FeatureCache, PointFeature, Tags, WayFeature};
    ///
    /// let mut cache = FeatureCache::new();
    /// cache.put(PointFeature::new(1, Coord { x: 0.0, y: 0.0 }, Tags::new()));
    /// cache.put(PointFeature::new(2, Coord { x: 1.0, y: 1.0 }, Tags::new()));
    /// cache.append(WayFeature::new(10, vec![1, 2, 3], Tags::new()));
    ///
    /// let resolved = cache.resolve_geometry();
    /// assert_eq!(resolved.ways()[0].points.len(), 2);
    /// assert_eq!(resolved.unresolved_refs(), 1);
    /// ```
    #[must_use]
    pub fn resolve_geometry(self) -> ResolvedFeatures {
        let Self {
            points,
            slots,
            mut ways,
        } = self;

        let mut unresolved_refs = 0_u64;
        for way in &mut ways {
            way.points.clear();
            way.points.reserve(way.node_refs.len());
            for node_ref in &way.node_refs {
                let Some(point) = slots.get(node_ref).and_then(|slot| points.get(*slot)) else {
                    unresolved_refs += 1;
                    continue;
                };
                way.points.push(point.location);
            }
        }

        if unresolved_refs > 0 {
            warn!("Skipped {unresolved_refs} way node references without coordinates");
        }

        ResolvedFeatures {
            points,
            ways,
            unresolved_refs,
        }
    }
}

/// Frozen view of a job's features with way geometry resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFeatures {
    points: Vec<PointFeature>,
    ways: Vec<WayFeature>,
    unresolved_refs: u64,
}

impl ResolvedFeatures {
    /// Cached nodes in first-seen order.
    #[must_use]
    pub fn points(&self) -> &[PointFeature] {
        &self.points
    }

    /// Cached ways in decode order, including undrawable ones.
    #[must_use]
    pub fn ways(&self) -> &[WayFeature] {
        &self.ways
    }

    /// Ways with at least two resolved vertices.
    pub fn drawable_ways(&self) -> impl Iterator<Item = &WayFeature> {
        self.ways.iter().filter(|way| way.is_drawable())
    }

    /// Total node references that did not match a cached node.
    #[must_use]
    pub const fn unresolved_refs(&self) -> u64 {
        self.unresolved_refs
    }
}
