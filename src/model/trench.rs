//! Synthesized trench network components: corners and trench edges.

use geo::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};

use super::{EdgeKind, OsmNodeId, SegmentId};
use crate::geometry::COORD_DECIMALS;

/// First corner id handed out by synthesis. Large enough to stay clear of
/// OSM node ids so corners can be merged into the road graph's id space.
pub const CORNER_ID_BASE: i64 = 400_000_000;

/// Stable identifier of a synthesized trench corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CornerId(pub i64);

impl CornerId {
    /// The corner's id in the road graph's node id space.
    pub fn as_node_id(self) -> OsmNodeId {
        OsmNodeId(self.0)
    }
}

/// Fixed-precision grid key backing corner identity.
///
/// Two synthesis attempts produce the same corner iff their coordinates
/// round to the same grid cell, replacing raw floating-point equality so
/// reuse is deterministic across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CornerKey {
    x: i64,
    y: i64,
}

impl CornerKey {
    pub(crate) fn of(position: Coord<f64>) -> Self {
        let scale = 10f64.powi(COORD_DECIMALS);
        Self {
            #[allow(clippy::cast_possible_truncation)]
            x: (position.x * scale).round() as i64,
            #[allow(clippy::cast_possible_truncation)]
            y: (position.y * scale).round() as i64,
        }
    }
}

/// A trench corner: a point near one intersection, placed at a fixed offset
/// on the angular bisector between two angularly-adjacent incident streets.
#[derive(Debug, Clone)]
pub struct TrenchCorner {
    pub id: CornerId,
    pub geometry: Point<f64>,
    /// The intersection this corner belongs to.
    pub intersection: OsmNodeId,
    /// Street segments this corner is adjacent to; starts with the 1-2
    /// streets whose bisector produced it and grows on corner reuse.
    pub streets: Vec<SegmentId>,
    /// Number of trench edges incident to this corner in the final network.
    pub degree: u32,
}

impl TrenchCorner {
    pub fn coord(&self) -> Coord<f64> {
        self.geometry.into()
    }

    pub(crate) fn add_street(&mut self, segment: SegmentId) {
        if !self.streets.contains(&segment) {
            self.streets.push(segment);
        }
    }
}

/// A synthesized trench edge: either an intersection crossing between two
/// corners of the same intersection, or a parallel trench running alongside
/// a street between corners of different intersections.
#[derive(Debug, Clone)]
pub struct TrenchEdge {
    pub start: CornerId,
    pub end: CornerId,
    pub geometry: LineString<f64>,
    pub length: f64,
    /// [`EdgeKind::Crossing`] or [`EdgeKind::Trench`].
    pub kind: EdgeKind,
}

impl TrenchEdge {
    pub fn is_crossing(&self) -> bool {
        self.kind == EdgeKind::Crossing
    }
}
