//! Road graph wrapper: intersections, street segments and edge kinds.

use geo::{Coord, LineString, Point};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::geometry::polyline_length;

/// Identifier of an intersection node in the source road graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OsmNodeId(pub i64);

/// Canonical undirected key for a street segment: the sorted pair of its
/// endpoint ids, so the same segment looked up from either direction maps
/// to one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(OsmNodeId, OsmNodeId);

impl SegmentId {
    pub fn new(a: OsmNodeId, b: OsmNodeId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn endpoints(self) -> (OsmNodeId, OsmNodeId) {
        (self.0, self.1)
    }

    /// True iff `node` is one of the segment's endpoints.
    pub fn touches(self, node: OsmNodeId) -> bool {
        self.0 == node || self.1 == node
    }
}

/// Distinguishes original street edges from synthesized trench edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// A real street from the input road graph (the `highway` marker).
    Street,
    /// A trench running parallel to a street, corner to corner.
    Trench,
    /// A trench crossing an intersection, connecting two corners that
    /// belong to the same intersection.
    Crossing,
}

/// Road graph node: an intersection with planar coordinates.
#[derive(Debug, Clone)]
pub struct StreetNode {
    pub id: OsmNodeId,
    pub geometry: Point<f64>,
}

/// Road graph edge. Streets carry their ordered vertex geometry (exactly 2
/// coordinates when straight, more when curved), oriented from the edge's
/// stored source node to its target node.
#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub kind: EdgeKind,
    pub geometry: LineString<f64>,
    pub length: f64,
}

impl StreetEdge {
    pub fn street(geometry: LineString<f64>) -> Self {
        let length = polyline_length(&geometry.0);
        Self {
            kind: EdgeKind::Street,
            geometry,
            length,
        }
    }

    pub fn is_street(&self) -> bool {
        self.kind == EdgeKind::Street
    }

    /// True when the geometry has interior vertices, i.e. the street curves.
    pub fn is_curved(&self) -> bool {
        self.geometry.0.len() > 2
    }
}

/// Road graph: intersections with planar coordinates and street edges with
/// ordered vertex geometry. A thin wrapper over petgraph's undirected
/// graph; trench synthesis reads it and appends its output onto it.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_intersection(&mut self, id: OsmNodeId, x: f64, y: f64) -> NodeIndex {
        self.graph.add_node(StreetNode {
            id,
            geometry: Point::new(x, y),
        })
    }

    /// Adds a street between two intersections. The geometry must run from
    /// `u` to `v` and contain at least two vertices.
    pub fn add_street(&mut self, u: NodeIndex, v: NodeIndex, geometry: LineString<f64>) -> EdgeIndex {
        self.graph.add_edge(u, v, StreetEdge::street(geometry))
    }

    /// Adds a straight street whose geometry is the two endpoint positions.
    pub fn add_straight_street(&mut self, u: NodeIndex, v: NodeIndex) -> EdgeIndex {
        let line = LineString::new(vec![self.coord(u), self.coord(v)]);
        self.add_street(u, v, line)
    }

    pub fn node(&self, index: NodeIndex) -> &StreetNode {
        &self.graph[index]
    }

    pub fn coord(&self, index: NodeIndex) -> Coord<f64> {
        self.graph[index].geometry.into()
    }

    /// Canonical segment id for the street between two intersections.
    pub fn segment_id(&self, u: NodeIndex, v: NodeIndex) -> SegmentId {
        SegmentId::new(self.graph[u].id, self.graph[v].id)
    }

    /// All intersection node indices, in stable insertion order.
    pub fn intersections(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Street edge records between two intersections, in edge-index order.
    /// More than one entry means duplicate street data upstream.
    pub fn street_records(&self, u: NodeIndex, v: NodeIndex) -> Vec<EdgeIndex> {
        let mut records: Vec<EdgeIndex> = self
            .graph
            .edges_connecting(u, v)
            .filter(|edge| petgraph::visit::EdgeRef::weight(edge).is_street())
            .map(|edge| petgraph::visit::EdgeRef::id(&edge))
            .collect();
        records.sort_unstable();
        records
    }

    /// Street geometry oriented away from `from`: the returned coordinates
    /// start at `from`'s position. Orientation is resolved by comparing the
    /// geometry's first vertex against the node position, since the edge may
    /// have been stored from either endpoint.
    pub fn oriented_geometry(&self, edge: EdgeIndex, from: NodeIndex) -> Vec<Coord<f64>> {
        let origin = self.coord(from);
        let coords = &self.graph[edge].geometry.0;
        if coords[0] == origin {
            coords.clone()
        } else {
            coords.iter().rev().copied().collect()
        }
    }
}
