//! Data model for the road graph and the synthesized trench network.

pub mod streets;
pub mod trench;

pub use streets::{EdgeKind, OsmNodeId, RoadGraph, SegmentId, StreetEdge, StreetNode};
pub use trench::{CornerId, TrenchCorner, TrenchEdge};
