// Re-export key components
pub use crate::error::{Error, GeometryError};
pub use crate::geometry::Side;
pub use crate::model::{
    CornerId, EdgeKind, OsmNodeId, RoadGraph, SegmentId, StreetEdge, StreetNode, TrenchCorner,
    TrenchEdge,
};
pub use crate::synthesis::{
    SynthesisConfig, SynthesisReport, SynthesisWarning, TrenchNetwork, synthesize,
};
