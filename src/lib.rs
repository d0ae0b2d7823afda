//! Trench network synthesis alongside street networks.
//!
//! Given a road graph (intersections as nodes, possibly-curved street
//! segments as edges), this crate plans the physical cable trenches a
//! fiber (FttH) deployment could dig: "trench corners" placed on the
//! angular bisectors around each intersection, crossing edges connecting
//! the corners of one intersection, and parallel trenches running along
//! each side of every street. The output is an overlay of new nodes and
//! edges that the caller merges back onto the road graph and hands to a
//! fiber-routing optimizer.
//!
//! The core is exact planar geometry over graph topology that is not
//! known in advance; expected degeneracies (parallel offset lines at
//! curve joins, zero-length sub-segments, duplicate corners) are handled
//! inline, while data-quality conditions are surfaced in a structured
//! report.
//!
//! ```
//! use trench_core::prelude::*;
//!
//! let mut graph = RoadGraph::new();
//! let a = graph.add_intersection(OsmNodeId(1), 0.0, 0.0);
//! let b = graph.add_intersection(OsmNodeId(2), 1.0, 0.0);
//! graph.add_straight_street(a, b);
//!
//! let network = synthesize(&graph, &SynthesisConfig::default()).unwrap();
//! assert_eq!(network.corners.len(), 4);
//! network.apply_to(&mut graph);
//! ```

pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod prelude;
pub mod synthesis;

pub use error::{Error, GeometryError};
pub use synthesis::{
    SynthesisConfig, SynthesisReport, SynthesisWarning, TrenchNetwork, synthesize,
};
