//! Two-phase trench synthesis pipeline.
//!
//! Phase one places trench corners around every intersection; phase two,
//! which starts only after all corners exist, builds parallel trench
//! candidates along every street and resolves competing candidates to the
//! shortest. The result is an immutable overlay that the caller merges
//! onto the road graph in one step.

pub(crate) mod corners;
pub(crate) mod parallel;
mod report;
mod resolve;

use geo::LineString;
use hashbrown::HashMap;
use log::info;

pub use report::{SynthesisReport, SynthesisWarning};

use crate::Error;
use crate::model::{CornerId, EdgeKind, RoadGraph, StreetEdge, StreetNode, TrenchCorner, TrenchEdge};

/// Default corner offset from the intersection center, in coordinate
/// units. Sized for unprojected lon/lat street data; callers working in a
/// projected CRS should set a metric offset instead.
pub const DEFAULT_OFFSET: f64 = 1e-4;

/// Tunable parameters of a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Distance `d` between every trench corner and its intersection.
    pub offset: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
        }
    }
}

/// The synthesized trench network: an overlay of corner nodes and trench
/// edges ready to be merged onto the road graph, plus the structured
/// warnings collected along the way.
#[derive(Debug, Clone)]
pub struct TrenchNetwork {
    pub corners: Vec<TrenchCorner>,
    pub edges: Vec<TrenchEdge>,
    pub report: SynthesisReport,
}

impl TrenchNetwork {
    /// Crossing edges (corner to corner around one intersection).
    pub fn crossings(&self) -> impl Iterator<Item = &TrenchEdge> {
        self.edges.iter().filter(|edge| edge.is_crossing())
    }

    /// Parallel trenches running alongside streets.
    pub fn trenches(&self) -> impl Iterator<Item = &TrenchEdge> {
        self.edges.iter().filter(|edge| !edge.is_crossing())
    }

    /// Corners owned by one intersection.
    pub fn corners_of(&self, intersection: crate::model::OsmNodeId) -> Vec<&TrenchCorner> {
        self.corners
            .iter()
            .filter(|corner| corner.intersection == intersection)
            .collect()
    }

    /// Merges the overlay into the road graph in one step: every corner
    /// becomes a node (its corner id doubling as node id) and every trench
    /// edge becomes an edge of the matching kind.
    pub fn apply_to(&self, graph: &mut RoadGraph) {
        let mut nodes = HashMap::with_capacity(self.corners.len());
        for corner in &self.corners {
            let index = graph.graph.add_node(StreetNode {
                id: corner.id.as_node_id(),
                geometry: corner.geometry,
            });
            nodes.insert(corner.id, index);
        }

        for edge in &self.edges {
            if let (Some(&start), Some(&end)) = (nodes.get(&edge.start), nodes.get(&edge.end)) {
                graph.graph.add_edge(
                    start,
                    end,
                    StreetEdge {
                        kind: edge.kind,
                        geometry: edge.geometry.clone(),
                        length: edge.length,
                    },
                );
            }
        }
    }
}

/// Synthesizes the trench network for a road graph.
///
/// Corner synthesis runs first and forms a barrier: trench candidates are
/// only built once every corner exists, since both ends of a trench snap
/// to corners. Each phase processes its units (intersections, then street
/// segments) independently and in parallel, merging private buffers in
/// deterministic order.
///
/// # Errors
///
/// Returns an error when the configuration or the input graph is invalid
/// (non-positive offset, street geometry with fewer than two vertices).
/// Expected geometric degeneracies never fail the run; data-quality
/// conditions are collected in the returned report.
pub fn synthesize(graph: &RoadGraph, config: &SynthesisConfig) -> Result<TrenchNetwork, Error> {
    validate(graph, config)?;

    info!(
        "Synthesizing trench corners for {} intersections",
        graph.graph.node_count()
    );
    let (index, crossings, corner_warnings) = corners::synthesize_corners(graph, config.offset);
    info!(
        "Placed {} corners and {} crossings",
        index.corners.len(),
        crossings.len()
    );

    let (candidates, trench_warnings) = parallel::synthesize_trenches(graph, &index, config.offset);
    let winners = resolve::resolve_candidates(candidates);
    info!("Kept {} parallel trenches", winners.len());

    let mut edges = crossings;
    for candidate in winners {
        edges.push(TrenchEdge {
            start: index.corners[candidate.start].id,
            end: index.corners[candidate.end].id,
            geometry: LineString::new(candidate.geometry),
            length: candidate.length,
            kind: EdgeKind::Trench,
        });
    }

    let mut corners = index.corners;
    count_degrees(&mut corners, &edges);

    let mut report = SynthesisReport::default();
    report.extend(corner_warnings);
    report.extend(trench_warnings);
    if !report.is_clean() {
        info!("Synthesis finished with {} warnings", report.len());
    }

    Ok(TrenchNetwork {
        corners,
        edges,
        report,
    })
}

fn validate(graph: &RoadGraph, config: &SynthesisConfig) -> Result<(), Error> {
    if !config.offset.is_finite() || config.offset <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "corner offset must be positive, got {}",
            config.offset
        )));
    }

    for edge in graph.graph.edge_indices() {
        let record = &graph.graph[edge];
        if record.is_street() && record.geometry.0.len() < 2 {
            return Err(Error::InvalidData(format!(
                "street geometry with {} vertices (need at least 2)",
                record.geometry.0.len()
            )));
        }
    }
    Ok(())
}

fn count_degrees(corners: &mut [TrenchCorner], edges: &[TrenchEdge]) {
    let slots: HashMap<CornerId, usize> = corners
        .iter()
        .enumerate()
        .map(|(slot, corner)| (corner.id, slot))
        .collect();
    for edge in edges {
        for id in [edge.start, edge.end] {
            if let Some(&slot) = slots.get(&id) {
                corners[slot].degree += 1;
            }
        }
    }
}
