//! Corner synthesis: for each intersection, place trench corners on the
//! angular bisector between each pair of angularly-adjacent incident
//! streets, and connect consecutive corners with crossing edges.
//!
//! Runs as a two-step phase: intersections are planned independently (and
//! in parallel) into private buffers, then merged serially through the
//! coordinate-keyed [`CornerIndex`] so repeated synthesis of the same
//! corner resolves to one stable identity.

use std::f64::consts::PI;

use geo::{Coord, LineString};
use hashbrown::{HashMap, HashSet};
use log::warn;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::report::SynthesisWarning;
use crate::geometry::{clockwise_angle, distance, point_on_circle, round_position};
use crate::model::trench::{CORNER_ID_BASE, CornerKey};
use crate::model::{CornerId, EdgeKind, OsmNodeId, RoadGraph, SegmentId, TrenchCorner, TrenchEdge};

/// A corner computed for one intersection, before identity assignment.
#[derive(Debug, Clone)]
pub(crate) struct PlannedCorner {
    pub position: Coord<f64>,
    /// The 1-2 streets whose bisector produced this corner.
    pub streets: Vec<SegmentId>,
}

/// Private output buffer of one intersection's corner synthesis.
#[derive(Debug, Default)]
pub(crate) struct IntersectionPlan {
    pub corners: Vec<PlannedCorner>,
    /// Pairs of local corner indices to connect with crossing edges.
    pub crossings: Vec<(usize, usize)>,
    pub warnings: Vec<SynthesisWarning>,
}

/// Corner store with identity lookup by rounded coordinates, plus a
/// per-street bucket index consumed by the trench-edge phase.
#[derive(Debug, Default)]
pub(crate) struct CornerIndex {
    next_id: i64,
    by_key: HashMap<CornerKey, usize>,
    pub corners: Vec<TrenchCorner>,
    /// Corner slots adjacent to each street segment.
    pub by_street: HashMap<SegmentId, Vec<usize>>,
}

impl CornerIndex {
    pub(crate) fn new() -> Self {
        Self {
            next_id: CORNER_ID_BASE,
            ..Self::default()
        }
    }

    pub(crate) fn position(&self, slot: usize) -> Coord<f64> {
        self.corners[slot].coord()
    }

    /// Inserts a planned corner, or reuses the identity of an existing
    /// corner with equal (grid-rounded) coordinates. Returns the slot.
    pub(crate) fn insert_or_reuse(
        &mut self,
        intersection: OsmNodeId,
        planned: PlannedCorner,
    ) -> usize {
        let key = CornerKey::of(planned.position);
        let slot = if let Some(&slot) = self.by_key.get(&key) {
            slot
        } else {
            let slot = self.corners.len();
            let id = CornerId(self.next_id);
            self.next_id += 1;
            self.corners.push(TrenchCorner {
                id,
                geometry: planned.position.into(),
                intersection,
                streets: Vec::new(),
                degree: 0,
            });
            self.by_key.insert(key, slot);
            slot
        };

        for segment in planned.streets {
            self.corners[slot].add_street(segment);
            let bucket = self.by_street.entry(segment).or_default();
            if !bucket.contains(&slot) {
                bucket.push(slot);
            }
        }
        slot
    }
}

/// Corner phase: plans every intersection in parallel, then merges the
/// plans in intersection order. Returns the corner index, the crossing
/// edges, and the warnings raised while planning.
pub(crate) fn synthesize_corners(
    graph: &RoadGraph,
    offset: f64,
) -> (CornerIndex, Vec<TrenchEdge>, Vec<SynthesisWarning>) {
    let nodes: Vec<NodeIndex> = graph.intersections().collect();
    let plans: Vec<(NodeIndex, IntersectionPlan)> = nodes
        .into_par_iter()
        .map(|node| (node, plan_intersection(graph, node, offset)))
        .collect();

    merge_plans(graph, plans)
}

/// Computes one intersection's corners and crossings into a private plan.
/// Reads the graph only; safe to run concurrently across intersections.
pub(crate) fn plan_intersection(graph: &RoadGraph, node: NodeIndex, offset: f64) -> IntersectionPlan {
    let mut plan = IntersectionPlan::default();
    let center = graph.coord(node);

    // Direction angle of every incident street, measured clockwise from
    // (1, 0). The direction points at the first geometry vertex after the
    // intersection, not the far endpoint, so curved streets bisect
    // correctly.
    let mut incident: Vec<(f64, SegmentId)> = Vec::new();
    let mut seen: HashSet<NodeIndex> = HashSet::new();
    for neighbor in graph.graph.neighbors(node) {
        if neighbor == node || !seen.insert(neighbor) {
            continue;
        }
        let records = graph.street_records(node, neighbor);
        let Some(&first) = records.first() else {
            continue;
        };
        let segment = graph.segment_id(node, neighbor);
        if records.len() > 1 {
            warn!(
                "{} street records between the endpoints of {segment:?}; using the first",
                records.len()
            );
            plan.warnings.push(SynthesisWarning::DuplicateStreetRecord {
                segment,
                records: records.len(),
            });
        }

        let geometry = graph.oriented_geometry(first, node);
        let next = geometry[1];
        let radian = clockwise_angle((1.0, 0.0), (next.x - center.x, next.y - center.y));
        incident.push((radian, segment));
    }

    incident.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    match incident.len() {
        0 => {}
        1 => plan_dead_end(&mut plan, center, offset, incident[0]),
        _ => plan_junction(&mut plan, center, offset, &incident),
    }
    plan
}

/// Degree-1 special case: a dead end gets two corners at ±90° from the
/// single street, closing the trench with one perpendicular crossing.
fn plan_dead_end(plan: &mut IntersectionPlan, center: Coord<f64>, offset: f64, street: (f64, SegmentId)) {
    let (radian, segment) = street;
    for cap in [radian + PI * 0.5, radian + PI * 1.5] {
        plan.corners.push(PlannedCorner {
            position: round_position(point_on_circle(center, offset, cap)),
            streets: vec![segment],
        });
    }
    plan.crossings.push((0, 1));
}

/// Degree-n case: one corner per adjacent pair of incident streets in
/// clockwise order, including the wrap-around pair, and n crossing edges
/// connecting consecutive corners.
fn plan_junction(
    plan: &mut IntersectionPlan,
    center: Coord<f64>,
    offset: f64,
    incident: &[(f64, SegmentId)],
) {
    let n = incident.len();
    for i in 1..n {
        let (previous, previous_segment) = incident[i - 1];
        let (current, current_segment) = incident[i];
        let between = current - (current - previous).abs() / 2.0;
        plan.corners.push(PlannedCorner {
            position: round_position(point_on_circle(center, offset, between)),
            streets: vec![previous_segment, current_segment],
        });
        if i > 1 {
            plan.crossings.push((i - 2, i - 1));
        }
    }

    // Wrap-around pair between the last street and the first, one turn on.
    let (first, first_segment) = incident[0];
    let (last, last_segment) = incident[n - 1];
    let first = first + 2.0 * PI;
    let between = first - (first - last).abs() / 2.0;
    plan.corners.push(PlannedCorner {
        position: round_position(point_on_circle(center, offset, between)),
        streets: vec![last_segment, first_segment],
    });
    plan.crossings.push((n - 2, n - 1));
    plan.crossings.push((n - 1, 0));
}

/// Serial merge of per-intersection plans through the corner index.
/// Crossing pairs whose corners deduplicated into one identity are
/// dropped. A degree-2 intersection keeps both of its crossings even
/// though they join the same two corners; the invariant is n crossings
/// for n incident streets.
fn merge_plans(
    graph: &RoadGraph,
    plans: Vec<(NodeIndex, IntersectionPlan)>,
) -> (CornerIndex, Vec<TrenchEdge>, Vec<SynthesisWarning>) {
    let mut index = CornerIndex::new();
    let mut crossings = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_warnings: HashSet<SynthesisWarning> = HashSet::new();

    for (node, plan) in plans {
        let intersection = graph.node(node).id;
        let slots: Vec<usize> = plan
            .corners
            .into_iter()
            .map(|corner| index.insert_or_reuse(intersection, corner))
            .collect();

        for (a, b) in plan.crossings {
            let (start, end) = (slots[a], slots[b]);
            if start == end {
                continue;
            }
            let (p, q) = (index.position(start), index.position(end));
            crossings.push(TrenchEdge {
                start: index.corners[start].id,
                end: index.corners[end].id,
                geometry: LineString::new(vec![p, q]),
                length: distance(p, q),
                kind: EdgeKind::Crossing,
            });
        }

        // The same duplicate-record condition is observed from both of its
        // endpoints; report it once.
        for warning in plan.warnings {
            if seen_warnings.insert(warning) {
                warnings.push(warning);
            }
        }
    }

    (index, crossings, warnings)
}
