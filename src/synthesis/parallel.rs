//! Parallel-trench synthesis: for each street segment, build trench
//! candidates running alongside the road on each of its two sides.
//!
//! Straight streets pair up the corners bounding the segment; curved
//! streets walk the vertex geometry building a mitered offset polyline
//! anchored to the nearest corner at both ends. Runs strictly after the
//! corner phase, since every candidate is anchored to existing corners.

use geo::Coord;
use hashbrown::HashSet;
use itertools::Itertools;
use log::warn;
use petgraph::graph::{EdgeIndex, NodeIndex};
use rayon::prelude::*;

use super::corners::CornerIndex;
use super::report::SynthesisWarning;
use crate::GeometryError;
use crate::geometry::{
    Side, crosses_segment, distance, line_intersection, parallel_offset, polyline_length,
    round_position,
};
use crate::model::{OsmNodeId, RoadGraph, SegmentId};

/// A not-yet-resolved parallel trench. Competing candidates for the same
/// `(segment, side)` are reduced to the shortest by the resolver.
#[derive(Debug, Clone)]
pub(crate) struct TrenchCandidate {
    pub segment: SegmentId,
    pub side: Side,
    /// Corner slots in the [`CornerIndex`], start at one intersection and
    /// end at the other.
    pub start: usize,
    pub end: usize,
    pub geometry: Vec<Coord<f64>>,
    pub length: f64,
}

/// Trench phase: builds candidates for every street segment in parallel.
/// Duplicate edge records for a segment are skipped; the first record (the
/// lowest edge index, matching the corner phase) is the one processed.
pub(crate) fn synthesize_trenches(
    graph: &RoadGraph,
    index: &CornerIndex,
    offset: f64,
) -> (Vec<TrenchCandidate>, Vec<SynthesisWarning>) {
    let mut seen: HashSet<SegmentId> = HashSet::new();
    let mut work: Vec<(EdgeIndex, NodeIndex, NodeIndex, SegmentId)> = Vec::new();
    for edge in graph.graph.edge_indices() {
        if !graph.graph[edge].is_street() {
            continue;
        }
        let Some((u, v)) = graph.graph.edge_endpoints(edge) else {
            continue;
        };
        if u == v {
            continue;
        }
        let segment = graph.segment_id(u, v);
        if seen.insert(segment) {
            work.push((edge, u, v, segment));
        }
    }

    let results: Vec<(Vec<TrenchCandidate>, Vec<SynthesisWarning>)> = work
        .into_par_iter()
        .map(|(edge, u, v, segment)| process_segment(graph, index, offset, edge, u, v, segment))
        .collect();

    let mut candidates = Vec::new();
    let mut warnings = Vec::new();
    for (segment_candidates, segment_warnings) in results {
        candidates.extend(segment_candidates);
        warnings.extend(segment_warnings);
    }
    (candidates, warnings)
}

fn process_segment(
    graph: &RoadGraph,
    index: &CornerIndex,
    offset: f64,
    edge: EdgeIndex,
    u: NodeIndex,
    v: NodeIndex,
    segment: SegmentId,
) -> (Vec<TrenchCandidate>, Vec<SynthesisWarning>) {
    let Some(bucket) = index.by_street.get(&segment) else {
        // No corners were placed for this segment; nothing to anchor to.
        return (Vec::new(), Vec::new());
    };

    let u_id = graph.node(u).id;
    let v_id = graph.node(v).id;

    if graph.graph[edge].is_curved() {
        let coords = graph.oriented_geometry(edge, u);
        curved_candidates(index, offset, segment, &coords, u_id, v_id, bucket)
    } else {
        let street = (graph.coord(u), graph.coord(v));
        (
            straight_candidates(index, segment, street, u_id, v_id, bucket),
            Vec::new(),
        )
    }
}

/// Straight street: every cross-intersection pair of same-side corners is
/// a candidate, unless its line crosses the street itself. Pairs between
/// corners of the same intersection are crossings, not trenches, and are
/// excluded.
fn straight_candidates(
    index: &CornerIndex,
    segment: SegmentId,
    street: (Coord<f64>, Coord<f64>),
    u_id: OsmNodeId,
    v_id: OsmNodeId,
    bucket: &[usize],
) -> Vec<TrenchCandidate> {
    let mut sides: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for &slot in bucket {
        let corner = &index.corners[slot];
        if corner.intersection != u_id && corner.intersection != v_id {
            continue;
        }
        sides[Side::of(street, corner.coord()) as usize].push(slot);
    }

    let mut candidates = Vec::new();
    // Order-independent endpoint dedup, shared across both sides.
    let mut added: HashSet<(usize, usize)> = HashSet::new();
    for side in Side::BOTH {
        let mut slots = sides[side as usize].clone();
        slots.sort_unstable();
        for (a, b) in slots.iter().copied().tuple_combinations() {
            if index.corners[a].intersection == index.corners[b].intersection {
                continue;
            }
            let (start, end) = (index.position(a), index.position(b));
            if crosses_segment(street, (start, end)) || !added.insert((a, b)) {
                continue;
            }
            candidates.push(TrenchCandidate {
                segment,
                side,
                start: a,
                end: b,
                geometry: vec![start, end],
                length: distance(start, end),
            });
        }
    }
    candidates
}

/// Curved street: offsets each geometry sub-segment, joins consecutive
/// offsets at the exact intersection of their lines (miter join), and
/// snaps the first and last points to the nearest corner on that side.
///
/// The corners at each end are partitioned into sides using the boundary
/// sub-segment nearest that end, since the street's overall chord may
/// point elsewhere entirely.
fn curved_candidates(
    index: &CornerIndex,
    offset: f64,
    segment: SegmentId,
    coords: &[Coord<f64>],
    u_id: OsmNodeId,
    v_id: OsmNodeId,
    bucket: &[usize],
) -> (Vec<TrenchCandidate>, Vec<SynthesisWarning>) {
    let first_segment = (coords[0], coords[1]);
    let last_segment = (coords[coords.len() - 2], coords[coords.len() - 1]);

    let mut u_sides: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    let mut v_sides: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for &slot in bucket {
        let corner = &index.corners[slot];
        if corner.intersection == u_id {
            u_sides[Side::of(first_segment, corner.coord()) as usize].push(slot);
        } else if corner.intersection == v_id {
            v_sides[Side::of(last_segment, corner.coord()) as usize].push(slot);
        }
    }

    let mut candidates = Vec::new();
    let mut warnings = Vec::new();
    for side in Side::BOTH {
        let u_side = &u_sides[side as usize];
        let v_side = &v_sides[side as usize];
        if u_side.is_empty() || v_side.is_empty() {
            warn!("no anchor corners on side {side:?} of {segment:?}");
            warnings.push(SynthesisWarning::MissingSideCorners { segment, side });
            continue;
        }
        candidates.push(walk_offset_polyline(
            index, offset, segment, coords, side, u_side, v_side,
        ));
    }
    (candidates, warnings)
}

/// Builds one side's mitered offset polyline along a curved street.
fn walk_offset_polyline(
    index: &CornerIndex,
    offset: f64,
    segment: SegmentId,
    coords: &[Coord<f64>],
    side: Side,
    u_side: &[usize],
    v_side: &[usize],
) -> TrenchCandidate {
    let mut line: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    let mut last_line: Option<(Coord<f64>, Coord<f64>)> = None;
    let mut start = 0;

    for window in coords.windows(2) {
        let (mut a, b) = parallel_offset(window[0], window[1], offset, side);
        match last_line {
            Some(previous) => match line_intersection(previous, (a, b)) {
                Ok(miter) => a = round_position(miter),
                // Collinear join: the raw offset point already continues
                // the previous offset line.
                Err(GeometryError::DegenerateLines) => {}
            },
            None => {
                // Anchor the trench to an already-placed corner instead of
                // a free-floating offset point.
                start = nearest_corner(index, u_side, a);
                a = index.position(start);
            }
        }
        line.push(a);
        last_line = Some((a, b));
    }

    let tail = last_line.map_or(coords[coords.len() - 1], |(_, b)| b);
    let end = nearest_corner(index, v_side, tail);
    line.push(index.position(end));

    let length = polyline_length(&line);
    TrenchCandidate {
        segment,
        side,
        start,
        end,
        geometry: line,
        length,
    }
}

/// The corner slot closest to `point`; ties keep the lowest slot, so
/// snapping is deterministic.
fn nearest_corner(index: &CornerIndex, slots: &[usize], point: Coord<f64>) -> usize {
    let mut sorted = slots.to_vec();
    sorted.sort_unstable();

    let mut best = sorted[0];
    let mut best_distance = distance(index.position(best), point);
    for &slot in &sorted[1..] {
        let candidate_distance = distance(index.position(slot), point);
        if candidate_distance < best_distance {
            best = slot;
            best_distance = candidate_distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::line_string;

    use super::*;
    use crate::synthesis::corners::synthesize_corners;

    const D: f64 = 0.1;

    /// One street between two dead ends, along +x.
    fn straight_street_graph() -> RoadGraph {
        let mut graph = RoadGraph::new();
        let u = graph.add_intersection(OsmNodeId(1), 0.0, 0.0);
        let v = graph.add_intersection(OsmNodeId(2), 1.0, 0.0);
        graph.add_straight_street(u, v);
        graph
    }

    #[test]
    fn straight_street_yields_one_candidate_per_side() {
        let graph = straight_street_graph();
        let (index, _, _) = synthesize_corners(&graph, D);
        let (candidates, warnings) = synthesize_trenches(&graph, &index, D);

        assert!(warnings.is_empty());
        assert_eq!(candidates.len(), 2);
        let mut sides: Vec<Side> = candidates.iter().map(|c| c.side).collect();
        sides.sort();
        assert_eq!(sides, vec![Side::Left, Side::Right]);
        for candidate in &candidates {
            assert_relative_eq!(candidate.length, 1.0, epsilon = 1e-6);
            // The trench runs alongside the street, never across it.
            assert!(!crosses_segment(
                (Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }),
                (candidate.geometry[0], candidate.geometry[1]),
            ));
            assert_ne!(
                index.corners[candidate.start].intersection,
                index.corners[candidate.end].intersection
            );
        }
    }

    #[test]
    fn same_intersection_pairs_are_excluded() {
        let graph = straight_street_graph();
        let (index, _, _) = synthesize_corners(&graph, D);
        let (candidates, _) = synthesize_trenches(&graph, &index, D);

        // 4 corners bound the street; of the 6 unordered pairs only the 2
        // same-side cross-intersection ones become candidates.
        assert_eq!(index.corners.len(), 4);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn l_shaped_street_miters_the_bend() {
        let mut graph = RoadGraph::new();
        let u = graph.add_intersection(OsmNodeId(1), 0.0, 0.0);
        let v = graph.add_intersection(OsmNodeId(2), 1.0, 1.0);
        graph.add_street(
            u,
            v,
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        );

        let (index, _, _) = synthesize_corners(&graph, D);
        let (candidates, warnings) = synthesize_trenches(&graph, &index, D);
        assert!(warnings.is_empty());
        assert_eq!(candidates.len(), 2);

        // Inner side: trench cuts the corner at (1-d, d).
        let inner = candidates.iter().find(|c| c.side == Side::Left).unwrap();
        assert_eq!(inner.geometry.len(), 3);
        assert_relative_eq!(inner.geometry[1].x, 1.0 - D, epsilon = 1e-6);
        assert_relative_eq!(inner.geometry[1].y, D, epsilon = 1e-6);
        assert_relative_eq!(inner.length, 2.0 * (1.0 - D), epsilon = 1e-6);

        // Outer side: miter lands at (1+d, -d).
        let outer = candidates.iter().find(|c| c.side == Side::Right).unwrap();
        assert_relative_eq!(outer.geometry[1].x, 1.0 + D, epsilon = 1e-6);
        assert_relative_eq!(outer.geometry[1].y, -D, epsilon = 1e-6);
        assert_relative_eq!(outer.length, 2.0 * (1.0 + D), epsilon = 1e-6);
    }

    #[test]
    fn two_point_geometry_matches_straight_construction() {
        let graph = straight_street_graph();
        let (index, _, _) = synthesize_corners(&graph, D);
        let segment = SegmentId::new(OsmNodeId(1), OsmNodeId(2));
        let bucket = index.by_street[&segment].clone();
        let street = (Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 });

        let straight =
            straight_candidates(&index, segment, street, OsmNodeId(1), OsmNodeId(2), &bucket);
        let (curved, warnings) = curved_candidates(
            &index,
            D,
            segment,
            &[street.0, street.1],
            OsmNodeId(1),
            OsmNodeId(2),
            &bucket,
        );

        assert!(warnings.is_empty());
        assert_eq!(straight.len(), curved.len());
        for side in Side::BOTH {
            let s = straight.iter().find(|c| c.side == side).unwrap();
            let c = curved.iter().find(|c| c.side == side).unwrap();
            assert_eq!(
                (s.start, s.end),
                (c.start.min(c.end), c.start.max(c.end)),
                "endpoints diverge on {side:?}"
            );
            assert_relative_eq!(s.length, c.length, epsilon = 1e-9);
        }
    }

    #[test]
    fn missing_side_corners_is_reported_per_side() {
        let graph = straight_street_graph();
        let (index, _, _) = synthesize_corners(&graph, D);
        let segment = SegmentId::new(OsmNodeId(1), OsmNodeId(2));
        // Only u-side corners are offered; every side lacks a v anchor.
        let bucket: Vec<usize> = index.by_street[&segment]
            .iter()
            .copied()
            .filter(|&slot| index.corners[slot].intersection == OsmNodeId(1))
            .collect();

        let (candidates, warnings) = curved_candidates(
            &index,
            D,
            segment,
            &[
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 0.5, y: 0.1 },
                Coord { x: 1.0, y: 0.0 },
            ],
            OsmNodeId(1),
            OsmNodeId(2),
            &bucket,
        );

        assert!(candidates.is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| matches!(
            w,
            SynthesisWarning::MissingSideCorners { segment: s, .. } if *s == segment
        )));
    }

    #[test]
    fn corner_on_street_line_is_rejected_as_crossing() {
        let mut index = CornerIndex::new();
        let segment = SegmentId::new(OsmNodeId(1), OsmNodeId(2));
        let street = (Coord { x: 0.0, y: 0.0 }, Coord { x: 2.0, y: 0.0 });
        for (intersection, position) in [
            (OsmNodeId(1), Coord { x: 0.0, y: 0.1 }),
            // Collinear with the street: any trench through it crosses.
            (OsmNodeId(2), Coord { x: 2.0, y: 0.0 }),
        ] {
            index.insert_or_reuse(
                intersection,
                crate::synthesis::corners::PlannedCorner {
                    position,
                    streets: vec![segment],
                },
            );
        }

        let bucket = index.by_street[&segment].clone();
        let candidates =
            straight_candidates(&index, segment, street, OsmNodeId(1), OsmNodeId(2), &bucket);
        assert!(candidates.is_empty());
    }
}
