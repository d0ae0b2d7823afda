//! Planar geometric primitives for trench synthesis.
//!
//! Pure functions over `geo` coordinates, with no knowledge of the road
//! graph. Coordinates are planar `f64` pairs; all offset output is rounded
//! to a fixed decimal grid so corner identity is deterministic across
//! platforms.

use std::f64::consts::PI;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Offset output is rounded to this many decimal places. The same grid
/// backs corner identity, so corners derived twice from the same inputs
/// hash to the same key.
pub const COORD_DECIMALS: i32 = 7;

/// Substitute length for zero-length sub-segments, keeping the
/// perpendicular direction defined.
const MIN_SEGMENT_LENGTH: f64 = 1e-5;

/// Collinearity tolerance for [`segment_contains`].
const COLLINEAR_EPS: f64 = 5e-8;

/// One of the two half-planes relative to a street's direction vector.
///
/// Used during synthesis to group trench candidates that run on opposite
/// sides of a road. The discriminants match the sign convention of
/// [`signed_side`]: a positive signed distance is [`Side::Right`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Classifies a point by its signed distance from a directed line.
    pub fn of(line: (Coord<f64>, Coord<f64>), point: Coord<f64>) -> Self {
        if signed_side(line, point) > 0.0 {
            Side::Right
        } else {
            Side::Left
        }
    }
}

/// Rounds a coordinate value to the shared decimal grid.
pub(crate) fn round_coord(value: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    (value * scale).round() / scale
}

/// Rounds both components of a position to the shared decimal grid.
pub(crate) fn round_position(position: Coord<f64>) -> Coord<f64> {
    Coord {
        x: round_coord(position.x),
        y: round_coord(position.y),
    }
}

/// Euclidean distance between two points.
pub fn distance(p: Coord<f64>, q: Coord<f64>) -> f64 {
    (q.x - p.x).hypot(q.y - p.y)
}

/// Total length of a polyline given as a coordinate slice.
pub fn polyline_length(coords: &[Coord<f64>]) -> f64 {
    coords.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Cross-product signed distance from `point` to the infinite line through
/// `line.0` and `line.1`. Only the sign is meaningful; it selects one of
/// the two sides of a street.
pub fn signed_side(line: (Coord<f64>, Coord<f64>), point: Coord<f64>) -> f64 {
    (point.x - line.0.x) * (line.1.y - line.0.y) - (point.y - line.0.y) * (line.1.x - line.0.x)
}

/// Clockwise angle in `[0, 2π)` from `v1` to `v2`, in radians.
///
/// `acos` of the normalized inner product only resolves the angle up to a
/// half-plane; when `v2.y < v1.y` the reflex side applies and the result
/// becomes `2π - acos(..)`. The comparison is strict: at `v2.y == v1.y`
/// the plain `acos` branch is taken.
pub fn clockwise_angle(v1: (f64, f64), v2: (f64, f64)) -> f64 {
    let inner = v1.0 * v2.0 + v1.1 * v2.1;
    let len1 = v1.0.hypot(v1.1);
    let len2 = v2.0.hypot(v2.1);
    // Guard against |cos| creeping past 1 from rounding, which would NaN.
    let cos = (inner / (len1 * len2)).clamp(-1.0, 1.0);
    if v2.1 < v1.1 {
        2.0 * PI - cos.acos()
    } else {
        cos.acos()
    }
}

/// Point on the circle around `center` with the given radius, at `radian`
/// measured counter-clockwise from the positive x axis.
pub fn point_on_circle(center: Coord<f64>, radius: f64, radian: f64) -> Coord<f64> {
    Coord {
        x: center.x + radius * radian.cos(),
        y: center.y + radius * radian.sin(),
    }
}

/// Translates segment `u -> v` perpendicular to itself by `offset`, on the
/// chosen side. The two sides are mirror images of each other.
///
/// A zero-length input segment substitutes [`MIN_SEGMENT_LENGTH`] so the
/// offset direction stays defined. Output is rounded to the shared grid.
pub fn parallel_offset(
    u: Coord<f64>,
    v: Coord<f64>,
    offset: f64,
    side: Side,
) -> (Coord<f64>, Coord<f64>) {
    let dx = u.x - v.x;
    let dy = u.y - v.y;

    let mut length = dx.hypot(dy);
    if length == 0.0 {
        length = MIN_SEGMENT_LENGTH;
    }
    let t = offset / length;

    let (px, py) = match side {
        Side::Right => (-dy, dx),
        Side::Left => (dy, -dx),
    };

    let offset_u = Coord {
        x: round_coord(u.x + t * px),
        y: round_coord(u.y + t * py),
    };
    let offset_v = Coord {
        x: round_coord(v.x + t * px),
        y: round_coord(v.y + t * py),
    };
    (offset_u, offset_v)
}

/// Intersection of the two infinite lines through `l1` and `l2`, by the
/// determinant method.
///
/// # Errors
///
/// [`GeometryError::DegenerateLines`] when the lines are parallel or
/// coincident (zero determinant).
pub fn line_intersection(
    l1: (Coord<f64>, Coord<f64>),
    l2: (Coord<f64>, Coord<f64>),
) -> Result<Coord<f64>, GeometryError> {
    let det = |a: (f64, f64), b: (f64, f64)| a.0 * b.1 - a.1 * b.0;

    let xdiff = (l1.0.x - l1.1.x, l2.0.x - l2.1.x);
    let ydiff = (l1.0.y - l1.1.y, l2.0.y - l2.1.y);

    let div = det(xdiff, ydiff);
    if div == 0.0 {
        return Err(GeometryError::DegenerateLines);
    }

    let d = (
        det((l1.0.x, l1.0.y), (l1.1.x, l1.1.y)),
        det((l2.0.x, l2.0.y), (l2.1.x, l2.1.y)),
    );
    Ok(Coord {
        x: det(d, xdiff) / div,
        y: det(d, ydiff) / div,
    })
}

/// True iff `c` lies on segment `a -> b`, within a small tolerance for the
/// collinearity check and with the projection clamped to `[0, |b-a|²]`.
pub fn segment_contains(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> bool {
    let cross = (c.y - a.y) * (b.x - a.x) - (c.x - a.x) * (b.y - a.y);
    if cross.abs() > COLLINEAR_EPS {
        return false;
    }

    let dot = (c.x - a.x) * (b.x - a.x) + (c.y - a.y) * (b.y - a.y);
    if dot < 0.0 {
        return false;
    }

    let length_sq = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    dot <= length_sq
}

/// True when the infinite line through `candidate` crosses the street
/// segment `street` within the street's own extent. Parallel lines count
/// as non-crossing; the caller is rejecting self-intersecting trench
/// candidates, and a parallel candidate never intersects the street.
pub fn crosses_segment(street: (Coord<f64>, Coord<f64>), candidate: (Coord<f64>, Coord<f64>)) -> bool {
    match line_intersection(street, candidate) {
        Ok(point) => segment_contains(street.0, street.1, point),
        Err(GeometryError::DegenerateLines) => false,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn distance_is_euclidean() {
        assert_relative_eq!(distance(c(0.0, 0.0), c(3.0, 4.0)), 5.0);
    }

    #[test]
    fn signed_side_separates_half_planes() {
        let line = (c(0.0, 0.0), c(1.0, 0.0));
        assert!(signed_side(line, c(0.5, -1.0)) > 0.0);
        assert!(signed_side(line, c(0.5, 1.0)) < 0.0);
        assert_eq!(signed_side(line, c(0.5, 0.0)), 0.0);
        assert_eq!(Side::of(line, c(0.5, -1.0)), Side::Right);
        assert_eq!(Side::of(line, c(0.5, 1.0)), Side::Left);
    }

    #[test]
    fn clockwise_angle_quadrants() {
        let east = (1.0, 0.0);
        assert_relative_eq!(clockwise_angle(east, (0.0, 1.0)), PI / 2.0);
        assert_relative_eq!(clockwise_angle(east, (-1.0, 0.0)), PI);
        assert_relative_eq!(clockwise_angle(east, (0.0, -1.0)), 3.0 * PI / 2.0);
        assert_relative_eq!(clockwise_angle(east, (1.0, 0.0)), 0.0);
    }

    #[test]
    fn clockwise_angle_does_not_nan_on_rounding() {
        // Nearly parallel vectors can push the normalized inner product a
        // hair past 1.0.
        let a = (0.1 + 0.2, 0.0);
        let b = (0.3, 0.0);
        assert!(clockwise_angle(a, b).is_finite());
    }

    proptest! {
        // Pins the open question about the `y2 < y1` branch boundary: with
        // equal y components the plain acos branch applies, so the result
        // stays in [0, π].
        #[test]
        fn equal_y_components_take_acos_branch(
            x1 in -100.0f64..100.0,
            x2 in -100.0f64..100.0,
            y in -100.0f64..100.0,
        ) {
            prop_assume!(x1.hypot(y) > 1e-9 && x2.hypot(y) > 1e-9);
            let angle = clockwise_angle((x1, y), (x2, y));
            prop_assert!((0.0..=PI).contains(&angle));
        }

        #[test]
        fn angle_is_in_range(
            x1 in -100.0f64..100.0, y1 in -100.0f64..100.0,
            x2 in -100.0f64..100.0, y2 in -100.0f64..100.0,
        ) {
            prop_assume!(x1.hypot(y1) > 1e-9 && x2.hypot(y2) > 1e-9);
            let angle = clockwise_angle((x1, y1), (x2, y2));
            prop_assert!(angle >= 0.0 && angle <= 2.0 * PI);
        }
    }

    #[test]
    fn point_on_circle_cardinal_directions() {
        let center = c(1.0, 2.0);
        let p = point_on_circle(center, 2.0, PI / 2.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 4.0);
    }

    #[test]
    fn parallel_offset_sides_mirror() {
        let (u0, v0) = parallel_offset(c(0.0, 0.0), c(1.0, 0.0), 0.5, Side::Left);
        let (u1, v1) = parallel_offset(c(0.0, 0.0), c(1.0, 0.0), 0.5, Side::Right);
        assert_relative_eq!(u0.y, 0.5);
        assert_relative_eq!(v0.y, 0.5);
        assert_relative_eq!(u1.y, -0.5);
        assert_relative_eq!(v1.y, -0.5);
        assert_relative_eq!(u0.x, 0.0);
        assert_relative_eq!(v1.x, 1.0);
    }

    #[test]
    fn parallel_offset_zero_length_segment_stays_finite() {
        let (u, v) = parallel_offset(c(2.0, 3.0), c(2.0, 3.0), 0.1, Side::Left);
        assert!(u.x.is_finite() && u.y.is_finite());
        assert!(v.x.is_finite() && v.y.is_finite());
    }

    #[test]
    fn parallel_offset_rounds_to_grid() {
        let (u, _) = parallel_offset(c(0.0, 0.0), c(3.0, 1.0), 0.1, Side::Left);
        assert_eq!(u.x, round_coord(u.x));
        assert_eq!(u.y, round_coord(u.y));
    }

    #[test]
    fn line_intersection_perpendicular() {
        let p = line_intersection((c(0.0, 0.0), c(2.0, 0.0)), (c(1.0, -1.0), c(1.0, 1.0))).unwrap();
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 0.0);
    }

    #[test]
    fn line_intersection_parallel_is_degenerate() {
        let result = line_intersection((c(0.0, 0.0), c(1.0, 0.0)), (c(0.0, 1.0), c(1.0, 1.0)));
        assert_eq!(result, Err(GeometryError::DegenerateLines));
    }

    #[test]
    fn segment_contains_endpoints_and_interior() {
        let (a, b) = (c(0.0, 0.0), c(2.0, 2.0));
        assert!(segment_contains(a, b, c(1.0, 1.0)));
        assert!(segment_contains(a, b, a));
        assert!(segment_contains(a, b, b));
        assert!(!segment_contains(a, b, c(3.0, 3.0)));
        assert!(!segment_contains(a, b, c(-0.5, -0.5)));
        assert!(!segment_contains(a, b, c(1.0, 1.5)));
    }

    #[test]
    fn crosses_segment_detects_crossing_candidates() {
        let street = (c(0.0, 0.0), c(2.0, 0.0));
        // Candidate cutting diagonally across the street.
        assert!(crosses_segment(street, (c(1.0, -1.0), c(1.0, 1.0))));
        // Candidate running parallel alongside the street.
        assert!(!crosses_segment(street, (c(0.0, 0.5), c(2.0, 0.5))));
        // Candidate whose line meets the street's line beyond its extent.
        assert!(!crosses_segment(street, (c(5.0, -1.0), c(5.0, 1.0))));
    }

    #[test]
    fn polyline_length_sums_segments() {
        let coords = [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 2.0)];
        assert_relative_eq!(polyline_length(&coords), 3.0);
    }
}
