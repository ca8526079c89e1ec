//! Segment geometry used by the sweep rejection tests
//!
//! All distances are squared to avoid square roots in the hot path.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A closed line segment from `a` to `b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSeg {
    pub a: DVec2,
    pub b: DVec2,
}

impl LineSeg {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    /// Vector from `a` to `b`
    #[inline]
    pub fn delta(&self) -> DVec2 {
        self.b - self.a
    }

    /// True when both endpoints coincide
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.delta() == DVec2::ZERO
    }
}

/// 2D cross product (z component of the 3D cross)
#[inline]
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Squared shortest distance between two segments, zero if they intersect
pub fn line_segs_distance_squared(l1: &LineSeg, l2: &LineSeg) -> f64 {
    if line_segs_intersect(l1, l2) {
        return 0.0;
    }
    point_line_seg_distance_squared(l1.a, l2)
        .min(point_line_seg_distance_squared(l1.b, l2))
        .min(point_line_seg_distance_squared(l2.a, l1))
        .min(point_line_seg_distance_squared(l2.b, l1))
}

/// Squared distance from a point to the closest point of a segment
pub fn point_line_seg_distance_squared(p: DVec2, l: &LineSeg) -> f64 {
    let ld = l.delta();
    if l.is_degenerate() {
        return (l.a - p).length_squared();
    }

    // Project onto the infinite line, then clamp onto the segment
    let t = ((p - l.a).dot(ld) / ld.length_squared()).clamp(0.0, 1.0);
    let closest = l.a + ld * t;
    (closest - p).length_squared()
}

/// Parametric segment intersection test
///
/// Parallel segments (including collinear overlapping ones) report no
/// intersection; callers fall back to endpoint distances.
pub fn line_segs_intersect(l1: &LineSeg, l2: &LineSeg) -> bool {
    let r = l1.delta();
    let s = l2.delta();
    let denom = cross(r, s);
    if denom == 0.0 {
        return false;
    }

    let q = l2.a - l1.a;
    let t = cross(q, s) / denom;
    let u = cross(q, r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> LineSeg {
        LineSeg::new(DVec2::new(ax, ay), DVec2::new(bx, by))
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let l1 = seg(-1.0, 0.0, 1.0, 0.0);
        let l2 = seg(0.0, -1.0, 0.0, 1.0);
        assert!(line_segs_intersect(&l1, &l2));
        assert_eq!(line_segs_distance_squared(&l1, &l2), 0.0);
    }

    #[test]
    fn test_touching_at_endpoint_intersects() {
        let l1 = seg(0.0, 0.0, 1.0, 0.0);
        let l2 = seg(1.0, 0.0, 1.0, 5.0);
        assert!(line_segs_intersect(&l1, &l2));
    }

    #[test]
    fn test_disjoint_segments_distance() {
        // T-shape with a gap of 2 between the stem tip and the bar
        let bar = seg(-5.0, 0.0, 5.0, 0.0);
        let stem = seg(0.0, 2.0, 0.0, 10.0);
        assert!(!line_segs_intersect(&bar, &stem));
        assert!((line_segs_distance_squared(&bar, &stem) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_overlapping_reports_no_intersection() {
        let l1 = seg(0.0, 0.0, 4.0, 0.0);
        let l2 = seg(1.0, 0.0, 3.0, 0.0);
        assert!(!line_segs_intersect(&l1, &l2));
        // Distance still resolves to zero through the endpoint checks
        assert_eq!(line_segs_distance_squared(&l1, &l2), 0.0);
    }

    #[test]
    fn test_point_distance_clamps_to_endpoints() {
        let l = seg(0.0, 0.0, 2.0, 0.0);
        assert!((point_line_seg_distance_squared(DVec2::new(-3.0, 4.0), &l) - 25.0).abs() < 1e-12);
        assert!((point_line_seg_distance_squared(DVec2::new(5.0, 0.0), &l) - 9.0).abs() < 1e-12);
        assert!((point_line_seg_distance_squared(DVec2::new(1.0, 3.0), &l) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let l = seg(1.0, 1.0, 1.0, 1.0);
        assert!(l.is_degenerate());
        assert!((point_line_seg_distance_squared(DVec2::new(4.0, 5.0), &l) - 25.0).abs() < 1e-12);
        let other = seg(-1.0, 1.0, 3.0, 1.0);
        assert!(!line_segs_intersect(&l, &other));
        assert_eq!(line_segs_distance_squared(&l, &other), 0.0);
    }
}
