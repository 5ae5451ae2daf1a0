//! Boundary offset: grows or shrinks a ring by a constant per-axis distance along local normals.
//!
//! The result is approximate. Concave rings offset by more than their local feature size may
//! self-intersect, nothing removes those intersections.

use log::debug;

use crate::geometry::polygon::contains_point;
use crate::geometry::Geometry;
use crate::spacial::{length, Position, Vector};

/// Chords shorter than this give no usable normal.
pub const DEGENERATE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetRing {
    pub points: Vec<Position>,
    /// Vertices left in place because their neighbours coincide.
    pub degenerate: usize,
}

/// Offset every point of `geometry` by `(sx - 1, sy - 1)` along its outward normal.
///
/// Identity factors and sequences with fewer than three points give an unchanged copy.
pub fn offset<'c>(geometry: &Geometry<'c>, sx: f64, sy: f64) -> Geometry<'c> {
    if (sx == 1.0 && sy == 1.0) || geometry.points().len() < 3 {
        return geometry.clone();
    }

    let ring = offset_ring(geometry.points(), sx, sy);
    if ring.degenerate > 0 {
        debug!(
            "degenerate vertices left in place. kind: {:?}, degenerate: {}, points: {}",
            geometry.kind(),
            ring.degenerate,
            ring.points.len()
        );
    }

    geometry.with_points(ring.points)
}

/// Offset the points of an implicitly closed ring, see [`offset`].
pub fn offset_ring(ring: &[Position], sx: f64, sy: f64) -> OffsetRing {
    let n = ring.len();
    if n < 3 {
        return OffsetRing {
            points: ring.to_vec(),
            degenerate: 0,
        };
    }

    let growth = Vector::new(sx - 1.0, sy - 1.0);
    let mut degenerate = 0;

    let points = (0..n)
        .map(|index| {
            let current = ring[index];
            match inward_normal(ring, index) {
                Some(inward) => current + Vector::new(-inward.x * growth.x, -inward.y * growth.y),
                None => {
                    degenerate += 1;
                    current
                }
            }
        })
        .collect();

    OffsetRing {
        points,
        degenerate,
    }
}

/// Unit normal at `index` pointing into the ring, from the chord between its neighbours.
fn inward_normal(ring: &[Position], index: usize) -> Option<Vector> {
    let n = ring.len();
    let previous = ring[(index + n - 1) % n];
    let next = ring[(index + 1) % n];

    let chord = next - previous;
    let chord_length = length(chord);
    if chord_length < DEGENERATE_EPSILON {
        return None;
    }

    let candidate = Vector::new(-chord.y, chord.x) / chord_length;
    let probe = ring[index] + candidate * (chord_length / 2.0).min(1.0);

    match contains_point(ring, probe) {
        true => Some(candidate),
        false => Some(-candidate),
    }
}
