//! Predicates and measures on closed point rings. Rings are implicitly closed, the last point
//! connects back to the first.

use crate::spacial::Position;

/// Even-odd ray cast. Points exactly on an edge may classify either way.
pub fn contains_point(ring: &[Position], point: Position) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (pi, pj) = (ring[i], ring[j]);
        if ((pi.y > point.y) != (pj.y > point.y)) && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Shoelace area, positive for counter-clockwise rings.
pub fn signed_area(ring: &[Position]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let sum: f64 = (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();

    sum / 2.0
}

/// Area centroid, or the vertex mean when the ring has no area. `None` for an empty ring.
pub fn centroid(ring: &[Position]) -> Option<Position> {
    if ring.is_empty() {
        return None;
    }

    let area = signed_area(ring);
    if area.abs() <= f64::EPSILON {
        let count = ring.len() as f64;
        let (sum_x, sum_y) = ring
            .iter()
            .fold((0.0, 0.0), |(x, y), point| (x + point.x, y + point.y));
        return Some(Position::new(sum_x / count, sum_y / count));
    }

    let n = ring.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    Some(Position::new(cx / (6.0 * area), cy / (6.0 * area)))
}

pub fn is_convex(vertices: &[Position]) -> bool {
    if vertices.len() < 3 {
        return true;
    }

    let n = vertices.len();
    let mut sign = 0;

    for i in 0..n {
        let p1 = vertices[i];
        let p2 = vertices[(i + 1) % n];
        let p3 = vertices[(i + 2) % n];

        let v1 = p2 - p1;
        let v2 = p3 - p2;

        let cross = v1.x * v2.y - v1.y * v2.x;
        if cross == 0.0 {
            continue;
        }

        if sign == 0 {
            sign = if cross > 0.0 { 1 } else { -1 };
        } else if (cross > 0.0 && sign < 0) || (cross < 0.0 && sign > 0) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::testing::{assert_position_near, square, star};

    #[rstest]
    #[case(Position::new(0.0, 0.0), true)]
    #[case(Position::new(0.9, -0.9), true)]
    #[case(Position::new(1.1, 0.0), false)]
    #[case(Position::new(0.0, -5.0), false)]
    fn test_contains_point_square(#[case] point: Position, #[case] expected: bool) {
        let ring = square(Position::new(0.0, 0.0), 2.0);
        assert_eq!(contains_point(&ring, point), expected);
    }

    #[test]
    fn test_contains_point_concave() {
        // given
        let ring = star(Position::new(0.0, 0.0), 1.0, 0.4);

        // expect
        assert!(contains_point(&ring, Position::new(0.0, 0.0)));
        assert!(contains_point(&ring, Position::new(0.0, 0.9)));
        // between two points of the star
        assert!(!contains_point(&ring, Position::new(0.55, 0.75)));
    }

    #[test]
    fn test_degenerate_ring_contains_nothing() {
        let ring = vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0)];
        assert!(!contains_point(&ring, Position::new(0.5, 0.5)));
    }

    #[test]
    fn test_signed_area_follows_winding() {
        // given
        let ring = square(Position::new(3.0, 3.0), 2.0);
        let reversed: Vec<Position> = ring.iter().rev().copied().collect();

        // expect
        assert_eq!(signed_area(&ring), 4.0);
        assert_eq!(signed_area(&reversed), -4.0);
    }

    #[test]
    fn test_centroid() {
        // given
        let l_shape = vec![
            Position::new(0.0, 0.0),
            Position::new(2.0, 0.0),
            Position::new(2.0, 1.0),
            Position::new(1.0, 1.0),
            Position::new(1.0, 2.0),
            Position::new(0.0, 2.0),
        ];

        // when
        let center = centroid(&l_shape).unwrap();

        // then
        assert_position_near(center, Position::new(5.0 / 6.0, 5.0 / 6.0));
    }

    #[test]
    fn test_centroid_of_zero_area_ring_is_vertex_mean() {
        let line = vec![Position::new(0.0, 0.0), Position::new(2.0, 2.0)];
        assert_eq!(centroid(&line), Some(Position::new(1.0, 1.0)));
        assert_eq!(centroid(&[]), None);
    }

    #[rstest]
    #[case(square(Position::new(0.0, 0.0), 1.0), true)]
    #[case(star(Position::new(0.0, 0.0), 1.0, 0.4), false)]
    fn test_is_convex(#[case] ring: Vec<Position>, #[case] expected: bool) {
        assert_eq!(is_convex(&ring), expected);
    }
}
