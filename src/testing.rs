use std::f64::consts::PI;

use crate::spacial::Position;

pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Wrap `body` with a 2.4 leading-zero millimeter header and a program end.
pub fn gerber_program(body: &str) -> String {
    format!("%FSLAX24Y24*%\n%MOMM*%\n{}\nM02*\n", body)
}

pub fn assert_near(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < DEFAULT_EPSILON,
        "expected {}, got {}",
        expected,
        actual
    );
}

pub fn assert_position_near(actual: Position, expected: Position) {
    assert!(
        (actual.x - expected.x).abs() < DEFAULT_EPSILON && (actual.y - expected.y).abs() < DEFAULT_EPSILON,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Axis aligned square ring, counter-clockwise from the bottom-left corner.
pub fn square(center: Position, size: f64) -> Vec<Position> {
    let half = size / 2.0;
    vec![
        Position::new(center.x - half, center.y - half),
        Position::new(center.x + half, center.y - half),
        Position::new(center.x + half, center.y + half),
        Position::new(center.x - half, center.y + half),
    ]
}

pub fn regular_polygon(center: Position, radius: f64, vertices: usize) -> Vec<Position> {
    (0..vertices)
        .map(|index| {
            let angle = 2.0 * PI * index as f64 / vertices as f64;
            Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Five pointed star ring, starting at the top point, alternating between outer and inner radius.
pub fn star(center: Position, outer_radius: f64, inner_radius: f64) -> Vec<Position> {
    let angle_step = (2.0 * PI) / 10.0;

    (0..10)
        .map(|index| {
            let radius = if index % 2 == 0 { outer_radius } else { inner_radius };
            let angle = angle_step * index as f64 + PI / 2.0;
            Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_points() {
        // when
        let points = star(Position::new(0.0, 0.0), 1.0, 0.5);

        // then
        assert_eq!(points.len(), 10);
        assert_position_near(points[0], Position::new(0.0, 1.0));
        assert_position_near(points[5], Position::new(0.0, -0.5));
    }

    #[test]
    fn square_points() {
        let points = square(Position::new(1.0, 1.0), 2.0);
        assert_eq!(points[0], Position::new(0.0, 0.0));
        assert_eq!(points[2], Position::new(2.0, 2.0));
    }
}
