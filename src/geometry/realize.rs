//! Converts commands into point sequences in millimeters.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use log::{error, trace};

use crate::aperture::{ApertureShape, MacroAperture};
use crate::geometry::{Geometry, GeometryKind};
use crate::macros::{BuiltinMacroEvaluator, MacroEvaluator, MacroShape};
use crate::parser::Command;
use crate::spacial::{length, Position, Rotate, ToVector, Vector};
use crate::types::{Exposure, Units};

const EPSILON: f64 = 1e-12;

/// Sampling resolutions, in points per shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealizeOptions {
    /// Outline points for a flashed standard aperture.
    pub flash_resolution: usize,
    pub arc_resolution: usize,
    pub macro_circle_resolution: usize,
    pub macro_arc_resolution: usize,
}

impl Default for RealizeOptions {
    fn default() -> Self {
        Self {
            flash_resolution: 128,
            arc_resolution: 64,
            macro_circle_resolution: 64,
            macro_arc_resolution: 32,
        }
    }
}

pub struct Realizer<'e> {
    options: RealizeOptions,
    evaluator: &'e dyn MacroEvaluator,
}

impl Default for Realizer<'static> {
    fn default() -> Self {
        Self {
            options: RealizeOptions::default(),
            evaluator: &BuiltinMacroEvaluator,
        }
    }
}

impl<'e> Realizer<'e> {
    pub fn new(options: RealizeOptions, evaluator: &'e dyn MacroEvaluator) -> Self {
        Self {
            options,
            evaluator,
        }
    }

    pub fn options(&self) -> &RealizeOptions {
        &self.options
    }

    #[profiling::function]
    pub fn realize_all<'c>(&self, commands: &'c [Command]) -> Vec<Geometry<'c>> {
        let geometries: Vec<Geometry<'c>> = commands
            .iter()
            .flat_map(|command| self.realize(command))
            .collect();
        trace!("realized. commands: {}, geometries: {}", commands.len(), geometries.len());
        geometries
    }

    /// One geometry per command, except macro flashes which yield one per primitive.
    pub fn realize<'c>(&self, command: &'c Command) -> Vec<Geometry<'c>> {
        match command {
            Command::Flash {
                position,
                aperture,
            } => match &aperture.shape {
                ApertureShape::Macro(macro_aperture) => {
                    self.realize_macro(command, *position, macro_aperture, aperture.units)
                }
                shape => {
                    let points = standard_outline(shape, self.options.flash_resolution)
                        .into_iter()
                        .map(|point| point + position.to_vector())
                        .collect();
                    vec![Geometry::new(GeometryKind::FlashAperture, points, true, Exposure::Add, command)]
                }
            },
            Command::Draw {
                path, ..
            } => vec![Geometry::new(GeometryKind::Draw, path.clone(), false, Exposure::Add, command)],
            Command::Region {
                polygon,
            } => vec![Geometry::new(GeometryKind::Region, polygon.clone(), true, Exposure::Add, command)],
            Command::Arc {
                start,
                end,
                center_offset,
                clockwise,
                ..
            } => {
                let points = arc_points(
                    *start,
                    *end,
                    start + center_offset,
                    *clockwise,
                    self.options.arc_resolution,
                );
                vec![Geometry::new(GeometryKind::Arc, points, false, Exposure::Add, command)]
            }
        }
    }

    fn realize_macro<'c>(
        &self,
        command: &'c Command,
        position: Position,
        aperture: &MacroAperture,
        units: Units,
    ) -> Vec<Geometry<'c>> {
        let shapes = match self
            .evaluator
            .evaluate(&aperture.program, &aperture.params)
        {
            Ok(shapes) => shapes,
            Err(cause) => {
                error!("Error evaluating macro. name: {}, cause: {}", aperture.program.name, cause);
                return vec![];
            }
        };

        let factor = units.to_millimeters_factor();
        let (scale_x, scale_y) = aperture.local_scale;
        let place = |point: Position| {
            Position::new(
                position.x + point.x * factor * scale_x,
                position.y + point.y * factor * scale_y,
            )
        };

        shapes
            .iter()
            .map(|shape| {
                let (points, closed) = self.macro_shape_points(shape);
                let points = points.into_iter().map(place).collect();
                Geometry::new(GeometryKind::FlashAperture, points, closed, shape.exposure(), command)
            })
            .collect()
    }

    /// Points in macro-local coordinates, and whether they form a ring.
    fn macro_shape_points(&self, shape: &MacroShape) -> (Vec<Position>, bool) {
        match shape {
            MacroShape::Circle {
                center,
                diameter,
                ..
            } => {
                let points = ellipse_points(*diameter, *diameter, self.options.macro_circle_resolution)
                    .into_iter()
                    .map(|point| point + center.to_vector())
                    .collect();
                (points, true)
            }
            MacroShape::Line {
                start,
                end,
                ..
            } => (vec![*start, *end], false),
            MacroShape::Arc {
                start,
                end,
                center,
                clockwise,
                ..
            } => (
                arc_points(*start, *end, *center, *clockwise, self.options.macro_arc_resolution),
                false,
            ),
            MacroShape::Outline {
                points, ..
            } => (points.clone(), true),
            MacroShape::Rectangle {
                center,
                width,
                height,
                rotation,
                ..
            } => {
                let (half_width, half_height) = (width / 2.0, height / 2.0);
                let points = [
                    Vector::new(-half_width, -half_height),
                    Vector::new(half_width, -half_height),
                    Vector::new(half_width, half_height),
                    Vector::new(-half_width, half_height),
                ]
                .into_iter()
                .map(|corner| center + corner.rotate_degrees(*rotation))
                .collect();
                (points, true)
            }
        }
    }
}

/// Sample an arc from `start` to `end` around `center`.
///
/// The end angle is moved by a full turn when the raw sweep disagrees with the direction, so
/// clockwise arcs have non-increasing angles and counter-clockwise arcs non-decreasing ones.
/// Coincident start and end angles describe a full circle.
pub fn arc_points(start: Position, end: Position, center: Position, clockwise: bool, resolution: usize) -> Vec<Position> {
    let radius = length(start - center);
    let start_angle = arc_angle(start, center);
    let mut end_angle = arc_angle(end, center);

    if (end_angle - start_angle).abs() < EPSILON {
        end_angle = if clockwise { start_angle - TAU } else { start_angle + TAU };
    } else if clockwise && end_angle > start_angle {
        end_angle -= TAU;
    } else if !clockwise && end_angle < start_angle {
        end_angle += TAU;
    }

    sweep_angles(start_angle, end_angle, resolution)
        .map(|angle| Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()))
        .collect()
}

fn arc_angle(point: Position, center: Position) -> f64 {
    (point.y - center.y).atan2(point.x - center.x)
}

/// `resolution` equally spaced angles, both ends included.
fn sweep_angles(from: f64, to: f64, resolution: usize) -> impl Iterator<Item = f64> {
    let steps = resolution.max(2) - 1;
    (0..=steps).map(move |step| from + (to - from) * step as f64 / steps as f64)
}

/// Outline of a standard aperture centered on the origin, counter-clockwise.
pub fn standard_outline(shape: &ApertureShape, resolution: usize) -> Vec<Position> {
    let per_side = (resolution / 4).max(1);

    match shape {
        ApertureShape::Circle {
            diameter, ..
        } => ellipse_points(*diameter, *diameter, resolution),
        ApertureShape::Ellipse {
            width,
            height,
        } => ellipse_points(*width, *height, resolution),
        ApertureShape::Rectangle {
            width,
            height,
        } => sample_edges(&rectangle_corners(*width, *height), per_side),
        ApertureShape::RoundedRectangle {
            width,
            height,
            radius,
        } => rounded_rectangle(*width, *height, *radius, per_side),
        ApertureShape::Obround {
            width,
            height,
        } => rounded_rectangle(*width, *height, width.min(*height) / 2.0, per_side),
        ApertureShape::ChamferedRectangle {
            width,
            height,
            chamfer,
        } => chamfered(&rectangle_corners(*width, *height), *chamfer, per_side),
        ApertureShape::Diamond {
            width,
            height,
            chamfer,
        } => {
            let (half_width, half_height) = (width / 2.0, height / 2.0);
            let corners = [
                Position::new(-half_width, 0.0),
                Position::new(0.0, -half_height),
                Position::new(half_width, 0.0),
                Position::new(0.0, half_height),
            ];
            chamfered(&corners, *chamfer, per_side)
        }
        ApertureShape::Polygon {
            outer_diameter,
            vertices,
            rotation,
        } => {
            let count = (*vertices as usize).clamp(3, resolution.max(3));
            let radius = outer_diameter / 2.0;
            let corners: Vec<Position> = (0..count)
                .map(|index| {
                    let angle = rotation.to_radians() + TAU * index as f64 / count as f64;
                    Position::new(radius * angle.cos(), radius * angle.sin())
                })
                .collect();
            sample_edges(&corners, (resolution / count).max(1))
        }
        ApertureShape::Macro(_) => vec![],
    }
}

fn ellipse_points(width: f64, height: f64, resolution: usize) -> Vec<Position> {
    let (radius_x, radius_y) = (width / 2.0, height / 2.0);
    (0..resolution)
        .map(|index| {
            let angle = TAU * index as f64 / resolution as f64;
            Position::new(radius_x * angle.cos(), radius_y * angle.sin())
        })
        .collect()
}

fn rectangle_corners(width: f64, height: f64) -> [Position; 4] {
    let (half_width, half_height) = (width / 2.0, height / 2.0);
    [
        Position::new(-half_width, -half_height),
        Position::new(half_width, -half_height),
        Position::new(half_width, half_height),
        Position::new(-half_width, half_height),
    ]
}

/// `count` points per edge of the closed ring through `corners`, each edge excluding its end.
fn sample_edges(corners: &[Position], count: usize) -> Vec<Position> {
    let n = corners.len();
    (0..n)
        .flat_map(|index| sample_segment(corners[index], corners[(index + 1) % n], count))
        .collect()
}

fn sample_segment(from: Position, to: Position, count: usize) -> impl Iterator<Item = Position> {
    (0..count).map(move |step| from + (to - from) * (step as f64 / count as f64))
}

/// Rectangle with quarter-circle corners. Each side gets `per_side` points, split between
/// its straight edge and the following corner; a side with no straight edge left gives all
/// of its points to the corner.
fn rounded_rectangle(width: f64, height: f64, radius: f64, per_side: usize) -> Vec<Position> {
    let (half_width, half_height) = (width / 2.0, height / 2.0);
    let radius = radius.min(half_width.min(half_height));
    if radius <= EPSILON {
        return sample_edges(&rectangle_corners(width, height), per_side);
    }

    // corner centers with the angle each corner arc starts at, counter-clockwise from bottom-right
    let corners = [
        (Position::new(half_width - radius, -half_height + radius), -FRAC_PI_2),
        (Position::new(half_width - radius, half_height - radius), 0.0),
        (Position::new(-half_width + radius, half_height - radius), FRAC_PI_2),
        (Position::new(-half_width + radius, -half_height + radius), PI),
    ];
    let on_corner = |(center, _): (Position, f64), angle: f64| {
        Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
    };

    let mut points = Vec::with_capacity(per_side * 4);
    for index in 0..4 {
        let previous = corners[(index + 3) % 4];
        let corner = corners[index];
        let edge_start = on_corner(previous, previous.1 + FRAC_PI_2);
        let edge_end = on_corner(corner, corner.1);

        let straight = if length(edge_end - edge_start) <= EPSILON { 0 } else { per_side / 2 };
        points.extend(sample_segment(edge_start, edge_end, straight));

        let curved = per_side - straight;
        points.extend((0..curved).map(|step| on_corner(corner, corner.1 + FRAC_PI_2 * step as f64 / curved as f64)));
    }
    points
}

/// Polygon with each corner cut by a straight line `chamfer` along both adjacent edges.
fn chamfered(corners: &[Position], chamfer: f64, per_side: usize) -> Vec<Position> {
    let n = corners.len();
    let shortest = (0..n)
        .map(|index| length(corners[(index + 1) % n] - corners[index]))
        .fold(f64::MAX, f64::min);
    let chamfer = chamfer.min(shortest / 2.0);
    if chamfer <= EPSILON {
        return sample_edges(corners, per_side);
    }

    let mut points = Vec::with_capacity(per_side * n);
    for index in 0..n {
        let from = corners[index];
        let to = corners[(index + 1) % n];
        let after = corners[(index + 2) % n];

        let direction = (to - from) / length(to - from);
        let next_direction = (after - to) / length(after - to);

        let edge_start = from + direction * chamfer;
        let edge_end = to - direction * chamfer;
        let cut_end = to + next_direction * chamfer;

        let straight = if length(edge_end - edge_start) <= EPSILON { 0 } else { per_side / 2 };
        points.extend(sample_segment(edge_start, edge_end, straight));
        points.extend(sample_segment(edge_end, cut_end, per_side - straight));
    }
    points
}
