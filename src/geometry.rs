use crate::error::GeometryError;
use crate::parser::Command;
use crate::spacial::{length, Position};
use crate::types::Exposure;

pub mod bounding_box;
pub mod mesh;
pub mod polygon;
pub mod realize;

pub use bounding_box::*;
pub use mesh::*;
pub use realize::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryKind {
    FlashAperture,
    Region,
    Draw,
    Arc,
}

/// A realized point sequence, derived from the command it refers back to.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry<'c> {
    kind: GeometryKind,
    points: Vec<Position>,
    closed: bool,
    exposure: Exposure,
    command: &'c Command,
}

impl<'c> Geometry<'c> {
    pub fn new(kind: GeometryKind, points: Vec<Position>, closed: bool, exposure: Exposure, command: &'c Command) -> Self {
        Self {
            kind,
            points,
            closed,
            exposure,
            command,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// `true` for rings, where the last point connects back to the first.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn exposure(&self) -> Exposure {
        self.exposure
    }

    pub fn command(&self) -> &'c Command {
        self.command
    }

    /// Same kind, exposure and command, different points.
    pub fn with_points(&self, points: Vec<Position>) -> Self {
        Self {
            kind: self.kind,
            points,
            closed: self.closed,
            exposure: self.exposure,
            command: self.command,
        }
    }

    /// The flash position, the area centroid of a region, the midpoint along a draw path or the
    /// center of an arc. `None` for empty regions and paths.
    pub fn center(&self) -> Option<Position> {
        match (self.kind, self.command) {
            (
                GeometryKind::FlashAperture,
                Command::Flash {
                    position, ..
                },
            ) => Some(*position),
            (
                GeometryKind::Arc,
                Command::Arc {
                    start,
                    center_offset,
                    ..
                },
            ) => Some(start + center_offset),
            (GeometryKind::Region, _) => polygon::centroid(&self.points),
            _ => path_midpoint(&self.points),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    pub fn tessellate(&self) -> Result<PolygonMesh, GeometryError> {
        if !self.closed {
            return Err(GeometryError::NotClosed);
        }
        tessellate_polygon(&self.points)
    }
}

/// The point halfway along the path, by length.
fn path_midpoint(points: &[Position]) -> Option<Position> {
    let first = *points.first()?;
    let total: f64 = points
        .windows(2)
        .map(|pair| length(pair[1] - pair[0]))
        .sum();
    if total == 0.0 {
        return Some(first);
    }

    let mut remaining = total / 2.0;
    for pair in points.windows(2) {
        let segment = pair[1] - pair[0];
        let segment_length = length(segment);
        if remaining <= segment_length {
            return Some(pair[0] + segment * (remaining / segment_length));
        }
        remaining -= segment_length;
    }

    points.last().copied()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::aperture::ApertureCatalog;
    use crate::parser::DrawMode;
    use crate::spacial::Vector;
    use crate::testing::{assert_position_near, square};
    use crate::types::Units;

    fn circle_aperture(catalog: &mut ApertureCatalog) -> Arc<crate::aperture::ApertureRecord> {
        catalog
            .define_standard(10, "C", &[1.0], Units::Millimeters)
            .unwrap()
    }

    #[test]
    fn test_path_midpoint_by_length() {
        // given
        let mut catalog = ApertureCatalog::default();
        let command = Command::Draw {
            path: vec![Position::new(0.0, 0.0), Position::new(3.0, 0.0), Position::new(3.0, 1.0)],
            aperture: circle_aperture(&mut catalog),
            mode: DrawMode::Draw,
        };
        let Command::Draw {
            path, ..
        } = &command
        else {
            unreachable!()
        };
        let geometry = Geometry::new(GeometryKind::Draw, path.clone(), false, Exposure::Add, &command);

        // when
        let center = geometry.center().unwrap();

        // then
        assert_position_near(center, Position::new(2.0, 0.0));
    }

    #[test]
    fn test_single_point_draw_center() {
        let mut catalog = ApertureCatalog::default();
        let command = Command::Draw {
            path: vec![Position::new(1.0, 2.0)],
            aperture: circle_aperture(&mut catalog),
            mode: DrawMode::Draw,
        };
        let geometry = Geometry::new(GeometryKind::Draw, vec![Position::new(1.0, 2.0)], false, Exposure::Add, &command);
        assert_eq!(geometry.center(), Some(Position::new(1.0, 2.0)));
    }

    #[test]
    fn test_region_center_is_centroid() {
        // given
        let ring = square(Position::new(4.0, -2.0), 2.0);
        let command = Command::Region {
            polygon: ring.clone(),
        };
        let geometry = Geometry::new(GeometryKind::Region, ring, true, Exposure::Add, &command);

        // expect
        assert_position_near(geometry.center().unwrap(), Position::new(4.0, -2.0));
    }

    #[test]
    fn test_empty_region() {
        // given
        let command = Command::Region {
            polygon: vec![],
        };
        let geometry = Geometry::new(GeometryKind::Region, vec![], true, Exposure::Add, &command);

        // expect
        assert_eq!(geometry.center(), None);
        assert!(geometry.bounding_box().is_empty());
        assert!(geometry.tessellate().unwrap().indices.is_empty());
    }

    #[test]
    fn test_arc_center() {
        let mut catalog = ApertureCatalog::default();
        let command = Command::Arc {
            start: Position::new(2.0, 0.0),
            end: Position::new(0.0, 2.0),
            center_offset: Vector::new(-2.0, 0.0),
            clockwise: false,
            aperture: circle_aperture(&mut catalog),
        };
        let geometry = Geometry::new(GeometryKind::Arc, vec![], false, Exposure::Add, &command);
        assert_eq!(geometry.center(), Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_open_paths_cannot_be_tessellated() {
        let mut catalog = ApertureCatalog::default();
        let command = Command::Draw {
            path: vec![Position::new(1.0, 2.0)],
            aperture: circle_aperture(&mut catalog),
            mode: DrawMode::Draw,
        };
        let geometry = Geometry::new(GeometryKind::Draw, vec![Position::new(1.0, 2.0)], false, Exposure::Add, &command);
        assert_eq!(geometry.tessellate().unwrap_err(), GeometryError::NotClosed);
    }
}
