use crate::spacial::Position;

#[derive(Debug, Clone, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Position::new(f64::MAX, f64::MAX),
            max: Position::new(f64::MIN, f64::MIN),
        }
    }
}

impl BoundingBox {
    /// Note that a bounding box of 0,0 -> 0,0 is NOT empty, a single flashed point has one.
    ///
    /// Only a bounding box which is the same as the one returned by `default` counts as empty.
    pub fn is_empty(&self) -> bool {
        self.eq(&BoundingBox::default())
    }

    pub fn expand(&mut self, other: &BoundingBox) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);
        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Position {
        Position::new(self.min.x + self.max.x, self.min.y + self.max.y) / 2.0
    }

    pub fn from_points(points: &[Position]) -> Self {
        let mut bbox = Self::default();

        for position in points {
            bbox.min.x = bbox.min.x.min(position.x);
            bbox.min.y = bbox.min.y.min(position.y);
            bbox.max.x = bbox.max.x.max(position.x);
            bbox.max.y = bbox.max.y.max(position.y);
        }

        bbox
    }
}
