pub type Vector = nalgebra::Vector2<f64>;
pub type Position = nalgebra::Point2<f64>;

pub trait ToVector {
    fn to_vector(self) -> Vector;
}

impl ToVector for Position {
    fn to_vector(self) -> Vector {
        Vector::new(self.x, self.y)
    }
}

/// Rotation about the origin, counter-clockwise for positive angles.
pub trait Rotate {
    fn rotate_degrees(self, degrees: f64) -> Self;
}

macro_rules! impl_rotate {
    ($name:ident) => {
        impl Rotate for $name {
            fn rotate_degrees(self, degrees: f64) -> Self {
                if degrees == 0.0 {
                    return self;
                }
                let (sin_theta, cos_theta) = degrees.to_radians().sin_cos();
                Self::new(
                    self.x * cos_theta - self.y * sin_theta,
                    self.x * sin_theta + self.y * cos_theta,
                )
            }
        }
    };
}

impl_rotate!(Vector);
impl_rotate!(Position);

/// Euclidean length, computed on the f64 components.
pub fn length(vector: Vector) -> f64 {
    vector.x.hypot(vector.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_90_degrees() {
        let rotated = Position::new(1.0, 0.0).rotate_degrees(90.0);
        assert!((rotated.x - 0.0).abs() < 1e-12);
        assert!((rotated.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let position = Position::new(3.0, -4.0);
        assert_eq!(position.rotate_degrees(0.0), position);
    }

    #[test]
    fn test_length() {
        assert_eq!(length(Vector::new(3.0, 4.0)), 5.0);
    }
}
