//! 2D point type in map / sensor coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point (or vector) in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters (forward in ROS convention).
    pub x: f32,
    /// Y coordinate in meters (left in ROS convention).
    pub y: f32,
}

impl Point2D {
    /// Origin.
    pub const ZERO: Point2D = Point2D { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at the given angle.
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Point2D) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product).
    #[inline]
    pub fn cross(self, other: Point2D) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Squared length (avoids sqrt).
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Perpendicular vector, rotated 90° counter-clockwise.
    #[inline]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Angle of this vector from +X (radians).
    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Point2D) -> f32 {
        (self - other).length()
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Point2D) -> f32 {
        (self - other).length_squared()
    }

    /// True when both coordinates are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point2D {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2D {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<[f32; 2]> for Point2D {
    fn from(v: [f32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cross_sign() {
        let x = Point2D::new(1.0, 0.0);
        let y = Point2D::new(0.0, 1.0);
        assert_relative_eq!(x.cross(y), 1.0);
        assert_relative_eq!(y.cross(x), -1.0);
    }

    #[test]
    fn test_perpendicular_is_ccw() {
        let p = Point2D::new(1.0, 0.0).perpendicular();
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 1.0);
    }

    #[test]
    fn test_normalized_zero() {
        assert_eq!(Point2D::ZERO.normalized(), Point2D::ZERO);
        assert_relative_eq!(Point2D::new(3.0, 4.0).normalized().length(), 1.0, epsilon = 1e-6);
    }
}
