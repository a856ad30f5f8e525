//! Planar rigid pose of the sensor in the map frame.
//!
//! Coordinate frame follows ROS REP-103:
//! - X-forward, Y-left, Z-up (right-handed)
//! - Counter-clockwise positive rotation

use serde::{Deserialize, Serialize};

use super::math::{angle_diff, angles_approx_equal, normalize_angle};
use super::point::Point2D;

/// A 2D pose: position in meters and heading in radians.
///
/// Poses compose with `*` (apply the right-hand pose in the left-hand frame):
/// ```
/// use kshetra_loc::core::Pose2D;
/// use std::f32::consts::FRAC_PI_2;
///
/// let a = Pose2D::new(1.0, 0.0, FRAC_PI_2);
/// let b = Pose2D::new(1.0, 0.0, 0.0);
/// let c = a * b;
/// assert!((c.x - 1.0).abs() < 1e-6 && (c.y - 1.0).abs() < 1e-6);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters.
    pub x: f32,
    /// Y position in meters.
    pub y: f32,
    /// Heading in radians [-π, π), CCW positive from X-axis.
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose. Theta is normalized to [-π, π).
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose (origin, facing +X).
    #[inline]
    pub const fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Create a pose from a position and heading.
    #[inline]
    pub fn from_position(position: Point2D, theta: f32) -> Self {
        Self::new(position.x, position.y, theta)
    }

    /// Position as a point.
    #[inline]
    pub fn position(self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Unit forward vector.
    #[inline]
    pub fn forward(self) -> Point2D {
        Point2D::from_angle(self.theta)
    }

    /// Transform a point from this pose's local frame to the world frame.
    #[inline]
    pub fn transform_point(self, point: Point2D) -> Point2D {
        let (sin, cos) = self.theta.sin_cos();
        Point2D {
            x: self.x + point.x * cos - point.y * sin,
            y: self.y + point.x * sin + point.y * cos,
        }
    }

    /// Rotate a direction vector into the world frame (no translation).
    #[inline]
    pub fn rotate_vector(self, v: Point2D) -> Point2D {
        let (sin, cos) = self.theta.sin_cos();
        Point2D::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    }

    /// Transform a point from the world frame to this pose's local frame.
    #[inline]
    pub fn inverse_transform_point(self, point: Point2D) -> Point2D {
        let (sin, cos) = self.theta.sin_cos();
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        Point2D {
            x: dx * cos + dy * sin,
            y: -dx * sin + dy * cos,
        }
    }

    /// Apply `other` in this pose's frame.
    #[inline]
    pub fn compose(self, other: Pose2D) -> Self {
        let pos = self.transform_point(other.position());
        Self::new(pos.x, pos.y, self.theta + other.theta)
    }

    /// Inverse transform: `pose.compose(pose.inverse())` is identity.
    #[inline]
    pub fn inverse(self) -> Self {
        let (sin, cos) = self.theta.sin_cos();
        Self::new(
            -self.x * cos - self.y * sin,
            self.x * sin - self.y * cos,
            -self.theta,
        )
    }

    /// Relative pose from `self` to `other`: `self.compose(self.relative_to(other)) == other`.
    #[inline]
    pub fn relative_to(self, other: Pose2D) -> Self {
        self.inverse().compose(other)
    }

    /// Translation distance to another pose.
    #[inline]
    pub fn distance(self, other: Pose2D) -> f32 {
        self.position().distance(other.position())
    }

    /// Absolute heading difference to another pose.
    #[inline]
    pub fn heading_error(self, other: Pose2D) -> f32 {
        angle_diff(self.theta, other.theta).abs()
    }

    /// Check approximate equality with separate position and angle tolerances.
    #[inline]
    pub fn approx_eq(self, other: Pose2D, pos_epsilon: f32, angle_epsilon: f32) -> bool {
        (self.x - other.x).abs() <= pos_epsilon
            && (self.y - other.y).abs() <= pos_epsilon
            && angles_approx_equal(self.theta, other.theta, angle_epsilon)
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl std::ops::Mul for Pose2D {
    type Output = Self;

    /// Compose two poses (same as `compose`).
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.compose(rhs)
    }
}
