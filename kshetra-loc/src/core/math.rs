//! Angle helpers shared by the geometric core.
//!
//! All angles are in radians. Coordinate frame follows ROS REP-103:
//! X-forward, Y-left, Z-up, counter-clockwise positive rotation.

use std::f32::consts::PI;

/// Two times PI (full circle in radians).
pub const TWO_PI: f32 = 2.0 * PI;

/// Normalize angle to [-π, π).
///
/// # Example
/// ```
/// use kshetra_loc::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(PI / 2.0) - PI / 2.0).abs() < 1e-6);
/// assert!((normalize_angle(2.5 * PI) - PI / 2.0).abs() < 1e-5);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TWO_PI;
    if a >= PI {
        a -= TWO_PI;
    } else if a < -PI {
        a += TWO_PI;
    }
    a
}

/// Normalize an undirected orientation (line direction) to [0, π).
///
/// A wall at angle `a` and one at `a + π` are the same wall orientation.
#[inline]
pub fn normalize_orientation(angle: f32) -> f32 {
    let a = angle.rem_euclid(PI);
    if a >= PI { 0.0 } else { a }
}

/// Smallest difference between two undirected orientations, in [0, π/2].
#[inline]
pub fn orientation_diff(a: f32, b: f32) -> f32 {
    let d = (normalize_orientation(a) - normalize_orientation(b)).abs();
    d.min(PI - d)
}

/// Signed angular difference from `from` to `to`, in [-π, π).
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Check if two angles are approximately equal (handles wrap-around).
#[inline]
pub fn angles_approx_equal(a: f32, b: f32, tolerance: f32) -> bool {
    angle_diff(a, b).abs() <= tolerance
}

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * PI / 180.0
}

/// Convert radians to degrees.
#[inline]
pub fn rad_to_deg(rad: f32) -> f32 {
    rad * 180.0 / PI
}

/// Square of a value.
#[inline]
pub fn sq(x: f32) -> f32 {
    x * x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle_range() {
        for i in -20..20 {
            let a = normalize_angle(i as f32 * 0.7);
            assert!((-PI..PI).contains(&a), "{} out of range", a);
        }
    }

    #[test]
    fn test_angle_diff_wraps() {
        let diff = angle_diff(-0.9 * PI, 0.9 * PI);
        assert_relative_eq!(diff, -0.2 * PI, epsilon = 1e-5);
    }

    #[test]
    fn test_orientation_is_undirected() {
        assert_relative_eq!(orientation_diff(0.1, 0.1 + PI), 0.0, epsilon = 1e-5);
        assert_relative_eq!(orientation_diff(0.0, PI / 2.0), PI / 2.0, epsilon = 1e-5);
        assert_relative_eq!(orientation_diff(0.05, PI - 0.05), 0.1, epsilon = 1e-5);
    }

    #[test]
    fn test_normalize_orientation() {
        assert_relative_eq!(normalize_orientation(-PI / 4.0), 3.0 * PI / 4.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_orientation(5.0 * PI / 4.0), PI / 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_deg_rad_round_trip() {
        assert_relative_eq!(rad_to_deg(deg_to_rad(37.5)), 37.5, epsilon = 1e-4);
    }
}
