//! Weighted point-to-line Gauss-Newton step.
//!
//! Minimizes `Σ wᵢ (nᵢ · (R(θ) qᵢ + t − aᵢ))²` over `(x, y, θ)` where `nᵢ` is
//! the wall normal and `aᵢ` a point on the wall. Walls are lines, so only the
//! perpendicular component of each residual counts (point-to-line, not
//! point-to-point).
//!
//! The normal equations are divided by the total weight before damping, so
//! the damping acts as a fixed trust region. Directions observed by only a
//! small share of the weight (the along-axis direction in a corridor)
//! therefore converge slowly unless that share is raised.

use super::correspondence::CorrespondenceSet;
use super::robust::RobustKernel;
use crate::core::Pose2D;

/// Pose increment in the map frame, rotation about the sensor position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoseIncrement {
    /// Translation along map X (meters).
    pub dx: f32,
    /// Translation along map Y (meters).
    pub dy: f32,
    /// Rotation (radians).
    pub dtheta: f32,
}

impl PoseIncrement {
    /// Translation magnitude.
    #[inline]
    pub fn translation(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Rotation magnitude.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.dtheta.abs()
    }

    /// Apply to a pose.
    #[inline]
    pub fn apply(&self, pose: Pose2D) -> Pose2D {
        Pose2D::new(pose.x + self.dx, pose.y + self.dy, pose.theta + self.dtheta)
    }

    /// Copy with translation clamped to `max_translation` and rotation to `max_rotation`.
    pub fn clamped(&self, max_translation: f32, max_rotation: f32) -> Self {
        let t = self.translation();
        let scale = if t > max_translation && t > 0.0 {
            max_translation / t
        } else {
            1.0
        };
        Self {
            dx: self.dx * scale,
            dy: self.dy * scale,
            dtheta: self.dtheta.clamp(-max_rotation, max_rotation),
        }
    }
}

/// Solve one damped Gauss-Newton step for the correspondences evaluated at `pose`.
///
/// Returns `None` when there is no weight or the system is singular.
pub fn solve_increment(
    set: &CorrespondenceSet,
    pose: Pose2D,
    kernel: RobustKernel,
    damping: f32,
) -> Option<PoseIncrement> {
    let mut h = [[0.0f32; 3]; 3];
    let mut g = [0.0f32; 3];
    let mut total = 0.0f32;

    let origin = pose.position();
    for c in set.iter() {
        let w = c.weight * kernel.weight(c.residual);
        if w <= 0.0 {
            continue;
        }
        let d = c.world_point - origin;
        let j = [c.normal.x, c.normal.y, c.normal.dot(d.perpendicular())];
        for r in 0..3 {
            g[r] += w * c.residual * j[r];
            for k in 0..3 {
                h[r][k] += w * j[r] * j[k];
            }
        }
        total += w;
    }
    if total <= f32::EPSILON {
        return None;
    }

    let inv = 1.0 / total;
    for r in 0..3 {
        g[r] *= inv;
        for k in 0..3 {
            h[r][k] *= inv;
        }
    }

    let delta = solve_3x3(&h, &g, damping)?;
    Some(PoseIncrement {
        dx: delta[0],
        dy: delta[1],
        dtheta: delta[2],
    })
}

/// Solve `(A + λI) x = −b` by cofactor inversion.
fn solve_3x3(a: &[[f32; 3]; 3], b: &[f32; 3], damping: f32) -> Option<[f32; 3]> {
    let mut ar = *a;
    ar[0][0] += damping;
    ar[1][1] += damping;
    ar[2][2] += damping;

    let det = ar[0][0] * (ar[1][1] * ar[2][2] - ar[1][2] * ar[2][1])
        - ar[0][1] * (ar[1][0] * ar[2][2] - ar[1][2] * ar[2][0])
        + ar[0][2] * (ar[1][0] * ar[2][1] - ar[1][1] * ar[2][0]);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    let inv = [
        [
            (ar[1][1] * ar[2][2] - ar[1][2] * ar[2][1]) * inv_det,
            (ar[0][2] * ar[2][1] - ar[0][1] * ar[2][2]) * inv_det,
            (ar[0][1] * ar[1][2] - ar[0][2] * ar[1][1]) * inv_det,
        ],
        [
            (ar[1][2] * ar[2][0] - ar[1][0] * ar[2][2]) * inv_det,
            (ar[0][0] * ar[2][2] - ar[0][2] * ar[2][0]) * inv_det,
            (ar[0][2] * ar[1][0] - ar[0][0] * ar[1][2]) * inv_det,
        ],
        [
            (ar[1][0] * ar[2][1] - ar[1][1] * ar[2][0]) * inv_det,
            (ar[0][1] * ar[2][0] - ar[0][0] * ar[2][1]) * inv_det,
            (ar[0][0] * ar[1][1] - ar[0][1] * ar[1][0]) * inv_det,
        ],
    ];

    Some([
        -(inv[0][0] * b[0] + inv[0][1] * b[1] + inv[0][2] * b[2]),
        -(inv[1][0] * b[0] + inv[1][1] * b[1] + inv[1][2] * b[2]),
        -(inv[2][0] * b[0] + inv[2][1] * b[1] + inv[2][2] * b[2]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point2D;
    use crate::map::{AreaId, EdgeRef};
    use crate::matching::Correspondence;
    use approx::assert_relative_eq;

    fn corr(world: Point2D, normal: Point2D, wall_offset: f32) -> Correspondence {
        Correspondence {
            point_idx: 0,
            edge: EdgeRef {
                area: AreaId(1),
                edge: 0,
            },
            world_point: world,
            normal,
            residual: normal.dot(world) - wall_offset,
            predicted_range: 1.0,
            weight: 1.0,
        }
    }

    #[test]
    fn test_recovers_translation_without_damping() {
        // Walls x = 2 (normal -X) and y = 2 (normal -Y); points 0.1 short in both.
        let mut items = Vec::new();
        for i in 0..5 {
            let t = i as f32 * 0.2;
            items.push(corr(Point2D::new(1.9, t), Point2D::new(-1.0, 0.0), -2.0));
            items.push(corr(Point2D::new(t, 1.9), Point2D::new(0.0, -1.0), -2.0));
        }
        let set = CorrespondenceSet::from_vec(items);
        let inc = solve_increment(&set, Pose2D::identity(), RobustKernel::None, 0.0).unwrap();
        assert_relative_eq!(inc.dx, 0.1, epsilon = 1e-4);
        assert_relative_eq!(inc.dy, 0.1, epsilon = 1e-4);
        assert_relative_eq!(inc.dtheta, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_damping_shrinks_weakly_observed_axis() {
        // Many points on y-walls (constrain y), a few on an x-wall (constrain x).
        let mut items = Vec::new();
        for i in 0..19 {
            let t = -1.0 + i as f32 * 0.1;
            items.push(corr(Point2D::new(t, 0.9), Point2D::new(0.0, -1.0), -1.0));
            items.push(corr(Point2D::new(t, -0.9), Point2D::new(0.0, 1.0), -1.0));
        }
        items.push(corr(Point2D::new(4.9, -0.25), Point2D::new(-1.0, 0.0), -5.0));
        items.push(corr(Point2D::new(4.9, 0.25), Point2D::new(-1.0, 0.0), -5.0));
        let set = CorrespondenceSet::from_vec(items);

        // The end wall is 0.1 m off but carries 2/40 of the weight, so with
        // damping 0.05 only half of the correction is taken.
        let inc = solve_increment(&set, Pose2D::identity(), RobustKernel::None, 0.05).unwrap();
        assert_relative_eq!(inc.dx, 0.05, epsilon = 5e-3);
        let full = solve_increment(&set, Pose2D::identity(), RobustKernel::None, 0.0).unwrap();
        assert_relative_eq!(full.dx, 0.1, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_set_has_no_step() {
        let set = CorrespondenceSet::default();
        assert!(solve_increment(&set, Pose2D::identity(), RobustKernel::None, 0.01).is_none());
    }

    #[test]
    fn test_increment_clamp() {
        let inc = PoseIncrement {
            dx: 3.0,
            dy: 4.0,
            dtheta: -1.0,
        };
        let c = inc.clamped(0.5, 0.2);
        assert_relative_eq!(c.translation(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(c.dtheta, -0.2);
    }
}
