//! Multi-ring lidar simulated against an Area Graph.
//!
//! Each column casts one planar ray through the map; each ring then sees the
//! nearest of the wall, the floor and the ceiling along its elevation.

use serde::{Deserialize, Serialize};

use super::noise::NoiseGenerator;
use crate::core::math::deg_to_rad;
use crate::core::{Point2D, Pose2D, Scan, ScanPoint};
use crate::error::ScanError;
use crate::intersect::{IntersectConfig, RayMapIntersector};
use crate::map::{AreaGraphMap, AreaId};

/// Synthetic organized lidar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyntheticLidar {
    /// Vertical beams.
    pub rings: usize,
    /// Azimuth steps per sweep, starting at -π.
    pub columns: usize,
    /// Lowest ring elevation (degrees).
    pub min_elevation_deg: f32,
    /// Highest ring elevation (degrees).
    pub max_elevation_deg: f32,
    /// Sensor height above the floor (meters).
    pub sensor_height: f32,
    /// Ceiling height above the floor (meters).
    pub ceiling_height: f32,
    /// Returns beyond this are dropped (meters).
    pub max_range: f32,
    /// Gaussian range noise (meters, 1σ).
    pub range_noise: f32,
    /// Share of returns replaced by a uniformly random range.
    pub outlier_fraction: f32,
    /// Noise seed; combined with the scan sequence.
    pub seed: u64,
}

impl Default for SyntheticLidar {
    fn default() -> Self {
        Self {
            rings: 16,
            columns: 720,
            min_elevation_deg: -15.0,
            max_elevation_deg: 15.0,
            sensor_height: 1.0,
            ceiling_height: 2.8,
            max_range: 40.0,
            range_noise: 0.0,
            outlier_fraction: 0.0,
            seed: 1,
        }
    }
}

impl SyntheticLidar {
    /// Builder-style setter for the sweep shape.
    pub fn with_shape(mut self, rings: usize, columns: usize) -> Self {
        self.rings = rings;
        self.columns = columns;
        self
    }

    /// Builder-style setter for Gaussian range noise.
    pub fn with_range_noise(mut self, stddev: f32) -> Self {
        self.range_noise = stddev;
        self
    }

    /// Builder-style setter for the random-return share.
    pub fn with_outliers(mut self, fraction: f32) -> Self {
        self.outlier_fraction = fraction;
        self
    }

    /// Builder-style setter for the maximum range.
    pub fn with_max_range(mut self, max_range: f32) -> Self {
        self.max_range = max_range;
        self
    }

    /// Builder-style setter for the noise seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Elevation of ring `ring` (radians).
    pub fn elevation(&self, ring: usize) -> f32 {
        if self.rings <= 1 {
            return 0.0;
        }
        let t = ring as f32 / (self.rings - 1) as f32;
        deg_to_rad(self.min_elevation_deg + t * (self.max_elevation_deg - self.min_elevation_deg))
    }

    /// Azimuth of column `column` in the sensor frame (radians).
    pub fn azimuth(&self, column: usize) -> f32 {
        -std::f32::consts::PI + column as f32 * std::f32::consts::TAU / self.columns.max(1) as f32
    }

    /// Simulate one sweep from `pose`, which lies in `area`.
    pub fn generate(&self, map: &AreaGraphMap, pose: Pose2D, area: AreaId, sequence: u64) -> Result<Scan, ScanError> {
        let intersector = RayMapIntersector::new(map, IntersectConfig::default().with_max_range(self.max_range));
        let mut noise = NoiseGenerator::new(self.seed.wrapping_mul(0x9E37_79B9).wrapping_add(sequence));
        let elevations: Vec<f32> = (0..self.rings).map(|r| self.elevation(r)).collect();
        let walls: Vec<Option<f32>> = (0..self.columns)
            .map(|c| {
                let dir = pose.rotate_vector(Point2D::from_angle(self.azimuth(c)));
                let hit = intersector.cast(pose.position(), dir, area);
                hit.hit.then_some(hit.range)
            })
            .collect();

        let mut points = Vec::with_capacity(self.rings * self.columns);
        for &elevation in &elevations {
            for (c, wall) in walls.iter().enumerate() {
                points.push(self.return_for(*wall, elevation, self.azimuth(c), &mut noise));
            }
        }
        Scan::new(sequence, sequence * 100_000, self.rings, self.columns, points)
    }

    /// One return along `azimuth`/`elevation`, or invalid.
    fn return_for(&self, wall: Option<f32>, elevation: f32, azimuth: f32, noise: &mut NoiseGenerator) -> ScanPoint {
        let tan_e = elevation.tan();
        let surface = if tan_e < -f32::EPSILON {
            Some(self.sensor_height / -tan_e)
        } else if tan_e > f32::EPSILON {
            Some((self.ceiling_height - self.sensor_height) / tan_e)
        } else {
            None
        };
        let horizontal = match (wall, surface) {
            (Some(w), Some(s)) => w.min(s),
            (Some(w), None) => w,
            (None, Some(s)) => s,
            (None, None) => return ScanPoint::invalid(),
        };

        let mut range = horizontal / elevation.cos();
        if noise.chance(self.outlier_fraction) {
            range = noise.uniform(0.0, self.max_range);
        } else {
            range += noise.gaussian(self.range_noise);
        }
        if !(range > 0.0 && range <= self.max_range) {
            return ScanPoint::invalid();
        }
        let planar = range * elevation.cos();
        ScanPoint::new(
            planar * azimuth.cos(),
            planar * azimuth.sin(),
            range * elevation.sin(),
            if wall == Some(horizontal) { 1.0 } else { 0.5 },
        )
    }
}
