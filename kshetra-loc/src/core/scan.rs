//! Organized 3D scan as delivered by a multi-ring rangefinder.
//!
//! Points live in one flat buffer addressed by an explicit
//! `(ring, column)` index: `flat = ring * columns + column`. Ring 0 is the
//! lowest beam, columns sweep counter-clockwise in azimuth. Missing returns
//! are kept in place with non-finite coordinates so the organization is
//! preserved.

use serde::{Deserialize, Serialize};

use super::point::Point2D;
use crate::error::ScanError;

/// One return of the sensor in the sensor frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// X in meters (forward).
    pub x: f32,
    /// Y in meters (left).
    pub y: f32,
    /// Z in meters (up).
    pub z: f32,
    /// Return intensity (sensor units).
    pub intensity: f32,
}

impl ScanPoint {
    /// Create a point.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }

    /// Placeholder for a missing return.
    #[inline]
    pub const fn invalid() -> Self {
        Self::new(f32::NAN, f32::NAN, f32::NAN, 0.0)
    }

    /// True when the return carries finite coordinates.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Horizontal range from the sensor.
    #[inline]
    pub fn planar_range(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Full 3D range from the sensor.
    #[inline]
    pub fn range(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Top-down projection.
    #[inline]
    pub fn planar(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Azimuth in radians, CCW from +X.
    #[inline]
    pub fn azimuth(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// Position of a point in the organized scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanIndex {
    /// Vertical beam index.
    pub ring: usize,
    /// Horizontal angular index.
    pub column: usize,
}

impl ScanIndex {
    /// Create an index.
    #[inline]
    pub const fn new(ring: usize, column: usize) -> Self {
        Self { ring, column }
    }
}

/// One full sensor sweep.
#[derive(Clone, Debug)]
pub struct Scan {
    /// Monotonically increasing sweep counter.
    pub sequence: u64,
    /// Acquisition time in microseconds.
    pub stamp_us: u64,
    rings: usize,
    columns: usize,
    points: Vec<ScanPoint>,
}

impl Scan {
    /// Wrap an organized buffer, checking that it is `rings x columns`.
    pub fn new(
        sequence: u64,
        stamp_us: u64,
        rings: usize,
        columns: usize,
        points: Vec<ScanPoint>,
    ) -> Result<Self, ScanError> {
        if rings == 0 || columns == 0 || points.len() != rings * columns {
            return Err(ScanError::ShapeMismatch {
                rings,
                columns,
                len: points.len(),
            });
        }
        Ok(Self {
            sequence,
            stamp_us,
            rings,
            columns,
            points,
        })
    }

    /// Number of vertical beams.
    #[inline]
    pub fn rings(&self) -> usize {
        self.rings
    }

    /// Number of horizontal angular bins.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of slots (valid or not).
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the buffer has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Flat buffer in ring-major order.
    #[inline]
    pub fn points(&self) -> &[ScanPoint] {
        &self.points
    }

    /// Flat offset of an index.
    #[inline]
    pub fn flat_index(&self, index: ScanIndex) -> usize {
        index.ring * self.columns + index.column
    }

    /// Organized index of a flat offset.
    #[inline]
    pub fn index_of(&self, flat: usize) -> ScanIndex {
        ScanIndex::new(flat / self.columns, flat % self.columns)
    }

    /// Point at `(ring, column)`, if in range.
    #[inline]
    pub fn get(&self, index: ScanIndex) -> Option<&ScanPoint> {
        if index.ring < self.rings && index.column < self.columns {
            self.points.get(self.flat_index(index))
        } else {
            None
        }
    }

    /// Column neighbor with azimuth wrap-around.
    #[inline]
    pub fn wrap_column(&self, column: usize, offset: isize) -> usize {
        let c = self.columns as isize;
        (column as isize + offset).rem_euclid(c) as usize
    }

    /// Number of returns with finite coordinates.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }

    /// Iterate `(index, point)` pairs in ring-major order.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (ScanIndex, &ScanPoint)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(move |(i, p)| (self.index_of(i), p))
    }
}
