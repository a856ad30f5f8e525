//! Synthetic sensor data for tests and benchmarks.

mod lidar;
mod noise;

pub use lidar::SyntheticLidar;
pub use noise::NoiseGenerator;
