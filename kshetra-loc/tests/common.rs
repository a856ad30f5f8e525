//! Shared fixtures for the integration tests: maps, lidar and scan helpers.

#![allow(dead_code)]

use kshetra_loc::preprocess::PreprocessConfig;
use kshetra_loc::sim::SyntheticLidar;
use kshetra_loc::{AreaGraphMap, AreaId, Pose2D, ProcessedScan, Scan, ScanPreprocessor};

/// Square 6 x 6 m room with one doorway on its right wall, opening into an
/// 8 m corridor whose far end leads outside.
pub const ROOM_AND_CORRIDOR: &str = r#"
areas:
  - id: 1
    vertices: [[0, 0], [6, 0], [6, 2.4], [6, 3.6], [6, 6], [0, 6]]
    passages:
      - { edge: 2, to: 2 }
  - id: 2
    vertices: [[6, 2.4], [14, 2.4], [14, 3.6], [6, 3.6]]
    passages:
      - { edge: 3, to: 1 }
      - { edge: 1 }
"#;

/// 40 m long, 2 m wide corridor closed at both ends.
pub const LONG_CORRIDOR: &str = r#"
areas:
  - id: 7
    vertices: [[0, 0], [40, 0], [40, 2], [0, 2]]
"#;

/// Open 10 x 10 m room.
pub const OPEN_ROOM: &str = r#"
areas:
  - id: 3
    vertices: [[0, 0], [10, 0], [10, 10], [0, 10]]
"#;

/// Initialise logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parse one of the fixture maps.
pub fn load(yaml: &str) -> AreaGraphMap {
    AreaGraphMap::from_yaml_str(yaml).expect("fixture map is valid")
}

/// Lidar used by most scenarios.
pub fn lidar() -> SyntheticLidar {
    SyntheticLidar::default()
}

/// Simulate a sweep from `pose`, picking the containing area.
pub fn scan_at(map: &AreaGraphMap, lidar: &SyntheticLidar, pose: Pose2D, sequence: u64) -> Scan {
    let area = map.locate(pose.position()).expect("pose inside the map");
    lidar
        .generate(map, pose, area, sequence)
        .expect("synthetic scan has a consistent shape")
}

/// Preprocess with defaults.
pub fn process(scan: &Scan) -> ProcessedScan {
    ScanPreprocessor::default().process(scan, None)
}

/// Preprocess without corridor downsampling.
pub fn process_dense(scan: &Scan) -> ProcessedScan {
    ScanPreprocessor::new(PreprocessConfig::default().with_downsampling(false)).process(scan, None)
}

/// Area containing `pose`.
pub fn area_of(map: &AreaGraphMap, pose: Pose2D) -> AreaId {
    map.locate(pose.position()).expect("pose inside the map")
}

/// Population variance.
pub fn variance(values: &[f32]) -> f32 {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n
}
