//! End-to-end localization scenarios on synthetic maps and scans.

mod common;

use std::sync::Arc;

use kshetra_loc::core::Point2D;
use kshetra_loc::corridor::{CorridorConfig, CorridorWeights, CorridornessOptimizer};
use kshetra_loc::global::GlobalLocalizer;
use kshetra_loc::intersect::IntersectConfig;
use kshetra_loc::modes::{CancelToken, FrameMode};
use kshetra_loc::sim::NoiseGenerator;
use kshetra_loc::tracking::{PoseTracker, TrackingConfig};
use kshetra_loc::{AreaId, KshetraConfig, Localizer, Pose2D, ProcessedScan, RayMapIntersector};

use common::*;

/// Replace `fraction` of the points with returns at random bearings and ranges.
fn corrupt(scan: &mut ProcessedScan, fraction: f32, seed: u64) {
    let mut noise = NoiseGenerator::new(seed);
    for p in scan.points.iter_mut() {
        if noise.chance(fraction) {
            let bearing = noise.uniform(-std::f32::consts::PI, std::f32::consts::PI);
            let range = noise.uniform(0.5, 15.0);
            p.point = Point2D::from_angle(bearing) * range;
            p.range = range;
            p.orientation = None;
        }
    }
}

#[test]
fn test_global_recovery_in_room_with_passage() {
    init_logging();
    let map = load(ROOM_AND_CORRIDOR);
    let truth = Pose2D::new(2.0, 4.0, 0.7);
    let processed = process(&scan_at(&map, &lidar(), truth, 1));
    assert!(processed.valid);

    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let result = GlobalLocalizer::default().localize(
        &intersector,
        &PoseTracker::default(),
        &processed,
        None,
        &CancelToken::never(),
    );

    assert!(result.valid, "fitness {}", result.fitness);
    assert_eq!(result.area, AreaId(1));
    assert!(result.pose.distance(truth) < 0.1, "pose {:?}", result.pose);
    assert!(result.pose.heading_error(truth) < 2f32.to_radians());
    assert!(result.confidence > 0.0);
}

#[test]
fn test_localizer_bootstraps_then_tracks() {
    init_logging();
    let map = Arc::new(load(ROOM_AND_CORRIDOR));
    let lidar = lidar();
    let mut localizer = Localizer::new(Arc::clone(&map), KshetraConfig::default()).unwrap();

    let first = localizer.process_scan(&scan_at(&map, &lidar, Pose2D::new(2.0, 4.0, 0.7), 1));
    assert_eq!(first.mode, FrameMode::Global);
    assert!(first.estimate.valid);
    assert!(localizer.state().initialized);

    let truth = Pose2D::new(2.1, 3.95, 0.72);
    let second = localizer.process_scan(&scan_at(&map, &lidar, truth, 2));
    assert_eq!(second.mode, FrameMode::Tracking);
    assert!(second.estimate.valid);
    assert!(second.estimate.pose.distance(truth) < 0.05);
    assert_eq!(localizer.state().frames_processed, 2);
}

#[test]
fn test_passage_transition_within_one_frame() {
    init_logging();
    let map = Arc::new(load(ROOM_AND_CORRIDOR));
    let lidar = lidar();
    let mut localizer = Localizer::new(Arc::clone(&map), KshetraConfig::default()).unwrap();
    let start = Pose2D::new(5.0, 3.0, 0.0);
    localizer.set_initial_pose(start).unwrap();

    let mut crossed_at = None;
    let mut transitioned_at = None;
    for step in 1..=20u64 {
        let truth = Pose2D::new(start.x + 0.1 * step as f32, 3.0, 0.0);
        let result = localizer.process_scan(&scan_at(&map, &lidar, truth, step));
        assert!(result.estimate.valid, "step {} lost tracking", step);
        assert!(result.estimate.pose.distance(truth) < 0.05, "step {}: {:?}", step, result.estimate.pose);

        if crossed_at.is_none() && area_of(&map, truth) == AreaId(2) {
            crossed_at = Some(step);
        }
        if result.transitioned {
            assert_eq!(result.area, Some(AreaId(2)));
            assert!(transitioned_at.is_none(), "transitioned twice");
            transitioned_at = Some(step);
        }
    }

    let crossed = crossed_at.expect("trajectory enters the corridor");
    let transitioned = transitioned_at.expect("area transition reported");
    assert!(transitioned >= crossed && transitioned <= crossed + 1);
    assert_eq!(localizer.state().area, Some(AreaId(2)));
}

#[test]
fn test_mostly_noise_is_not_confident() {
    init_logging();
    let map = load(ROOM_AND_CORRIDOR);
    let truth = Pose2D::new(3.0, 2.0, -1.0);
    let mut processed = process(&scan_at(&map, &lidar(), truth, 1));
    corrupt(&mut processed, 0.9, 11);

    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let result = GlobalLocalizer::default().localize(
        &intersector,
        &PoseTracker::default(),
        &processed,
        None,
        &CancelToken::never(),
    );

    let false_confident = result.valid && result.confidence >= 0.3 && result.pose.distance(truth) > 0.3;
    assert!(!false_confident, "{:?}", result);
}

#[test]
fn test_pure_noise_is_invalid() {
    init_logging();
    let map = load(ROOM_AND_CORRIDOR);
    let mut processed = process(&scan_at(&map, &lidar(), Pose2D::new(3.0, 3.0, 0.0), 1));
    corrupt(&mut processed, 1.0, 5);

    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let result = GlobalLocalizer::default().localize(
        &intersector,
        &PoseTracker::default(),
        &processed,
        None,
        &CancelToken::never(),
    );
    assert!(!result.valid || result.confidence < 0.3, "{:?}", result);
}

#[test]
fn test_corridor_weighting_reduces_along_axis_variance() {
    init_logging();
    let map = load(LONG_CORRIDOR);
    let lidar = lidar().with_max_range(15.0);
    // 6 m from the closed end; the far end is out of range.
    let truth = Pose2D::new(34.0, 1.0, 0.0);
    let processed = process_dense(&scan_at(&map, &lidar, truth, 1));
    assert!(processed.valid);

    let area = AreaId(7);
    let optimizer = CorridornessOptimizer::new(CorridorConfig::default());
    let corridor = optimizer.compute_weights(&map, &processed, truth, area);
    assert!(corridor.corridorness > 0.6, "corridorness {}", corridor.corridorness);
    let uniform = CorridorWeights::uniform(processed.len());

    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let tracker = PoseTracker::new(TrackingConfig::default().with_max_iterations(5));
    let mut noise = NoiseGenerator::new(21);

    let (mut along_plain, mut along_weighted) = (Vec::new(), Vec::new());
    let (mut cross_plain, mut cross_weighted) = (Vec::new(), Vec::new());
    for _ in 0..12 {
        let prior = Pose2D::new(truth.x + noise.uniform(-0.3, 0.3), truth.y, truth.theta);
        let plain = tracker.refine(&intersector, &processed, prior, area, Some(&uniform.weights), &CancelToken::never());
        let weighted =
            tracker.refine(&intersector, &processed, prior, area, Some(&corridor.weights), &CancelToken::never());
        along_plain.push(plain.pose.x - truth.x);
        along_weighted.push(weighted.pose.x - truth.x);
        cross_plain.push(plain.pose.y - truth.y);
        cross_weighted.push(weighted.pose.y - truth.y);
    }

    assert!(
        variance(&along_plain) > variance(&along_weighted),
        "along-axis variance: plain {} weighted {}",
        variance(&along_plain),
        variance(&along_weighted)
    );
    assert!(variance(&cross_plain) < 1e-4);
    assert!(variance(&cross_weighted) < 1e-4);
}

#[test]
fn test_tracker_idempotent_at_fixed_point() {
    init_logging();
    let map = load(ROOM_AND_CORRIDOR);
    let truth = Pose2D::new(4.0, 1.5, 2.0);
    let processed = process(&scan_at(&map, &lidar().with_range_noise(0.005), truth, 1));
    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let tracker = PoseTracker::default();

    let prior = Pose2D::new(4.1, 1.4, 2.05);
    let first = tracker.refine(&intersector, &processed, prior, AreaId(1), None, &CancelToken::never());
    assert!(first.converged);

    let again = tracker.refine(&intersector, &processed, first.pose, first.area, None, &CancelToken::never());
    let step = again.first_increment.expect("fixed point still has correspondences");
    assert!(step.translation() < tracker.config().translation_epsilon);
    assert!(step.rotation() < tracker.config().rotation_epsilon);
}

#[test]
fn test_corridor_scan_more_corridor_like_than_room() {
    init_logging();
    let lidar = lidar().with_max_range(15.0);
    let corridor_map = load(LONG_CORRIDOR);
    let room_map = load(OPEN_ROOM);

    let corridor = process_dense(&scan_at(&corridor_map, &lidar, Pose2D::new(20.0, 1.0, 0.3), 1));
    let room = process_dense(&scan_at(&room_map, &lidar, Pose2D::new(5.0, 5.0, 0.3), 1));
    assert!(corridor.valid && room.valid);
    assert!(
        corridor.corridorness > room.corridorness,
        "corridor {} room {}",
        corridor.corridorness,
        room.corridorness
    );
}
