//! Benchmark global localization, pose tracking and ray casting.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use kshetra_loc::global::GlobalConfig;
use kshetra_loc::intersect::IntersectConfig;
use kshetra_loc::sim::SyntheticLidar;
use kshetra_loc::tracking::TrackingConfig;
use kshetra_loc::{
    AreaGraphMap, AreaId, CancelToken, GlobalLocalizer, KshetraConfig, Localizer, Pose2D,
    PoseTracker, ProcessedScan, RayMapIntersector, ScanPreprocessor,
};

/// Room with a doorway into a corridor.
const MAP: &str = r#"
areas:
  - id: 1
    vertices: [[0, 0], [6, 0], [6, 2.4], [6, 3.6], [6, 6], [0, 6]]
    passages:
      - { edge: 2, to: 2 }
  - id: 2
    vertices: [[6, 2.4], [14, 2.4], [14, 3.6], [6, 3.6]]
    passages:
      - { edge: 3, to: 1 }
"#;

fn load_map() -> AreaGraphMap {
    AreaGraphMap::from_yaml_str(MAP).unwrap()
}

fn processed_scan(map: &AreaGraphMap, pose: Pose2D, columns: usize) -> ProcessedScan {
    let area = map.locate(pose.position()).unwrap();
    let scan = SyntheticLidar::default()
        .with_shape(16, columns)
        .generate(map, pose, area, 0)
        .unwrap();
    ScanPreprocessor::default().process(&scan, None)
}

fn bench_ray_casting(c: &mut Criterion) {
    let mut group = c.benchmark_group("ray_casting");
    let map = load_map();
    let pose = Pose2D::new(3.0, 3.0, 0.2);

    for columns in [360, 720, 1440].iter() {
        let scan = processed_scan(&map, pose, *columns);
        for parallel in [false, true] {
            let intersector =
                RayMapIntersector::new(&map, IntersectConfig::default().with_parallel(parallel));
            let id = format!("{}_{}", columns, if parallel { "par" } else { "seq" });
            group.bench_with_input(BenchmarkId::from_parameter(id), &scan, |b, scan| {
                b.iter(|| {
                    black_box(intersector.intersect_all(black_box(&scan.points), pose, AreaId(1)))
                })
            });
        }
    }

    group.finish();
}

fn bench_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_tracking");
    let map = load_map();
    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let truth = Pose2D::new(3.0, 3.0, 0.2);
    let scan = processed_scan(&map, truth, 720);

    for offset in [0.05f32, 0.2, 0.4].iter() {
        let prior = Pose2D::new(truth.x + offset, truth.y - offset, truth.theta + offset * 0.2);
        let tracker = PoseTracker::new(TrackingConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(offset), &prior, |b, &prior| {
            b.iter(|| {
                let result = tracker.refine(
                    &intersector,
                    black_box(&scan),
                    prior,
                    AreaId(1),
                    None,
                    &CancelToken::never(),
                );
                black_box(result)
            })
        });
    }

    group.finish();
}

fn bench_global(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_localization");
    group.sample_size(10);
    let map = load_map();
    let intersector = RayMapIntersector::new(&map, IntersectConfig::default());
    let scan = processed_scan(&map, Pose2D::new(2.0, 4.0, 0.7), 720);
    let tracker = PoseTracker::new(TrackingConfig::default());

    for step in [0.6f32, 0.4].iter() {
        let localizer =
            GlobalLocalizer::new(GlobalConfig::default().with_grid_resolution(*step, 10.0));
        group.bench_with_input(BenchmarkId::from_parameter(step), &scan, |b, scan| {
            b.iter(|| {
                black_box(localizer.localize(
                    &intersector,
                    &tracker,
                    black_box(scan),
                    None,
                    &CancelToken::never(),
                ))
            })
        });
    }

    group.finish();
}

fn bench_frame_pipeline(c: &mut Criterion) {
    let map = std::sync::Arc::new(load_map());
    let lidar = SyntheticLidar::default();
    let start = Pose2D::new(3.0, 3.0, 0.0);
    let scan = lidar.generate(&map, start, AreaId(1), 0).unwrap();

    c.bench_function("tracking_frame", |b| {
        let mut localizer = Localizer::new(map.clone(), KshetraConfig::default()).unwrap();
        localizer.set_initial_pose(start).unwrap();
        b.iter(|| black_box(localizer.process_scan(black_box(&scan))))
    });
}

criterion_group!(
    benches,
    bench_ray_casting,
    bench_tracking,
    bench_global,
    bench_frame_pipeline
);
criterion_main!(benches);
