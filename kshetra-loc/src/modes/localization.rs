//! Localization pipeline driver.
//!
//! # Pipeline
//!
//! ```text
//! Scan
//!   │
//!   ▼
//! ┌──────────────────┐  invalid   ┌─────────┐
//! │ ScanPreprocessor │ ─────────▶ │ Skipped │  state untouched
//! └────────┬─────────┘            └─────────┘
//!          │
//!    ┌─────┴──────────────┐
//!    │ initialized?       │
//!    ▼ no                 ▼ yes
//! ┌────────────────┐  ┌──────────────────────────────┐
//! │ GlobalLocalizer│  │ prior = pose ⊕ odometry      │
//! │ (guess once)   │  │ CorridornessOptimizer weights│
//! └───────┬────────┘  │ PoseTracker.refine           │
//!         │           │ AreaTracker.update           │
//!         │           └──────────────┬───────────────┘
//!         ▼                          ▼
//!   LocalizationState  ◀──  accept / count failure / fall back
//!         │
//!         ▼
//!   CorridorFeedback for the next frame
//! ```
//!
//! Tracking failures are counted; `fallback_patience` consecutive failures
//! or a topology inconsistency drop the state back to global search.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::slot::CancelToken;
use super::state::{FrameMode, FrameResult, LocalizationState, PoseEstimate};
use crate::config::{ConfigLoadError, KshetraConfig, defaults};
use crate::core::{Point2D, Pose2D, Scan};
use crate::corridor::{CorridorFeedback, CorridornessOptimizer};
use crate::error::LocalizationError;
use crate::global::{GlobalLocalizer, InitialGuess};
use crate::intersect::{IntersectConfig, RayMapIntersector};
use crate::map::{AreaGraphMap, AreaId, PolygonGeometry};
use crate::preprocess::{ProcessedScan, ScanPreprocessor};
use crate::tracking::{AreaTracker, PoseTracker, TrackState};

/// Configuration of the pipeline driver.
///
/// # Example
///
/// ```rust
/// use kshetra_loc::modes::LocalizerConfig;
///
/// let config = LocalizerConfig {
///     fallback_patience: 5,
///     emit_inside_points: true,
///     ..Default::default()
/// };
/// assert!(config.use_odometry_prior);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalizerConfig {
    /// Consecutive tracking failures before falling back to global search.
    /// Default: 3
    #[serde(default = "defaults::fallback_patience")]
    pub fallback_patience: usize,

    /// Tracking results below this confidence count as failures.
    /// Default: 0.2
    #[serde(default = "defaults::min_confidence")]
    pub min_confidence: f32,

    /// Attach inside-area points to every frame result.
    /// Default: false
    #[serde(default)]
    pub emit_inside_points: bool,

    /// Apply accumulated odometry deltas to the tracking prior.
    /// Default: true
    #[serde(default = "defaults::enabled")]
    pub use_odometry_prior: bool,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            fallback_patience: defaults::fallback_patience(),
            min_confidence: defaults::min_confidence(),
            emit_inside_points: false,
            use_odometry_prior: true,
        }
    }
}

impl LocalizerConfig {
    /// Check parameter ranges; returns the offending field on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.fallback_patience == 0 {
            return Err("localizer.fallback_patience".into());
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("localizer.min_confidence".into());
        }
        Ok(())
    }
}

/// Localizer against a known Area Graph.
///
/// Owns the per-component configuration and the [`LocalizationState`]; the
/// map is shared read-only.
///
/// ```rust,ignore
/// let mut localizer = Localizer::new(Arc::new(map), KshetraConfig::default())?;
/// localizer.set_initial_guess(guess);
/// loop {
///     let result = localizer.process_scan(&next_scan());
///     publish(result.estimate, result.area);
/// }
/// ```
pub struct Localizer {
    map: Arc<AreaGraphMap>,
    config: LocalizerConfig,
    intersect: IntersectConfig,
    preprocessor: ScanPreprocessor,
    optimizer: CorridornessOptimizer,
    pose_tracker: PoseTracker,
    area_tracker: AreaTracker,
    global: GlobalLocalizer,
    state: LocalizationState,
    pending_guess: Option<InitialGuess>,
    odometry: Option<Pose2D>,
    feedback: Option<CorridorFeedback>,
}

impl Localizer {
    /// Create a localizer over `map`.
    ///
    /// Fails with [`ConfigLoadError::Validation`] when a parameter is out of
    /// range, so hand-built configurations get the same checks as loaded ones.
    pub fn new(map: Arc<AreaGraphMap>, config: KshetraConfig) -> Result<Self, ConfigLoadError> {
        config.validate()?;
        Ok(Self {
            map,
            config: config.localizer,
            intersect: config.intersect,
            preprocessor: ScanPreprocessor::new(config.preprocess).with_corridor(config.corridor.clone()),
            optimizer: CorridornessOptimizer::new(config.corridor),
            pose_tracker: PoseTracker::new(config.tracking),
            area_tracker: AreaTracker::new(config.area),
            global: GlobalLocalizer::new(config.global),
            state: LocalizationState::new(),
            pending_guess: None,
            odometry: None,
            feedback: None,
        })
    }

    /// The shared map.
    pub fn map(&self) -> &Arc<AreaGraphMap> {
        &self.map
    }

    /// Current state.
    pub fn state(&self) -> &LocalizationState {
        &self.state
    }

    /// Driver configuration.
    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    /// Forget the pose, pending guess, odometry and corridor feedback.
    ///
    /// Frame diagnostics are kept.
    pub fn reset(&mut self) {
        self.state.fall_back();
        self.pending_guess = None;
        self.odometry = None;
        self.feedback = None;
    }

    /// Offer an external initial guess for the next global search.
    ///
    /// Returns false (and ignores the guess) when one has already been used
    /// since the last cold start, or when the localizer is tracking.
    pub fn set_initial_guess(&mut self, guess: InitialGuess) -> bool {
        if self.state.guess_consumed || self.state.initialized {
            log::debug!("Initial guess ignored (consumed: {}, initialized: {})", self.state.guess_consumed, self.state.initialized);
            return false;
        }
        if guess.is_empty() {
            return false;
        }
        self.pending_guess = Some(guess);
        true
    }

    /// Start tracking from a known pose.
    pub fn set_initial_pose(&mut self, pose: Pose2D) -> Result<AreaId, LocalizationError> {
        let area = self
            .map
            .locate(pose.position())
            .ok_or(LocalizationError::OutsideMap { x: pose.x, y: pose.y })?;
        self.state.accept(pose, area, 1.0);
        self.odometry = None;
        self.feedback = None;
        log::info!("Initial pose ({:.2}, {:.2}, {:.1}°) accepted in area {}", pose.x, pose.y, pose.theta.to_degrees(), area);
        Ok(area)
    }

    /// Accumulate an incremental motion (sensor frame) since the last delta.
    ///
    /// Deltas compose until the next tracked frame consumes them.
    pub fn add_odometry_delta(&mut self, delta: Pose2D) {
        self.odometry = Some(match self.odometry {
            Some(acc) => acc.compose(delta),
            None => delta,
        });
    }

    /// Process one scan to completion.
    pub fn process_scan(&mut self, scan: &Scan) -> FrameResult {
        self.process_scan_cancellable(scan, &CancelToken::never())
    }

    /// Process one scan, abandoning it when `cancel` fires.
    ///
    /// A cancelled frame leaves the state unchanged apart from diagnostics.
    pub fn process_scan_cancellable(&mut self, scan: &Scan, cancel: &CancelToken) -> FrameResult {
        let start = Instant::now();
        self.state.frames_received += 1;

        let processed = self.preprocessor.process(scan, self.feedback.as_ref());
        let mut result = if !processed.valid {
            log::warn!("Skipping scan {}: degenerate after preprocessing", scan.sequence);
            FrameResult {
                sequence: scan.sequence,
                estimate: PoseEstimate::invalid(self.state.pose),
                area: self.state.area,
                transitioned: false,
                mode: FrameMode::Skipped,
                skipped: true,
                cancelled: false,
                corridorness: processed.corridorness,
                inside_points: None,
                processing_time: Default::default(),
            }
        } else {
            match self.state.area.filter(|_| self.state.initialized) {
                Some(area) => self.track(&processed, area, cancel),
                None => self.relocalize(&processed, cancel),
            }
        };

        if !result.skipped && !result.cancelled {
            self.state.frames_processed += 1;
        }
        if self.config.emit_inside_points && result.estimate.valid {
            let pose = result.estimate.pose;
            result.inside_points = result.area.map(|area| self.inside_points(&processed, pose, area));
        }
        result.processing_time = start.elapsed();
        self.state.total_processing += result.processing_time;
        log::debug!(
            "Frame {} {:?} in {:.1} ms (mean {:.1} ms)",
            result.sequence,
            result.mode,
            result.processing_time.as_secs_f64() * 1e3,
            self.state.mean_frame_time().as_secs_f64() * 1e3
        );
        result
    }

    fn relocalize(&mut self, processed: &ProcessedScan, cancel: &CancelToken) -> FrameResult {
        let map = Arc::clone(&self.map);
        let intersector = RayMapIntersector::new(&map, self.intersect);
        let guess = if self.state.guess_consumed {
            None
        } else {
            self.pending_guess.take()
        };

        let global = self.global.localize(&intersector, &self.pose_tracker, processed, guess.as_ref(), cancel);
        let mut result = self.frame(processed, FrameMode::Global);
        if global.cancelled {
            // The guess stays available for the next frame.
            self.pending_guess = guess;
            result.cancelled = true;
            return result;
        }
        if guess.is_some() {
            self.state.guess_consumed = true;
        }
        if !global.valid {
            return result;
        }

        self.state.accept(global.pose, global.area, global.confidence);
        self.odometry = None;
        self.update_feedback(&map, global.pose, global.area);
        log::info!(
            "Localized in area {} (fitness {:.2}, confidence {:.2})",
            global.area,
            global.fitness,
            global.confidence
        );
        result.estimate = PoseEstimate {
            pose: global.pose,
            valid: true,
            confidence: global.confidence,
            converged: true,
        };
        result.area = Some(global.area);
        result.transitioned = true;
        result
    }

    fn track(&mut self, processed: &ProcessedScan, area: AreaId, cancel: &CancelToken) -> FrameResult {
        let map = Arc::clone(&self.map);
        let intersector = RayMapIntersector::new(&map, self.intersect);
        let delta = if self.config.use_odometry_prior {
            self.odometry.take()
        } else {
            None
        };
        let prior = delta.map_or(self.state.pose, |d| self.state.pose.compose(d));

        let weights = self.optimizer.compute_weights(&map, processed, prior, area);
        let tracked = self
            .pose_tracker
            .refine(&intersector, processed, prior, area, Some(&weights.weights), cancel);
        let mut result = self.frame(processed, FrameMode::Tracking);

        if tracked.state == TrackState::Cancelled {
            if let Some(d) = delta {
                // Re-queue the motion in front of anything received since.
                self.odometry = Some(match self.odometry {
                    Some(later) => d.compose(later),
                    None => d,
                });
            }
            result.cancelled = true;
            return result;
        }

        let usable = matches!(tracked.state, TrackState::Converged | TrackState::IterationExhausted)
            && tracked.confidence >= self.config.min_confidence;
        if !usable {
            self.state.consecutive_failures += 1;
            self.state.pose = prior;
            self.state.confidence = tracked.confidence;
            log::warn!(
                "Tracking failed ({:?}, confidence {:.2}), {} of {} before fallback",
                tracked.state,
                tracked.confidence,
                self.state.consecutive_failures,
                self.config.fallback_patience
            );
            if self.state.consecutive_failures >= self.config.fallback_patience {
                log::info!("Falling back to global localization");
                self.fall_back();
            }
            result.estimate = PoseEstimate {
                confidence: tracked.confidence,
                ..PoseEstimate::invalid(prior)
            };
            result.area = self.state.area;
            return result;
        }

        match self.area_tracker.update(&map, tracked.pose, area) {
            Ok(update) => {
                self.state.accept(tracked.pose, update.area, tracked.confidence);
                self.update_feedback(&map, tracked.pose, update.area);
                result.estimate = PoseEstimate {
                    pose: tracked.pose,
                    valid: true,
                    confidence: tracked.confidence,
                    converged: tracked.converged,
                };
                result.area = Some(update.area);
                result.transitioned = update.transitioned;
            }
            Err(err) => {
                log::warn!("{}; falling back to global localization", err);
                self.fall_back();
                result.estimate = PoseEstimate::invalid(tracked.pose);
                result.area = None;
            }
        }
        result
    }

    fn fall_back(&mut self) {
        self.state.fall_back();
        self.odometry = None;
        self.feedback = None;
    }

    fn update_feedback(&mut self, map: &AreaGraphMap, pose: Pose2D, area: AreaId) {
        self.feedback = Some(self.optimizer.feedback(map, pose, area));
    }

    /// Frame result skeleton carrying the current state.
    fn frame(&self, processed: &ProcessedScan, mode: FrameMode) -> FrameResult {
        FrameResult {
            sequence: processed.sequence,
            estimate: PoseEstimate::invalid(self.state.pose),
            area: self.state.area,
            transitioned: false,
            mode,
            skipped: false,
            cancelled: false,
            corridorness: processed.corridorness,
            inside_points: None,
            processing_time: Default::default(),
        }
    }

    fn inside_points(&self, processed: &ProcessedScan, pose: Pose2D, area: AreaId) -> Vec<Point2D> {
        let Some(polygon) = self.map.area(area) else {
            return Vec::new();
        };
        processed
            .points
            .iter()
            .map(|p| pose.transform_point(p.point))
            .filter(|&p| polygon.contains(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::WeightedPose;
    use crate::sim::SyntheticLidar;

    // L-shaped room: asymmetric, so global search is unambiguous.
    const ROOM: &str = "areas: [ { id: 1, vertices: [[0, 0], [6, 0], [6, 3], [3, 3], [3, 5], [0, 5]] } ]";

    fn setup() -> (Arc<AreaGraphMap>, SyntheticLidar) {
        let map = Arc::new(AreaGraphMap::from_yaml_str(ROOM).unwrap());
        (map, SyntheticLidar::default().with_shape(8, 360))
    }

    #[test]
    fn test_initial_pose_then_tracking() {
        let (map, lidar) = setup();
        let mut localizer = Localizer::new(Arc::clone(&map), KshetraConfig::default()).unwrap();
        let truth = Pose2D::new(1.5, 1.5, 0.2);
        localizer.set_initial_pose(Pose2D::new(1.6, 1.45, 0.22)).unwrap();

        let scan = lidar.generate(&map, truth, AreaId(1), 1).unwrap();
        let result = localizer.process_scan(&scan);
        assert_eq!(result.mode, FrameMode::Tracking);
        assert!(result.estimate.valid);
        assert!(result.estimate.pose.distance(truth) < 0.05, "{:?}", result.estimate.pose);
        assert_eq!(result.area, Some(AreaId(1)));
        assert_eq!(localizer.state().frames_processed, 1);
    }

    #[test]
    fn test_initial_pose_outside_map_rejected() {
        let (map, _) = setup();
        let mut localizer = Localizer::new(map, KshetraConfig::default()).unwrap();
        let err = localizer.set_initial_pose(Pose2D::new(5.0, 4.0, 0.0)).unwrap_err();
        assert_eq!(err, LocalizationError::OutsideMap { x: 5.0, y: 4.0 });
        assert!(!localizer.state().initialized);
    }

    #[test]
    fn test_guess_accepted_once() {
        let (map, lidar) = setup();
        let mut localizer = Localizer::new(Arc::clone(&map), KshetraConfig::default()).unwrap();
        let truth = Pose2D::new(4.5, 1.5, -0.5);
        let guess = InitialGuess::single(WeightedPose::new(Point2D::new(4.3, 1.6), -0.4, 1.0));
        assert!(localizer.set_initial_guess(guess.clone()));

        let scan = lidar.generate(&map, truth, AreaId(1), 1).unwrap();
        let result = localizer.process_scan(&scan);
        assert_eq!(result.mode, FrameMode::Global);
        assert!(result.estimate.valid);
        assert!(result.estimate.pose.distance(truth) < 0.1);
        assert!(localizer.state().guess_consumed);
        assert!(!localizer.set_initial_guess(guess));
    }

    #[test]
    fn test_degenerate_scan_skipped() {
        let (map, _) = setup();
        let mut localizer = Localizer::new(map, KshetraConfig::default()).unwrap();
        localizer.set_initial_pose(Pose2D::new(1.0, 1.0, 0.0)).unwrap();
        let empty = Scan::new(7, 0, 1, 16, vec![crate::core::ScanPoint::invalid(); 16]).unwrap();
        let result = localizer.process_scan(&empty);
        assert!(result.skipped);
        assert_eq!(result.mode, FrameMode::Skipped);
        assert!(localizer.state().initialized);
        assert_eq!(localizer.state().frames_received, 1);
        assert_eq!(localizer.state().frames_processed, 0);
    }

    #[test]
    fn test_odometry_deltas_compose() {
        let (map, _) = setup();
        let mut localizer = Localizer::new(map, KshetraConfig::default()).unwrap();
        localizer.add_odometry_delta(Pose2D::new(0.1, 0.0, std::f32::consts::FRAC_PI_2));
        localizer.add_odometry_delta(Pose2D::new(0.1, 0.0, 0.0));
        let acc = localizer.odometry.unwrap();
        assert!(acc.approx_eq(Pose2D::new(0.1, 0.1, std::f32::consts::FRAC_PI_2), 1e-5, 1e-5));
    }

    #[test]
    fn test_odometry_prior_used_for_tracking() {
        let (map, lidar) = setup();
        let mut localizer = Localizer::new(Arc::clone(&map), KshetraConfig::default()).unwrap();
        let start = Pose2D::new(1.5, 1.5, 0.0);
        localizer.set_initial_pose(start).unwrap();
        // Large jump that tracking alone would not bridge, announced by odometry.
        let moved = Pose2D::new(4.5, 1.5, 0.0);
        localizer.add_odometry_delta(start.inverse().compose(moved));
        let scan = lidar.generate(&map, moved, AreaId(1), 1).unwrap();
        let result = localizer.process_scan(&scan);
        assert!(result.estimate.valid);
        assert!(result.estimate.pose.distance(moved) < 0.05);
    }

    #[test]
    fn test_inside_points_emitted() {
        let (map, lidar) = setup();
        let config = KshetraConfig {
            localizer: LocalizerConfig {
                emit_inside_points: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut localizer = Localizer::new(Arc::clone(&map), config).unwrap();
        let truth = Pose2D::new(1.5, 1.5, 0.0);
        localizer.set_initial_pose(truth).unwrap();
        let result = localizer.process_scan(&lidar.generate(&map, truth, AreaId(1), 1).unwrap());
        let inside = result.inside_points.unwrap();
        assert!(!inside.is_empty());
        let polygon = map.area(AreaId(1)).unwrap();
        assert!(inside.iter().all(|&p| polygon.contains(p)));
    }

    #[test]
    fn test_repeated_failures_fall_back() {
        let (map, _) = setup();
        let config = KshetraConfig {
            localizer: LocalizerConfig {
                fallback_patience: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut localizer = Localizer::new(Arc::clone(&map), config).unwrap();
        localizer.set_initial_pose(Pose2D::new(1.0, 1.0, 0.0)).unwrap();

        // Returns from a 40 m ring around the sensor: nothing like the room.
        let ring = SyntheticLidar::default().with_shape(1, 360);
        let far = AreaGraphMap::from_yaml_str(
            "areas: [ { id: 9, vertices: [[-20, -20], [20, -20], [20, 20], [-20, 20]] } ]",
        )
        .unwrap();
        for seq in 0..2 {
            let scan = ring.generate(&far, Pose2D::identity(), AreaId(9), seq).unwrap();
            let result = localizer.process_scan(&scan);
            assert!(!result.estimate.valid);
        }
        assert!(!localizer.state().initialized);
        assert_eq!(localizer.state().area, None);
    }

    #[test]
    fn test_cancelled_frame_keeps_state() {
        let (map, lidar) = setup();
        let mut localizer = Localizer::new(Arc::clone(&map), KshetraConfig::default()).unwrap();
        let slot = crate::modes::LatestScanSlot::new();
        let scan = lidar.generate(&map, Pose2D::new(1.5, 1.5, 0.0), AreaId(1), 1).unwrap();
        slot.publish(lidar.generate(&map, Pose2D::new(1.5, 1.5, 0.0), AreaId(1), 2).unwrap());
        let result = localizer.process_scan_cancellable(&scan, &slot.token_for(1));
        assert!(result.cancelled);
        assert!(!localizer.state().initialized);
        assert_eq!(localizer.state().frames_processed, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (map, _) = setup();
        let mut config = KshetraConfig::default();
        config.preprocess.sectors = 0;
        match Localizer::new(map, config) {
            Err(ConfigLoadError::Validation(field)) => assert_eq!(field, "preprocess.sectors"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("zero sectors accepted"),
        }
    }
}
