//! Process-wide localization state and per-frame results.

use std::time::Duration;

use crate::core::{Point2D, Pose2D};
use crate::map::AreaId;

/// Localization state, mutated only by the pipeline between frames.
///
/// # Lifecycle
///
/// ```text
/// ┌───────────────┐  global success / initial pose  ┌─────────────┐
/// │ Uninitialized │ ──────────────────────────────▶ │ Initialized │──┐ tracking
/// └───────────────┘ ◀────────────────────────────── └─────────────┘◀─┘
///                    repeated failure / topology inconsistency
/// ```
#[derive(Clone, Debug, Default)]
pub struct LocalizationState {
    /// Current best pose.
    pub pose: Pose2D,
    /// Area containing `pose`; `None` while uninitialized.
    pub area: Option<AreaId>,
    /// True once a pose has been found or supplied.
    pub initialized: bool,
    /// Confidence of the last accepted pose (0..1).
    pub confidence: f32,
    /// Scans handed to the pipeline.
    pub frames_received: u64,
    /// Scans that produced a pose attempt (not skipped or cancelled).
    pub frames_processed: u64,
    /// Processing time summed over received frames.
    pub total_processing: Duration,
    /// Tracking failures since the last accepted pose.
    pub consecutive_failures: usize,
    /// An initial guess has been used since the last cold start.
    pub guess_consumed: bool,
}

impl LocalizationState {
    /// Fresh, uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean processing time per received frame.
    pub fn mean_frame_time(&self) -> Duration {
        if self.frames_received == 0 {
            return Duration::ZERO;
        }
        let n = u32::try_from(self.frames_received).unwrap_or(u32::MAX);
        self.total_processing / n
    }

    /// Accept `pose` in `area`.
    pub(crate) fn accept(&mut self, pose: Pose2D, area: AreaId, confidence: f32) {
        self.pose = pose;
        self.area = Some(area);
        self.initialized = true;
        self.confidence = confidence;
        self.consecutive_failures = 0;
    }

    /// Drop the pose and re-arm the initial guess. Diagnostics are kept.
    pub(crate) fn fall_back(&mut self) {
        self.area = None;
        self.initialized = false;
        self.confidence = 0.0;
        self.consecutive_failures = 0;
        self.guess_consumed = false;
    }
}

/// Which path handled a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// Global search (no prior pose).
    Global,
    /// Local refinement from the previous pose.
    Tracking,
    /// Degenerate scan; state untouched.
    Skipped,
}

/// Pose with its quality flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseEstimate {
    /// Pose in the map frame.
    pub pose: Pose2D,
    /// False when the frame produced no usable pose.
    pub valid: bool,
    /// Quality score (0..1).
    pub confidence: f32,
    /// Refinement converged (always false for failed frames).
    pub converged: bool,
}

impl PoseEstimate {
    /// Invalid estimate carrying the last known pose.
    pub fn invalid(pose: Pose2D) -> Self {
        Self {
            pose,
            valid: false,
            confidence: 0.0,
            converged: false,
        }
    }
}

/// Per-frame egress of the pipeline.
#[derive(Clone, Debug)]
pub struct FrameResult {
    /// Sequence number of the scan.
    pub sequence: u64,
    /// Pose produced for this frame.
    pub estimate: PoseEstimate,
    /// Current area after this frame.
    pub area: Option<AreaId>,
    /// The area changed during this frame.
    pub transitioned: bool,
    /// Path taken.
    pub mode: FrameMode,
    /// Frame was a degenerate scan.
    pub skipped: bool,
    /// Frame was abandoned for a newer scan.
    pub cancelled: bool,
    /// Corridorness of the processed scan.
    pub corridorness: f32,
    /// Retained points in the map frame that lie inside `area`, when enabled.
    pub inside_points: Option<Vec<Point2D>>,
    /// Wall time spent on the frame.
    pub processing_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_frame_time() {
        let mut state = LocalizationState::new();
        assert_eq!(state.mean_frame_time(), Duration::ZERO);
        state.frames_received = 4;
        state.total_processing = Duration::from_millis(100);
        assert_eq!(state.mean_frame_time(), Duration::from_millis(25));
    }

    #[test]
    fn test_fall_back_keeps_diagnostics() {
        let mut state = LocalizationState::new();
        state.accept(Pose2D::new(1.0, 2.0, 0.0), AreaId(3), 0.9);
        state.frames_received = 10;
        state.guess_consumed = true;
        state.fall_back();
        assert!(!state.initialized);
        assert_eq!(state.area, None);
        assert!(!state.guess_consumed);
        assert_eq!(state.frames_received, 10);
    }
}
