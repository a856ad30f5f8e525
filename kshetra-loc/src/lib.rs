//! # Kshetra
//!
//! Indoor localization of a 3D lidar against an Area Graph: a polygonal map
//! of rooms and corridors joined by passages.
//!
//! ## Overview
//!
//! ```text
//!        Scan (rings x columns)
//!          │
//!          ▼
//!   ScanPreprocessor ◀─────────────── CorridorFeedback (previous frame)
//!          │ ProcessedScan                      ▲
//!          ▼                                    │
//!   ┌──────────────┐   no prior   ┌────────────────┐
//!   │  Localizer   │ ───────────▶ │ GlobalLocalizer│
//!   └──────┬───────┘              └────────────────┘
//!          │ prior pose
//!          ▼
//!   CorridornessOptimizer ──weights──▶ PoseTracker ──▶ AreaTracker
//!                                          │               │
//!                                  RayMapIntersector   AreaGraphMap
//! ```
//!
//! - **Map**: immutable [`AreaGraphMap`], validated at load (simple polygons,
//!   reciprocal passages). Shared read-only, typically in an `Arc`.
//! - **Geometry**: one [`map::PolygonGeometry`] capability provides
//!   point-in-polygon and ray casting for every component.
//! - **Tracking**: weighted point-to-line alignment; corridor weighting keeps
//!   the along-axis direction observable in long corridors.
//! - **Recovery**: repeated tracking failure or a pose outside every
//!   reachable area falls back to global search.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kshetra_loc::{AreaGraphMap, KshetraConfig, Localizer};
//!
//! let map = Arc::new(AreaGraphMap::from_yaml_file("configs/building.yaml")?);
//! let mut localizer = Localizer::new(map, KshetraConfig::load_default()?)?;
//!
//! for scan in scans {
//!     let frame = localizer.process_scan(&scan);
//!     if frame.estimate.valid {
//!         println!("{:?} in area {:?}", frame.estimate.pose, frame.area);
//!     }
//! }
//! ```
//!
//! ## Coordinate System
//!
//! Uses ROS REP-103 convention:
//! - X: Forward
//! - Y: Left
//! - Theta: Rotation in radians, CCW positive from +X axis

#![warn(missing_docs)]

// Geometric primitives and organized scans
pub mod core;

// Unified configuration
pub mod config;

// Error types
pub mod error;

// Area Graph map
pub mod map;

// Scan preprocessing
pub mod preprocess;

// Corridor detection and weighting
pub mod corridor;

// Ray casting against the map
pub mod intersect;

// Point-to-line correspondences and solver
pub mod matching;

// Global localization
pub mod global;

// Pose and area tracking
pub mod tracking;

// Pipeline driver
pub mod modes;

// Synthetic lidar
pub mod sim;

// Re-export commonly used types
pub use crate::core::{Point2D, Pose2D, Scan, ScanIndex, ScanPoint};

pub use config::{ConfigLoadError, KshetraConfig};

pub use error::{LocalizationError, MapError, ScanError};

pub use map::{Area, AreaGraphMap, AreaId, PassageTarget, PolygonGeometry};

pub use preprocess::{ProcessedScan, ScanPreprocessor};

pub use corridor::CorridornessOptimizer;

pub use intersect::{RayHit, RayMapIntersector};

pub use matching::CorrespondenceSet;

pub use global::{GlobalLocalizer, GlobalResult, InitialGuess, WeightedPose};

pub use tracking::{AreaTracker, PoseTracker, TrackingResult};

pub use modes::{CancelToken, FrameResult, LatestScanSlot, LocalizationState, Localizer};
