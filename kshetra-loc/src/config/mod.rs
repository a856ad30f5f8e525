//! Unified configuration loading.
//!
//! All component settings live in one YAML file; every field has a default,
//! so a partial (or absent) file is fine.
//!
//! ```rust,ignore
//! use kshetra_loc::config::KshetraConfig;
//!
//! // configs/kshetra.yaml when present, built-in defaults otherwise
//! let config = KshetraConfig::load_default()?;
//! let localizer = Localizer::new(map, config)?;
//! ```
//!
//! | Section | Component |
//! |---------|-----------|
//! | `preprocess` | [`ScanPreprocessor`](crate::preprocess::ScanPreprocessor) |
//! | `intersect` | [`RayMapIntersector`](crate::intersect::RayMapIntersector) |
//! | `corridor` | [`CorridornessOptimizer`](crate::corridor::CorridornessOptimizer) |
//! | `global` | [`GlobalLocalizer`](crate::global::GlobalLocalizer) |
//! | `tracking` | [`PoseTracker`](crate::tracking::PoseTracker) |
//! | `area` | [`AreaTracker`](crate::tracking::AreaTracker) |
//! | `localizer` | [`Localizer`](crate::modes::Localizer) |

pub(crate) mod defaults;
mod error;
mod kshetra;

pub use error::ConfigLoadError;
pub use kshetra::{DEFAULT_CONFIG_PATH, KshetraConfig};
