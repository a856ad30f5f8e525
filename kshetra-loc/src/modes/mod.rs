//! Pipeline driver and its process-wide state.
//!
//! - [`Localizer`]: runs one scan end-to-end (preprocess, global or tracking,
//!   area bookkeeping, corridor feedback).
//! - [`LocalizationState`]: the only mutable record, updated between frames.
//! - [`LatestScanSlot`] / [`CancelToken`]: newest-scan-wins hand-off from the
//!   sensor thread.

mod localization;
mod slot;
mod state;

pub use localization::{Localizer, LocalizerConfig};
pub use slot::{CancelToken, LatestScanSlot};
pub use state::{FrameMode, FrameResult, LocalizationState, PoseEstimate};
