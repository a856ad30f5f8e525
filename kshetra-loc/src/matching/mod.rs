//! Point-to-line matching primitives shared by global scoring and tracking.

mod correspondence;
mod robust;
mod solver;

pub use correspondence::{Correspondence, CorrespondenceSet};
pub use robust::RobustKernel;
pub use solver::{PoseIncrement, solve_increment};
