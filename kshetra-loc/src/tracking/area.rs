//! Current-area bookkeeping across passage crossings.

use std::collections::{HashSet, VecDeque};

use super::config::AreaTrackerConfig;
use crate::core::Pose2D;
use crate::error::LocalizationError;
use crate::map::{AreaGraphMap, AreaId, PassageTarget, PolygonGeometry, point_segment_distance};

/// Outcome of [`AreaTracker::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AreaUpdate {
    /// Area containing the pose.
    pub area: AreaId,
    /// True when `area` differs from the previous one.
    pub transitioned: bool,
    /// Passages walked to find `area` (0 when unchanged).
    pub hops: usize,
}

/// Keeps the current area consistent with the refined pose.
#[derive(Clone, Debug, Default)]
pub struct AreaTracker {
    config: AreaTrackerConfig,
}

impl AreaTracker {
    /// Create a tracker.
    pub fn new(config: AreaTrackerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &AreaTrackerConfig {
        &self.config
    }

    /// Confirm `pose` is still in `area` or walk the passages to the area that holds it.
    ///
    /// Passages are expanded nearest-first, breadth-first, at most
    /// `max_hops` deep. Fails with [`LocalizationError::TopologyInconsistency`]
    /// when no reachable area contains the pose.
    pub fn update(
        &self,
        map: &AreaGraphMap,
        pose: Pose2D,
        area: AreaId,
    ) -> Result<AreaUpdate, LocalizationError> {
        let p = pose.position();
        let inconsistent = LocalizationError::TopologyInconsistency {
            from: area,
            x: pose.x,
            y: pose.y,
        };
        let Some(current) = map.area(area) else {
            return Err(inconsistent);
        };
        if current.contains(p) {
            return Ok(AreaUpdate {
                area,
                transitioned: false,
                hops: 0,
            });
        }

        let mut visited = HashSet::from([area]);
        let mut queue = VecDeque::from([(area, 0usize)]);
        while let Some((id, depth)) = queue.pop_front() {
            if depth >= self.config.max_hops {
                continue;
            }
            let Some(from) = map.area(id) else {
                continue;
            };

            let mut exits: Vec<(f32, AreaId)> = from
                .passages()
                .filter_map(|(edge, target)| match target {
                    PassageTarget::Area(next) => {
                        let (a, b) = from.edge(edge);
                        Some((point_segment_distance(p, a, b).0, next))
                    }
                    PassageTarget::Exterior => None,
                })
                .collect();
            exits.sort_by(|a, b| a.0.total_cmp(&b.0));

            for (_, next) in exits {
                if !visited.insert(next) {
                    continue;
                }
                if map.area(next).is_some_and(|a| a.contains(p)) {
                    log::info!("Area transition {} -> {} after {} hop(s)", area, next, depth + 1);
                    return Ok(AreaUpdate {
                        area: next,
                        transitioned: true,
                        hops: depth + 1,
                    });
                }
                queue.push_back((next, depth + 1));
            }
        }

        log::warn!(
            "Pose ({:.2}, {:.2}) not in area {} or any area within {} passage(s)",
            pose.x,
            pose.y,
            area,
            self.config.max_hops
        );
        Err(inconsistent)
    }
}
