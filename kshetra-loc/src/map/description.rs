//! Persisted map description (YAML).
//!
//! ```yaml
//! areas:
//!   - id: 1
//!     vertices: [[0.0, 0.0], [6.0, 0.0], [6.0, 2.4], [6.0, 3.6], [6.0, 6.0], [0.0, 6.0]]
//!     passages:
//!       - { edge: 2, to: 2 }   # opening into area 2
//!       - { edge: 5 }          # no `to`: opening to the exterior
//! ```
//!
//! Vertex order may be either orientation; loading normalizes to
//! counter-clockwise and remaps passage edge indices accordingly.

use serde::{Deserialize, Serialize};

/// Whole-map description.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MapDescription {
    /// Areas in any order.
    pub areas: Vec<AreaDescription>,
}

/// One area polygon.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaDescription {
    /// Unique id.
    pub id: u32,
    /// Boundary vertices `[x, y]` in meters; closing vertex optional.
    pub vertices: Vec<[f32; 2]>,
    /// Passage edges.
    #[serde(default)]
    pub passages: Vec<PassageDescription>,
}

/// A passage on edge `edge` (vertex `edge` to vertex `edge + 1`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassageDescription {
    /// Edge index in the listed vertex order.
    pub edge: usize,
    /// Neighbor id; absent for exterior openings.
    #[serde(default)]
    pub to: Option<u32>,
}
