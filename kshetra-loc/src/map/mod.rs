//! Area Graph map: polygonal areas connected through passage edges.
//!
//! ```text
//!   ┌──────────────┐
//!   │   area 1     │          ┌────────────────────┐
//!   │   (room)     ╎ passage  │  area 2 (corridor) │
//!   │              ╎─────────▶│                    ╎ exterior
//!   └──────────────┘          └────────────────────┘
//! ```
//!
//! Areas are simple counter-clockwise polygons. Each boundary edge is either
//! a wall or a passage; passages lead to a neighboring area (sharing the
//! edge's two vertices) or to the exterior. The map is validated at load
//! time and is immutable afterwards.

mod area;
mod description;
mod geometry;
mod graph;
mod validate;

pub use area::{Area, AreaId, EdgeKind, EdgeRef, PassageTarget};
pub use description::{AreaDescription, MapDescription, PassageDescription};
pub use geometry::{
    EdgeHit, PolygonGeometry, cast_ray_edge, point_segment_distance, ray_segment_intersection,
    segments_intersect,
};
pub use graph::AreaGraphMap;
