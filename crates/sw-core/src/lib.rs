//! `sw-core`: foundational types for the `shadewalk` pedestrian simulation.
//!
//! Every other `sw-*` crate depends on this one.  It has no `sw-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `EdgeId`, `AgentId`                            |
//! | [`geo`]         | `GeoPoint`, `LocalProjector`, `FitTransform`, `SceneFrame` |
//! | [`geojson`]     | `FeatureCollection` reader (lines + polygons)            |
//! | [`time`]        | `Tick`, `SimClock`, ISO-8601 timestamp parsing           |
//! | [`rng`]         | `SimRng` (seeded, deterministic)                         |
//! | [`error`]       | `SwError`, `SwResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `GeoPoint`.      |
//!
//! Positions in local scene space are [`glam::Vec3`] with `y` up; the
//! re-export keeps downstream crates on the same `glam` version.

pub mod error;
pub mod geo;
pub mod geojson;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use glam::Vec3;

pub use error::{SwError, SwResult};
pub use geo::{FitTransform, GeoPoint, LocalProjector, SceneFrame};
pub use geojson::{FeatureCollection, LineFeature, PolygonFeature, Properties};
pub use ids::{AgentId, EdgeId, NodeId};
pub use rng::SimRng;
pub use time::{SimClock, Tick, parse_timestamp};
