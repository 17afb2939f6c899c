//! `sw-spatial`: road network, snapping, and shade-biased routing.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`curve`]  | `RoadCurve` (piecewise-linear, arc-length parametrised)      |
//! | [`roads`]  | `RoadLayer` from GeoJSON, built-in fallback road             |
//! | [`graph`]  | `RoadGraph` (node/edge arenas + R-tree), `RoadGraphBuilder`, shade sampling |
//! | [`router`] | `Router` trait, `ShadeAStarRouter`, `Route`, `find_path`     |
//! | [`error`]  | `SpatialError`, `SpatialResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on parameter types.        |

pub mod curve;
pub mod error;
pub mod graph;
pub mod roads;
pub mod router;


pub use curve::RoadCurve;
pub use error::{SpatialError, SpatialResult};
pub use graph::{GraphParams, RoadEdge, RoadGraph, RoadGraphBuilder, RoadNode, ShadeSampler, Snap};
pub use roads::{RoadLayer, load_roads_or_fallback};
pub use router::{Route, Router, ShadeAStarRouter, ShadePreference, find_path};
