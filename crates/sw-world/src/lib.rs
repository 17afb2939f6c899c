//! `sw-world`: the 3D world as the simulation sees it.
//!
//! The core never touches meshes or a scene graph.  Everything it needs from
//! the world is one question: *where does this ray first hit something?*
//! That question is the [`ObstacleQuery`] trait.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`query`]     | `Ray`, `RayHit`, `HitFilter`, `SurfaceTag`, `ObstacleQuery`, `OpenSky` |
//! | [`boxes`]     | `BoxWorld` (tagged AABBs, slab test), placeholder city mass |
//! | [`buildings`] | Footprint extrusion from GeoJSON, load-or-placeholder     |
//! | [`vegetation`] | Tree polygons lifted into canopy boxes                   |
//! | [`error`]     | `WorldError`, `WorldResult<T>`                            |
//!
//! # Tags
//!
//! Obstacle-tagged objects (buildings, city mass) block steering probes and
//! FOV rays.  Passable objects (ground, road surfaces) and canopy (tree
//! crowns) are ignored by those queries but still cast shadows for shade
//! sampling, which uses [`HitFilter::Any`].

pub mod boxes;
pub mod buildings;
pub mod error;
pub mod query;
pub mod vegetation;


pub use boxes::{BoxWorld, WorldBox};
pub use buildings::{BuildingParams, load_buildings_or_placeholder};
pub use error::{WorldError, WorldResult};
pub use query::{HitFilter, ObstacleQuery, OpenSky, Ray, RayHit, SurfaceTag};
pub use vegetation::{VegetationParams, load_vegetation};
