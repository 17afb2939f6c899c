//! Building footprints extruded into obstacle boxes.
//!
//! Each polygon's outer ring is projected into the scene frame and replaced
//! by its axis-aligned bounding box, extruded from the ground to the
//! building height.  Heights come from the feature properties:
//!
//! 1. `height` / `building:height` (metres), else
//! 2. `floors` / `building:levels` / `levels` × `floor_height`, else
//! 3. `default_height`.
//!
//! Heights are in metres and are multiplied by the frame's fit scale so they
//! stay proportional to the footprints.

use std::path::Path;

use glam::Vec3;
use tracing::{info, warn};

use sw_core::geojson::number_prop;
use sw_core::{FeatureCollection, GeoPoint, SceneFrame};

use crate::boxes::BoxWorld;
use crate::error::{WorldError, WorldResult};

const HEIGHT_KEYS: [&str; 2] = ["height", "building:height"];
const FLOOR_KEYS: [&str; 3] = ["floors", "building:levels", "levels"];

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildingParams {
    /// Metres, used when a feature carries no height information.
    pub default_height: f32,
    /// Metres per storey.
    pub floor_height:   f32,
    /// Half-extent of the passable ground slab, in scene units.
    pub ground_extent:  f32,
}

impl Default for BuildingParams {
    fn default() -> Self {
        Self { default_height: 10.0, floor_height: 3.0, ground_extent: 200.0 }
    }
}

impl BuildingParams {
    /// Height in metres for one feature's properties.
    pub fn height_of(&self, props: &sw_core::Properties) -> f32 {
        if let Some(h) = number_prop(props, &HEIGHT_KEYS).filter(|h| *h > 0.0) {
            return h as f32;
        }
        if let Some(n) = number_prop(props, &FLOOR_KEYS).filter(|n| *n > 0.0) {
            return n as f32 * self.floor_height;
        }
        self.default_height
    }
}

impl BoxWorld {
    /// Extrude every polygon in `buildings` into an obstacle box.
    ///
    /// Footprints with fewer than three finite vertices are skipped.  Fails
    /// with [`WorldError::NoBuildings`] if nothing could be extruded.
    pub fn from_buildings(
        buildings: &FeatureCollection,
        frame: &SceneFrame,
        params: &BuildingParams,
    ) -> WorldResult<Self> {
        let mut world = BoxWorld::new();
        let mut skipped = buildings.skipped;
        for poly in &buildings.polygons {
            let Some((min, max)) = footprint_bounds(&poly.ring, frame) else {
                skipped += 1;
                continue;
            };
            let height = params.height_of(&poly.properties) * frame.scale();
            world.add_obstacle(Vec3::new(min.x, 0.0, min.z), Vec3::new(max.x, height, max.z));
        }
        if skipped > 0 {
            warn!(skipped, "building features skipped");
        }
        if world.is_empty() {
            return Err(WorldError::NoBuildings { skipped });
        }
        info!(buildings = world.len(), "extruded building footprints");
        Ok(world.with_ground(params.ground_extent))
    }
}

/// Scene-space bounding box of a projected ring.  `None` when fewer than
/// three vertices survive projection.
pub(crate) fn footprint_bounds(ring: &[GeoPoint], frame: &SceneFrame) -> Option<(Vec3, Vec3)> {
    let ring: Vec<Vec3> = ring
        .iter()
        .filter(|p| p.is_finite())
        .map(|p| frame.to_local(*p))
        .filter(|v| v.is_finite())
        .collect();
    if ring.len() < 3 {
        return None;
    }
    Some(ring.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(lo, hi), v| (lo.min(*v), hi.max(*v)),
    ))
}

/// Load building footprints from `path`, or fall back to the placeholder
/// city mass if the file is missing, malformed, or yields no building.
pub fn load_buildings_or_placeholder(
    path: Option<&Path>,
    frame: Option<&SceneFrame>,
    params: &BuildingParams,
) -> BoxWorld {
    let (Some(path), Some(frame)) = (path, frame) else {
        info!("no building layer, using placeholder city mass");
        return BoxWorld::placeholder_city_mass();
    };
    let result = FeatureCollection::read(path)
        .map_err(WorldError::from)
        .and_then(|fc| BoxWorld::from_buildings(&fc, frame, params));
    match result {
        Ok(world) => world,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "building load failed, using placeholder city mass");
            BoxWorld::placeholder_city_mass()
        }
    }
}
