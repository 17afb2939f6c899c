//! Tree canopy as shade casters.
//!
//! Each vegetation polygon becomes one [`SurfaceTag::Canopy`] box: the
//! footprint's bounding box grown by `canopy_margin`, spanning from
//! `trunk_height` up to the crown top.  Canopy shades the ground beneath it
//! for [`HitFilter::Any`](crate::HitFilter::Any) queries and is invisible to
//! steering and FOV.

use std::path::Path;

use glam::Vec3;
use tracing::{info, warn};

use sw_core::geojson::number_prop;
use sw_core::{FeatureCollection, SceneFrame};

use crate::boxes::{BoxWorld, WorldBox};
use crate::buildings::footprint_bounds;
use crate::error::WorldResult;
use crate::query::SurfaceTag;

const HEIGHT_KEYS: [&str; 2] = ["height", "canopy_height"];

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VegetationParams {
    /// Crown top in metres when a feature has no `height`.
    pub default_height: f32,
    /// Crown underside in metres.
    pub trunk_height:   f32,
    /// Metres added around each footprint.
    pub canopy_margin:  f32,
}

impl Default for VegetationParams {
    fn default() -> Self {
        Self { default_height: 6.0, trunk_height: 2.5, canopy_margin: 0.8 }
    }
}

impl BoxWorld {
    /// Add a canopy box for every vegetation polygon.  Returns how many were
    /// added.
    pub fn add_vegetation(&mut self, trees: &FeatureCollection, frame: &SceneFrame, params: &VegetationParams) -> usize {
        let scale = frame.scale();
        let margin = Vec3::new(params.canopy_margin, 0.0, params.canopy_margin) * scale;
        let mut added = 0;
        for poly in &trees.polygons {
            let Some((min, max)) = footprint_bounds(&poly.ring, frame) else {
                continue;
            };
            let top = number_prop(&poly.properties, &HEIGHT_KEYS)
                .map(|h| h as f32)
                .filter(|h| *h > params.trunk_height)
                .unwrap_or(params.default_height);
            let bottom = params.trunk_height.min(top);
            self.push(WorldBox::new(
                Vec3::new(min.x, bottom * scale, min.z) - margin,
                Vec3::new(max.x, top * scale, max.z) + margin,
                SurfaceTag::Canopy,
            ));
            added += 1;
        }
        added
    }

    /// Number of canopy boxes.
    pub fn canopy_count(&self) -> usize {
        self.boxes().iter().filter(|b| b.tag == SurfaceTag::Canopy).count()
    }
}

/// Read vegetation polygons from `path` into `world`.
///
/// Vegetation is optional: a missing layer adds nothing, and a layer that
/// fails to load is logged and skipped.
pub fn load_vegetation(
    world: &mut BoxWorld,
    path: Option<&Path>,
    frame: Option<&SceneFrame>,
    params: &VegetationParams,
) -> usize {
    let (Some(path), Some(frame)) = (path, frame) else {
        return 0;
    };
    let read: WorldResult<FeatureCollection> = FeatureCollection::read(path).map_err(Into::into);
    match read {
        Ok(fc) => {
            let added = world.add_vegetation(&fc, frame, params);
            info!(canopies = added, skipped = fc.polygons.len() - added, "vegetation loaded");
            added
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "vegetation load failed, continuing without canopy");
            0
        }
    }
}
