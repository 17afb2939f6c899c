//! Route preview export as GeoJSON.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde_json::{Value, json};
use tracing::info;

use sw_core::SceneFrame;

use crate::OutputResult;

/// A `LineString` Feature for `route`, in `[lon, lat]` order.
///
/// Without a frame (the synthetic fallback network has no geographic
/// anchor) the coordinates are scene `[x, -z]`, matching the planar
/// east/north layout.
pub fn route_to_geojson(route: &[Vec3], frame: Option<&SceneFrame>) -> Value {
    let coordinates: Vec<[f64; 2]> = route
        .iter()
        .map(|&p| match frame {
            Some(frame) => {
                let g = frame.to_geo(p);
                [g.lon, g.lat]
            }
            None => [f64::from(p.x), f64::from(-p.z)],
        })
        .collect();
    let length: f32 = route.windows(2).map(|w| w[0].distance(w[1])).sum();

    json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "properties": {
            "kind": "route_preview",
            "waypoints": route.len(),
            "scene_length": length,
            "geographic": frame.is_some(),
        }
    })
}

/// Write [`route_to_geojson`] wrapped in a `FeatureCollection` to `path`.
pub fn write_route_geojson(path: &Path, route: &[Vec3], frame: Option<&SceneFrame>) -> OutputResult<()> {
    let collection = json!({
        "type": "FeatureCollection",
        "features": [route_to_geojson(route, frame)],
    });
    fs::write(path, serde_json::to_string_pretty(&collection)?)?;
    info!(path = %path.display(), waypoints = route.len(), "route preview written");
    Ok(())
}
