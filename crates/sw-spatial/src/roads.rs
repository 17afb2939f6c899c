//! Road input layer.
//!
//! Every `LineString` and each `MultiLineString` part becomes one
//! [`RoadCurve`] in the shared scene frame.  A `user` property equal to `0`
//! marks a road closed to pedestrians: it is kept in [`RoadLayer::blocked`]
//! for display but never enters the routing graph.

use std::path::Path;

use glam::Vec3;
use tracing::{info, warn};

use sw_core::geojson::number_prop;
use sw_core::{FeatureCollection, GeoPoint, SceneFrame};

use crate::curve::RoadCurve;
use crate::error::{SpatialError, SpatialResult};

#[derive(Clone, Debug, Default)]
pub struct RoadLayer {
    pub walkable: Vec<RoadCurve>,
    pub blocked:  Vec<RoadCurve>,
    /// Frame the curves were projected with; `None` for the built-in fallback.
    pub frame:    Option<SceneFrame>,
}

impl RoadLayer {
    /// Project a parsed road collection.
    ///
    /// `fit_span` rescales the layer so its largest side spans that many
    /// scene units; `None` keeps metres.
    pub fn from_features(fc: &FeatureCollection, fit_span: Option<f32>) -> SpatialResult<Self> {
        let points: Vec<GeoPoint> = fc.all_points().collect();
        let frame = SceneFrame::from_points(&points, fit_span).ok_or(SpatialError::NoRoads)?;
        let mut layer = RoadLayer { frame: Some(frame), ..Default::default() };
        for line in &fc.lines {
            let curve = RoadCurve::new(line.coords.iter().map(|p| frame.to_local(*p)));
            if number_prop(&line.properties, &["user"]) == Some(0.0) {
                layer.blocked.push(curve);
            } else {
                layer.walkable.push(curve);
            }
        }
        Ok(layer)
    }

    /// The built-in road used when real data is unusable: one fixed polyline
    /// in local scene space.
    pub fn fallback() -> Self {
        let curve = RoadCurve::new([
            Vec3::new(-30.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 20.0),
            Vec3::new(30.0, 0.0, 20.0),
        ]);
        RoadLayer { walkable: vec![curve], blocked: Vec::new(), frame: None }
    }

    /// `true` if at least one walkable curve can produce an edge.
    pub fn has_walkable(&self) -> bool {
        self.walkable.iter().any(|c| c.len() >= 2 && c.length() > 0.0)
    }
}

/// Load a road layer from `path`, falling back to [`RoadLayer::fallback`] on
/// I/O or parse errors, or when the file has no walkable road.
pub fn load_roads_or_fallback(path: Option<&Path>, fit_span: Option<f32>) -> RoadLayer {
    let Some(path) = path else {
        info!("no road layer given, using built-in fallback road");
        return RoadLayer::fallback();
    };
    let loaded = FeatureCollection::read(path)
        .map_err(SpatialError::from)
        .and_then(|fc| RoadLayer::from_features(&fc, fit_span));
    match loaded {
        Ok(layer) if layer.has_walkable() => {
            info!(
                path = %path.display(),
                walkable = layer.walkable.len(),
                blocked = layer.blocked.len(),
                "road layer loaded"
            );
            layer
        }
        Ok(_) => {
            warn!(path = %path.display(), "road layer has no walkable road, using built-in fallback road");
            RoadLayer::fallback()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "road load failed, using built-in fallback road");
            RoadLayer::fallback()
        }
    }
}
