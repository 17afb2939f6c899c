//! Route (re)planning seam between steering and the road graph.

use glam::Vec3;

use sw_spatial::{RoadGraph, Router, find_path};

use crate::error::{MobilityError, MobilityResult};

/// Distance within which the graph path already counts as reaching an endpoint.
pub const ANCHOR_TOLERANCE: f32 = 0.3;

/// Anything that can produce a waypoint polyline between two points.
///
/// Steering only ever calls this; it has no idea a graph exists.
pub trait Replanner: Send + Sync {
    fn replan(&self, from: Vec3, to: Vec3) -> MobilityResult<Vec<Vec3>>;
}

/// Plans over a [`RoadGraph`] with a [`Router`] at a fixed shade bias.
pub struct GraphReplanner<'a, R: Router + ?Sized> {
    pub graph:      &'a RoadGraph,
    pub router:     &'a R,
    pub shade_bias: f32,
}

impl<'a, R: Router + ?Sized> GraphReplanner<'a, R> {
    pub fn new(graph: &'a RoadGraph, router: &'a R, shade_bias: f32) -> Self {
        Self { graph, router, shade_bias }
    }
}

impl<R: Router + ?Sized> Replanner for GraphReplanner<'_, R> {
    fn replan(&self, from: Vec3, to: Vec3) -> MobilityResult<Vec<Vec3>> {
        let route = find_path(self.router, self.graph, from, to, self.shade_bias)?;
        let points = route.anchored(from, to, ANCHOR_TOLERANCE);
        if points.is_empty() {
            return Err(MobilityError::EmptyRoute);
        }
        Ok(points)
    }
}
