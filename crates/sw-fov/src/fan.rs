//! Visibility fan geometry.
//!
//! ```text
//!              rim[0] ─ rim[1] ─ … ─ rim[segments]
//!                 \      |             /
//!                  \     |            /
//!                   ─── origin (0) ──
//! ```
//!
//! Vertex 0 is the eye.  Rim vertex `i` lies at angle
//! `yaw − half + 2·half·i/segments`, at the first obstacle hit or at the
//! full radius.  Triangles are `(0, i, i + 1)`.

use glam::Vec3;

use sw_spatial::ShadeSampler;
use sw_world::{HitFilter, ObstacleQuery, Ray};

/// The cap is sized from the cone radius, which diverges as the half-angle
/// approaches 90°.
const MAX_CAP_HALF_ANGLE_DEG: f32 = 89.0;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FovParams {
    pub half_angle_deg: f32,
    pub radius:         f32,
    /// Rays per fan; the rim has `segments + 1` vertices.
    pub segments:       u32,
    pub eye_height:     f32,
    /// Cap radius as a fraction of the cone radius at the hit depth.
    pub cap_ratio:      f32,
}

impl Default for FovParams {
    fn default() -> Self {
        Self { half_angle_deg: 35.0, radius: 12.0, segments: 32, eye_height: 1.6, cap_ratio: 0.35 }
    }
}

/// Marker disc at the nearest intrusion into the fan.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FovCap {
    pub center:   Vec3,
    pub radius:   f32,
    pub distance: f32,
}

#[derive(Clone, Debug, Default)]
pub struct FovFan {
    pub origin:    Vec3,
    pub vertices:  Vec<Vec3>,
    pub indices:   Vec<u32>,
    pub cap:       Option<FovCap>,
    /// Rays stopped by an obstacle on the last update.
    pub truncated: usize,
}

impl FovFan {
    pub fn new(segments: u32) -> Self {
        let mut fan = Self::default();
        fan.reserve(segments);
        fan
    }

    fn reserve(&mut self, segments: u32) {
        let segments = segments.max(1);
        self.vertices.reserve(segments as usize + 2);
        self.indices.clear();
        self.indices.extend((1..=segments).flat_map(|i| [0, i, i + 1]));
    }

    pub fn segments(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Rebuild for an agent at `position` facing `yaw`.
    ///
    /// `half_angle` is in radians.  Buffers are reused; they only grow if
    /// `segments` grows.
    pub fn update<W: ObstacleQuery + ?Sized>(
        &mut self,
        position: Vec3,
        yaw: f32,
        half_angle: f32,
        radius: f32,
        params: &FovParams,
        world: &W,
    ) {
        let segments = params.segments.max(1);
        if self.segments() != segments {
            self.reserve(segments);
        }
        let origin = Vec3::new(position.x, params.eye_height, position.z);
        self.origin = origin;
        self.vertices.clear();
        self.vertices.push(origin);
        self.truncated = 0;

        let radius = radius.max(0.0);
        let mut nearest: Option<f32> = None;
        for i in 0..=segments {
            let angle = yaw - half_angle + 2.0 * half_angle * i as f32 / segments as f32;
            let dir = Vec3::new(angle.sin(), 0.0, angle.cos());
            let hit = Ray::new(origin, dir).and_then(|ray| world.cast(&ray, radius, HitFilter::ObstaclesOnly));
            let reach = match hit {
                Some(h) => {
                    self.truncated += 1;
                    nearest = Some(nearest.map_or(h.distance, |n| n.min(h.distance)));
                    h.distance
                }
                None => radius,
            };
            self.vertices.push(origin + dir * reach);
        }

        self.cap = nearest.map(|distance| {
            let half = half_angle.abs().min(MAX_CAP_HALF_ANGLE_DEG.to_radians());
            let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
            FovCap {
                center: origin + forward * distance,
                radius: distance * half.tan() * params.cap_ratio,
                distance,
            }
        });
    }
}

/// Fraction of the ground ahead of `position` along `yaw` that is shaded.
///
/// Samples a `distance`-long segment with the same sampler used for road
/// edges.
pub fn shade_along_heading<W: ObstacleQuery + ?Sized>(
    position: Vec3,
    yaw: f32,
    distance: f32,
    sampler: &ShadeSampler,
    world: &W,
    light_dir: Vec3,
) -> f32 {
    let start = Vec3::new(position.x, 0.0, position.z);
    let end = start + Vec3::new(yaw.sin(), 0.0, yaw.cos()) * distance.max(0.0);
    sampler.score(start, end, world, light_dir)
}
