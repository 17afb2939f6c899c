//! Axis-aligned box world.
//!
//! Buildings, the placeholder city mass and the ground slab are all boxes.
//! A linear scan with the slab test is fast enough at the observed scale
//! (a few hundred boxes, a few thousand rays per frame).

use glam::Vec3;

use crate::query::{HitFilter, ObstacleQuery, Ray, RayHit, SurfaceTag};

/// Thickness of the passable ground slab added by [`BoxWorld::with_ground`].
const GROUND_THICKNESS: f32 = 0.1;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldBox {
    pub min: Vec3,
    pub max: Vec3,
    pub tag: SurfaceTag,
}

impl WorldBox {
    /// Box spanning two corners in any order.
    pub fn new(a: Vec3, b: Vec3, tag: SurfaceTag) -> Self {
        Self { min: a.min(b), max: a.max(b), tag }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test.  Returns the entry distance, `0.0` if the origin is inside.
    pub fn intersect(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let o = ray.origin[axis];
            let d = ray.dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t1, t2) = ((lo - o) * inv, (hi - o) * inv);
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
            if t_near > t_far {
                return None;
            }
        }
        if t_far < 0.0 {
            return None;
        }
        let t = t_near.max(0.0);
        (t <= max_distance).then_some(t)
    }
}

/// A set of tagged boxes.
#[derive(Clone, Debug, Default)]
pub struct BoxWorld {
    boxes: Vec<WorldBox>,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, b: WorldBox) -> usize {
        self.boxes.push(b);
        self.boxes.len() - 1
    }

    pub fn add_obstacle(&mut self, a: Vec3, b: Vec3) -> usize {
        self.push(WorldBox::new(a, b, SurfaceTag::Obstacle))
    }

    /// Add a thin passable ground slab whose top face is `y = 0`.
    pub fn with_ground(mut self, half_extent: f32) -> Self {
        let h = half_extent.abs();
        self.push(WorldBox::new(
            Vec3::new(-h, -GROUND_THICKNESS, -h),
            Vec3::new(h, 0.0, h),
            SurfaceTag::Passable,
        ));
        self
    }

    /// The primitive stand-in used when no building could be loaded: one
    /// block beside the fallback road, so agents still have something to
    /// avoid and streets still get shade.
    pub fn placeholder_city_mass() -> Self {
        let mut world = Self::new();
        world.add_obstacle(Vec3::new(5.0, 0.0, -5.0), Vec3::new(15.0, 12.0, 10.0));
        world.with_ground(100.0)
    }

    pub fn boxes(&self) -> &[WorldBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Number of obstacle-tagged boxes.
    pub fn obstacle_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.tag == SurfaceTag::Obstacle).count()
    }
}

impl ObstacleQuery for BoxWorld {
    fn cast(&self, ray: &Ray, max_distance: f32, filter: HitFilter) -> Option<RayHit> {
        let mut best: Option<(f32, usize)> = None;
        for (i, b) in self.boxes.iter().enumerate() {
            if !filter.accepts(b.tag) {
                continue;
            }
            let limit = best.map_or(max_distance, |(d, _)| d);
            if let Some(t) = b.intersect(ray, limit) {
                if best.is_none_or(|(d, _)| t < d) {
                    best = Some((t, i));
                }
            }
        }
        best.map(|(distance, object)| RayHit { distance, point: ray.at(distance), object })
    }
}
