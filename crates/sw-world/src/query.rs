//! The obstacle query seam.

use glam::Vec3;

/// A half-line with a unit-length direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir:    Vec3,
}

impl Ray {
    /// Build a ray; `dir` is normalised.  Returns `None` for a zero or
    /// non-finite direction.
    pub fn new(origin: Vec3, dir: Vec3) -> Option<Self> {
        let dir = dir.try_normalize()?;
        origin.is_finite().then_some(Self { origin, dir })
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// First intersection along a ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin, in scene units.
    pub distance: f32,
    pub point:    Vec3,
    /// Index of the hit object inside its world.
    pub object:   usize,
}

/// Which objects a query may hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HitFilter {
    /// Every object, passable ones included.  Used by shade sampling.
    Any,
    /// Obstacle-tagged objects only.  Used by steering and FOV.
    #[default]
    ObstaclesOnly,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SurfaceTag {
    Obstacle,
    Passable,
    /// Tree crowns: cast shade but never stop a walker or a view ray.
    Canopy,
}

impl HitFilter {
    #[inline]
    pub fn accepts(self, tag: SurfaceTag) -> bool {
        match self {
            HitFilter::Any => true,
            HitFilter::ObstaclesOnly => tag == SurfaceTag::Obstacle,
        }
    }
}

/// Ray intersection against the world.
///
/// `None` means nothing was hit within `max_distance`: no obstacle, full
/// visibility, sunlit.  It is never an error.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; the per-agent update may run on
/// Rayon workers that share one world.
pub trait ObstacleQuery: Send + Sync {
    fn cast(&self, ray: &Ray, max_distance: f32, filter: HitFilter) -> Option<RayHit>;

    /// Convenience: `true` if anything blocks the ray within `max_distance`.
    fn occluded(&self, ray: &Ray, max_distance: f32, filter: HitFilter) -> bool {
        self.cast(ray, max_distance, filter).is_some()
    }
}

/// A world with nothing in it.
#[derive(Copy, Clone, Debug, Default)]
pub struct OpenSky;

impl ObstacleQuery for OpenSky {
    fn cast(&self, _ray: &Ray, _max_distance: f32, _filter: HitFilter) -> Option<RayHit> {
        None
    }
}
