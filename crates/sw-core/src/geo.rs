//! Geographic coordinates and the local scene frame.
//!
//! Road and building data arrive as longitude/latitude (EPSG:4326) or as
//! Web-Mercator metres (EPSG:3857).  Everything downstream works in a local
//! tangent plane centred on the data's centroid:
//!
//! ```text
//! x =  (lon - lon0) * 111320 * cos(lat0)     east
//! y =  0                                     up
//! z = -(lat - lat0) * 111320                 south (so -z is north)
//! ```
//!
//! No geodesic correction is applied.  Source extents are a few kilometres,
//! where the equirectangular error stays well below a metre.
//!
//! A [`FitTransform`] then rescales the plane uniformly so the whole city
//! spans a fixed number of scene units, and [`SceneFrame`] bundles both steps
//! so every layer (roads, buildings, previews) lands in the same frame.

use glam::Vec3;

/// Metres per degree of latitude (spherical approximation).
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// WGS-84 semi-major axis, used by the Web-Mercator inverse.
const MERCATOR_RADIUS: f64 = 6_378_137.0;

// ── GeoPoint ─────────────────────────────────────────────────────────────────

/// A geographic coordinate in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Interpret a raw GeoJSON coordinate pair.
    ///
    /// Pairs with `|x| <= 180` and `|y| <= 90` are taken as lon/lat; anything
    /// larger is assumed to be Web-Mercator metres and inverted.  Non-finite
    /// input returns `None`.
    pub fn from_raw(x: f64, y: f64) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if x.abs() <= 180.0 && y.abs() <= 90.0 {
            return Some(Self::new(x, y));
        }
        Some(Self::from_web_mercator(x, y))
    }

    /// Inverse spherical Web-Mercator projection.
    pub fn from_web_mercator(x: f64, y: f64) -> Self {
        let lon = (x / MERCATOR_RADIUS).to_degrees();
        let lat = (2.0 * (y / MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        Self::new(lon, lat)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

// ── LocalProjector ────────────────────────────────────────────────────────────

/// Maps lon/lat to the local tangent plane around a fixed origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalProjector {
    pub origin: GeoPoint,
    meters_per_deg_lon: f64,
}

impl LocalProjector {
    pub fn new(origin: GeoPoint) -> Self {
        Self {
            origin,
            meters_per_deg_lon: METERS_PER_DEG_LAT * origin.lat.to_radians().cos(),
        }
    }

    /// Centre a projector on the centroid of all finite points.
    ///
    /// Returns `None` if no finite point was supplied.
    pub fn from_points<I: IntoIterator<Item = GeoPoint>>(points: I) -> Option<Self> {
        let (mut sum_lon, mut sum_lat, mut n) = (0.0_f64, 0.0_f64, 0_usize);
        for p in points.into_iter().filter(|p| p.is_finite()) {
            sum_lon += p.lon;
            sum_lat += p.lat;
            n += 1;
        }
        (n > 0).then(|| Self::new(GeoPoint::new(sum_lon / n as f64, sum_lat / n as f64)))
    }

    #[inline]
    pub fn project(&self, p: GeoPoint) -> Vec3 {
        let x = (p.lon - self.origin.lon) * self.meters_per_deg_lon;
        let z = -(p.lat - self.origin.lat) * METERS_PER_DEG_LAT;
        Vec3::new(x as f32, 0.0, z as f32)
    }

    /// Exact inverse of [`project`](Self::project) (ignores `y`).
    #[inline]
    pub fn unproject(&self, v: Vec3) -> GeoPoint {
        // A projector at a pole has no longitude scale; leave lon at the origin.
        let lon = if self.meters_per_deg_lon.abs() > f64::EPSILON {
            self.origin.lon + f64::from(v.x) / self.meters_per_deg_lon
        } else {
            self.origin.lon
        };
        let lat = self.origin.lat - f64::from(v.z) / METERS_PER_DEG_LAT;
        GeoPoint::new(lon, lat)
    }
}

// ── FitTransform ──────────────────────────────────────────────────────────────

/// Uniform rescale + recentre so a point set spans `target_span` units.
///
/// The fit is computed on the XZ bounding box; `y` is scaled by the same
/// factor so building heights stay proportional.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitTransform {
    pub center: Vec3,
    pub scale: f32,
}

impl FitTransform {
    pub const IDENTITY: FitTransform = FitTransform { center: Vec3::ZERO, scale: 1.0 };

    pub fn fit(points: &[Vec3], target_span: f32) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points.iter().filter(|p| p.is_finite()) {
            min = min.min(*p);
            max = max.max(*p);
        }
        if !min.is_finite() || !max.is_finite() {
            return Self::IDENTITY;
        }
        let center = Vec3::new((min.x + max.x) * 0.5, 0.0, (min.z + max.z) * 0.5);
        let span = (max.x - min.x).max(max.z - min.z);
        let scale = if span > f32::EPSILON && target_span > 0.0 {
            target_span / span
        } else {
            1.0
        };
        Self { center, scale }
    }

    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        (v - self.center) * self.scale
    }

    #[inline]
    pub fn invert(&self, v: Vec3) -> Vec3 {
        v / self.scale + self.center
    }
}

impl Default for FitTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ── SceneFrame ────────────────────────────────────────────────────────────────

/// Projector + fit: the single frame every loaded layer is expressed in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneFrame {
    pub projector: LocalProjector,
    pub fit: FitTransform,
}

impl SceneFrame {
    /// Build a frame from raw geographic points.
    ///
    /// `target_span = None` keeps metres (identity fit).
    pub fn from_points(points: &[GeoPoint], target_span: Option<f32>) -> Option<Self> {
        let projector = LocalProjector::from_points(points.iter().copied())?;
        let fit = match target_span {
            Some(span) => {
                let local: Vec<Vec3> = points
                    .iter()
                    .filter(|p| p.is_finite())
                    .map(|p| projector.project(*p))
                    .collect();
                FitTransform::fit(&local, span)
            }
            None => FitTransform::IDENTITY,
        };
        Some(Self { projector, fit })
    }

    #[inline]
    pub fn to_local(&self, p: GeoPoint) -> Vec3 {
        self.fit.apply(self.projector.project(p))
    }

    #[inline]
    pub fn to_geo(&self, v: Vec3) -> GeoPoint {
        self.projector.unproject(self.fit.invert(v))
    }

    /// Scene units per metre.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.fit.scale
    }
}
