//! Solar position from latitude, longitude, and a UTC timestamp.
//!
//! # Scene convention
//!
//! Azimuth is measured clockwise from north (0° = N, 90° = E).  The direction
//! vector points from the ground toward the sun in scene axes (x east, y up,
//! −z north):
//!
//! ```text
//! dir = ( cos(alt)·sin(az),  sin(alt),  −cos(alt)·cos(az) )
//! ```

use glam::Vec3;
use tracing::debug;

use sw_core::parse_timestamp;

/// Azimuth used when the timestamp is missing or the result is not finite.
pub const FALLBACK_AZIMUTH_DEG: f64 = 160.0;
/// Altitude used when the timestamp is missing or the result is not finite.
pub const FALLBACK_ALTITUDE_DEG: f64 = 45.0;

const SECS_PER_DAY: f64 = 86_400.0;
/// Julian date of the Unix epoch.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian date of J2000.0.
const JD_J2000: f64 = 2_451_545.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;

// ── SunPosition ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SunPosition {
    /// Degrees above the horizon; negative at night.
    pub altitude_deg: f64,
    /// Degrees clockwise from north, in `[0, 360)`.
    pub azimuth_deg: f64,
    /// Unit vector toward the sun in scene coordinates.
    pub direction: Vec3,
    /// `true` if this is the fixed fallback rather than a computed position.
    pub fallback: bool,
}

impl SunPosition {
    /// The fixed position used for invalid input (azimuth 160°, altitude 45°).
    pub fn fallback() -> Self {
        Self::from_angles(FALLBACK_ALTITUDE_DEG, FALLBACK_AZIMUTH_DEG, true)
    }

    /// Build a position from altitude/azimuth in degrees.
    pub fn from_angles(altitude_deg: f64, azimuth_deg: f64, fallback: bool) -> Self {
        let (alt, az) = (altitude_deg.to_radians(), azimuth_deg.to_radians());
        let direction = Vec3::new(
            (alt.cos() * az.sin()) as f32,
            alt.sin() as f32,
            (-alt.cos() * az.cos()) as f32,
        )
        .normalize_or_zero();
        Self { altitude_deg, azimuth_deg, direction, fallback }
    }

    /// Sun position at `unix_secs` (UTC) seen from `lat`/`lon` degrees.
    ///
    /// `None` or any non-finite intermediate returns [`fallback`](Self::fallback).
    pub fn compute(lat: f64, lon: f64, unix_secs: Option<f64>) -> Self {
        let Some(secs) = unix_secs.filter(|s| s.is_finite()) else {
            debug!("no usable timestamp, using fallback sun");
            return Self::fallback();
        };
        if !lat.is_finite() || !lon.is_finite() {
            debug!(lat, lon, "non-finite location, using fallback sun");
            return Self::fallback();
        }
        let (altitude_deg, azimuth_deg) = noaa_alt_az(lat, lon, secs);
        if !altitude_deg.is_finite() || !azimuth_deg.is_finite() {
            debug!(secs, "non-finite solar angles, using fallback sun");
            return Self::fallback();
        }
        Self::from_angles(altitude_deg, azimuth_deg, false)
    }

    /// Parse an ISO-8601 timestamp and compute the position.
    pub fn from_iso(lat: f64, lon: f64, iso: &str) -> Self {
        Self::compute(lat, lon, parse_timestamp(iso))
    }

    /// `true` when the sun is above the horizon.
    #[inline]
    pub fn is_up(&self) -> bool {
        self.altitude_deg > 0.0
    }

    /// Angle in degrees between this light direction and `other`'s.
    pub fn angle_to(&self, other: &SunPosition) -> f32 {
        self.direction.dot(other.direction).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

impl Default for SunPosition {
    fn default() -> Self {
        Self::fallback()
    }
}

// ── NOAA low-precision algorithm ──────────────────────────────────────────────

fn noaa_alt_az(lat: f64, lon: f64, unix_secs: f64) -> (f64, f64) {
    let jd = unix_secs / SECS_PER_DAY + JD_UNIX_EPOCH;
    let t = (jd - JD_J2000) / DAYS_PER_CENTURY;

    // Geometric mean longitude and mean anomaly.
    let l0 = (280.466_46 + t * (36_000.769_83 + t * 0.000_303_2)).rem_euclid(360.0);
    let m = 357.529_11 + t * (35_999.050_29 - 0.000_153_7 * t);
    let ecc = 0.016_708_634 - t * (0.000_042_037 + 0.000_000_126_7 * t);
    let m_rad = m.to_radians();

    // Equation of centre.
    let c = m_rad.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
        + (2.0 * m_rad).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m_rad).sin() * 0.000_289;
    let true_long = l0 + c;

    // Apparent longitude, corrected for nutation and aberration.
    let omega = (125.04 - 1_934.136 * t).to_radians();
    let lambda = (true_long - 0.005_69 - 0.004_78 * omega.sin()).to_radians();

    // Obliquity of the ecliptic.
    let eps0 = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813))) / 60.0) / 60.0;
    let eps = (eps0 + 0.002_56 * omega.cos()).to_radians();

    let decl = (eps.sin() * lambda.sin()).asin();

    // Equation of time, minutes.
    let y = (eps / 2.0).tan().powi(2);
    let l0_rad = l0.to_radians();
    let eot = 4.0
        * (y * (2.0 * l0_rad).sin() - 2.0 * ecc * m_rad.sin()
            + 4.0 * ecc * y * m_rad.sin() * (2.0 * l0_rad).cos()
            - 0.5 * y * y * (4.0 * l0_rad).sin()
            - 1.25 * ecc * ecc * (2.0 * m_rad).sin())
        .to_degrees();

    // True solar time and hour angle.
    let utc_minutes = unix_secs.rem_euclid(SECS_PER_DAY) / 60.0;
    let true_solar_min = (utc_minutes + eot + 4.0 * lon).rem_euclid(1_440.0);
    let hour_angle = (true_solar_min / 4.0 - 180.0).to_radians();

    let lat_rad = lat.to_radians();
    let cos_zenith = (lat_rad.sin() * decl.sin() + lat_rad.cos() * decl.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0);
    let altitude = 90.0 - cos_zenith.acos().to_degrees();

    let azimuth = (hour_angle.sin())
        .atan2(hour_angle.cos() * lat_rad.sin() - decl.tan() * lat_rad.cos())
        .to_degrees()
        + 180.0;

    (altitude, azimuth.rem_euclid(360.0))
}
