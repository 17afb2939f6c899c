//! Simulation time model.
//!
//! # Design
//!
//! Two clocks run side by side:
//!
//! - the **frame clock**: a `Tick` counter plus accumulated real seconds,
//!   advanced once per rendered frame;
//! - the **sun clock**: a Unix timestamp (seconds, `f64`) that feeds the
//!   solar estimator.
//!
//!   sun_time = start_unix_secs + Σ(frame_dt * time_scale)
//!
//! A `time_scale` of `0.0` keeps the timestamp static, which is the normal
//! case: the sun only moves while the user scrubs the time input.  The start
//! timestamp is optional because it comes from user input; `None` makes the
//! solar estimator return its fixed fallback position.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// A monotonically increasing frame counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` frames after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse a user-supplied ISO-8601 timestamp into Unix seconds.
///
/// Accepts RFC 3339 (`2024-06-21T12:00:00+02:00`, `...Z`), the zone-less form
/// an HTML `datetime-local` input produces (`2024-06-21T12:00`, treated as
/// UTC), and a bare date (midnight UTC).  Anything else yields `None`.
pub fn parse_timestamp(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(unix_secs(&dt.with_timezone(&Utc)));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(unix_secs(&Utc.from_utc_datetime(&naive)));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| unix_secs(&Utc.from_utc_datetime(&naive)))
}

fn unix_secs(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Frame counter plus the timestamp that drives the sun.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Unix timestamp of the user-selected start time, `None` if the input
    /// could not be parsed.
    pub start_unix_secs: Option<f64>,
    /// Simulated seconds per real second.  `0.0` freezes the sun.
    pub time_scale: f64,
    /// Simulated seconds elapsed since `start_unix_secs`.
    pub elapsed_sim_secs: f64,
    /// Real (frame) seconds elapsed since the clock was created.
    pub elapsed_real_secs: f64,
    /// The current frame, advanced by `SimClock::advance()` each tick.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_unix_secs: Option<f64>, time_scale: f64) -> Self {
        Self {
            start_unix_secs,
            time_scale: time_scale.max(0.0),
            elapsed_sim_secs: 0.0,
            elapsed_real_secs: 0.0,
            current_tick: Tick::ZERO,
        }
    }

    /// Create a clock from an ISO-8601 start time (see [`parse_timestamp`]).
    pub fn from_iso(start: &str, time_scale: f64) -> Self {
        Self::new(parse_timestamp(start), time_scale)
    }

    /// Advance by one frame of `dt` real seconds.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        let dt = f64::from(dt.max(0.0));
        self.current_tick = self.current_tick.offset(1);
        self.elapsed_real_secs += dt;
        self.elapsed_sim_secs += dt * self.time_scale;
    }

    /// `true` when the sun clock moves on its own.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.time_scale > 0.0
    }

    /// Current sun timestamp, `None` if the start time was invalid.
    #[inline]
    pub fn current_unix_secs(&self) -> Option<f64> {
        self.start_unix_secs.map(|s| s + self.elapsed_sim_secs)
    }

    /// Jump the sun clock to a new user-selected time.
    ///
    /// Returns `false` (and clears the timestamp) if `iso` does not parse.
    pub fn set_time(&mut self, iso: &str) -> bool {
        self.start_unix_secs = parse_timestamp(iso);
        self.elapsed_sim_secs = 0.0;
        self.start_unix_secs.is_some()
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self
            .current_unix_secs()
            .and_then(|s| DateTime::<Utc>::from_timestamp(s.floor() as i64, 0));
        match stamp {
            Some(dt) => write!(f, "{} ({})", self.current_tick, dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None     => write!(f, "{} (no timestamp)", self.current_tick),
        }
    }
}
