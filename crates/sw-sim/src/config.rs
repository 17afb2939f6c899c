//! User-adjustable simulation parameters.

use sw_fov::FovParams;
use sw_mobility::SteeringParams;
use sw_spatial::GraphParams;

use crate::{SimError, SimResult};

/// Every knob of a run.
///
/// Deserializes with `serde(default)`, so a JSON config only needs the fields
/// it changes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Agents spawned by [`SimBuilder::build`][crate::SimBuilder::build] when
    /// no explicit agents are supplied.
    pub agent_count:                   usize,
    /// Master seed for spawn points, goals, and wander targets.
    pub seed:                          u64,
    /// Walking speed in scene units per second.
    pub base_speed:                    f32,
    pub speed_multiplier:              f32,
    /// Weight in `[0, 1]` given to shaded edges by the router.
    pub shade_bias:                    f32,
    pub latitude:                      f64,
    pub longitude:                     f64,
    /// ISO-8601 sun time.  Unparseable input gives the fallback sun.
    pub start_time:                    String,
    /// Simulated seconds per frame second; `0.0` holds the sun still.
    pub time_scale:                    f64,
    pub auto_reroute:                  bool,
    pub auto_reroute_period_secs:      f32,
    /// Edges are rescored only when the sun has moved more than this.
    pub shade_recompute_threshold_deg: f32,
    /// Length of the heading strip sampled for `shade_ahead`.
    pub heading_shade_distance:        f32,
    /// `on_snapshot` fires every this many ticks; `0` disables it.
    pub output_interval_ticks:         u64,
    pub graph:                         GraphParams,
    pub steering:                      SteeringParams,
    pub fov:                           FovParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agent_count:                   12,
            seed:                          42,
            base_speed:                    1.4,
            speed_multiplier:              1.0,
            shade_bias:                    0.5,
            latitude:                      34.3142,
            longitude:                     47.0650,
            start_time:                    "2024-06-21T12:00:00Z".to_owned(),
            time_scale:                    0.0,
            auto_reroute:                  true,
            auto_reroute_period_secs:      7.0,
            shade_recompute_threshold_deg: 0.5,
            heading_shade_distance:        6.0,
            output_interval_ticks:         30,
            graph:                         GraphParams::default(),
            steering:                      SteeringParams::default(),
            fov:                           FovParams::default(),
        }
    }
}

impl SimConfig {
    /// Reject values the frame loop cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        let bad = |msg: String| Err(SimError::Config(msg));
        if !(self.base_speed.is_finite() && self.base_speed >= 0.0) {
            return bad(format!("base_speed must be a non-negative number, got {}", self.base_speed));
        }
        if !(self.speed_multiplier.is_finite() && self.speed_multiplier >= 0.0) {
            return bad(format!("speed_multiplier must be a non-negative number, got {}", self.speed_multiplier));
        }
        if !(0.0..=1.0).contains(&self.shade_bias) {
            return bad(format!("shade_bias must lie in [0, 1], got {}", self.shade_bias));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return bad(format!("location ({}, {}) is not a valid lat/lon", self.latitude, self.longitude));
        }
        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return bad(format!("time_scale must be a non-negative number, got {}", self.time_scale));
        }
        if !(self.auto_reroute_period_secs > 0.0) {
            return bad(format!("auto_reroute_period_secs must be positive, got {}", self.auto_reroute_period_secs));
        }
        if !(self.shade_recompute_threshold_deg >= 0.0) {
            return bad(format!(
                "shade_recompute_threshold_deg must be non-negative, got {}",
                self.shade_recompute_threshold_deg
            ));
        }
        if self.fov.segments == 0 {
            return bad("fov.segments must be at least 1".to_owned());
        }
        if !(self.steering.max_dt > 0.0) {
            return bad(format!("steering.max_dt must be positive, got {}", self.steering.max_dt));
        }
        Ok(())
    }
}
