//! Plain data row types written by output backends.

use sw_sim::{AgentFrame, TickSummary};

/// One agent at one snapshot frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentFrameRow {
    pub agent_id:         u32,
    pub frame:            u64,
    /// Frame seconds since the run started.
    pub elapsed_secs:     f64,
    pub x:                f32,
    pub y:                f32,
    pub z:                f32,
    pub yaw:              f32,
    pub mode:             &'static str,
    pub waypoint:         u32,
    pub route_len:        u32,
    pub shade_ahead:      f32,
    /// Nearest obstacle in the FOV fan; `None` when the fan is clear.
    pub fov_cap_distance: Option<f32>,
}

impl From<&AgentFrame> for AgentFrameRow {
    fn from(f: &AgentFrame) -> Self {
        Self {
            agent_id:         f.agent.0,
            frame:            f.tick.0,
            elapsed_secs:     f.elapsed_secs,
            x:                f.position.x,
            y:                f.position.y,
            z:                f.position.z,
            yaw:              f.yaw,
            mode:             f.mode.as_str(),
            waypoint:         u32::try_from(f.waypoint).unwrap_or(u32::MAX),
            route_len:        u32::try_from(f.route_len).unwrap_or(u32::MAX),
            shade_ahead:      f.shade_ahead,
            fov_cap_distance: f.fov_cap_distance,
        }
    }
}

/// Aggregate state after one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub frame:            u64,
    pub elapsed_secs:     f64,
    pub paused:           bool,
    pub sun_altitude_deg: f64,
    pub sun_azimuth_deg:  f64,
    pub shade_recomputed: bool,
    pub mean_shade:       f32,
    pub following:        u32,
    pub avoiding:         u32,
    pub blocked:          u32,
    pub arrived:          u32,
    pub idle:             u32,
    pub reroutes:         u32,
    pub reroute_failures: u32,
    pub wander_reroutes:  u32,
}

impl From<&TickSummary> for TickSummaryRow {
    fn from(s: &TickSummary) -> Self {
        let n = |v: usize| u32::try_from(v).unwrap_or(u32::MAX);
        Self {
            frame:            s.tick.0,
            elapsed_secs:     s.elapsed_secs,
            paused:           s.paused,
            sun_altitude_deg: s.sun.altitude_deg,
            sun_azimuth_deg:  s.sun.azimuth_deg,
            shade_recomputed: s.shade_recomputed,
            mean_shade:       s.mean_shade,
            following:        n(s.following),
            avoiding:         n(s.avoiding),
            blocked:          n(s.blocked),
            arrived:          n(s.arrived),
            idle:             n(s.idle),
            reroutes:         n(s.reroutes),
            reroute_failures: n(s.reroute_failures),
            wander_reroutes:  n(s.wander_reroutes),
        }
    }
}
