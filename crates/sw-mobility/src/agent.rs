//! Per-agent state.

use glam::Vec3;
use tracing::debug;

use sw_core::AgentId;

use crate::replan::Replanner;
use crate::steering::{RerouteOutcome, SteeringParams};

/// Stuck detection and reroute throttling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AvoidanceState {
    /// Seconds spent avoiding without moving `progress_epsilon` from
    /// `last_significant_pos`.
    pub stuck_secs:           f32,
    /// Seconds until another steering reroute may be attempted.
    pub reroute_cooldown:     f32,
    pub last_significant_pos: Vec3,
}

impl AvoidanceState {
    pub fn new(pos: Vec3) -> Self {
        Self { stuck_secs: 0.0, reroute_cooldown: 0.0, last_significant_pos: pos }
    }

    /// Record where the agent is now.  Returns the updated stuck time.
    pub fn track_progress(&mut self, pos: Vec3, dt: f32, epsilon: f32) -> f32 {
        if pos.distance(self.last_significant_pos) < epsilon {
            self.stuck_secs += dt;
        } else {
            self.last_significant_pos = pos;
            self.stuck_secs = 0.0;
        }
        self.stuck_secs
    }

    pub fn reset_progress(&mut self, pos: Vec3) {
        self.last_significant_pos = pos;
        self.stuck_secs = 0.0;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub id:             AgentId,
    pub position:       Vec3,
    /// Heading in radians, `atan2(dx, dz)`: 0 faces +z (south).
    pub yaw:            f32,
    pub base_speed:     f32,
    /// `base_speed` × the global speed multiplier.
    pub speed:          f32,
    /// Radians either side of `yaw`.
    pub fov_half_angle: f32,
    pub fov_radius:     f32,
    /// Final destination; steering reroutes head here.
    pub goal:           Vec3,
    pub route:          Vec<Vec3>,
    /// Index of the next unvisited waypoint in `route`.
    pub waypoint:       usize,
    pub avoidance:      AvoidanceState,
}

impl Agent {
    pub fn new(id: AgentId, position: Vec3, base_speed: f32) -> Self {
        Self {
            id,
            position,
            yaw: 0.0,
            base_speed,
            speed: base_speed,
            fov_half_angle: 35_f32.to_radians(),
            fov_radius: 12.0,
            goal: position,
            route: Vec::new(),
            waypoint: 0,
            avoidance: AvoidanceState::new(position),
        }
    }

    pub fn with_fov(mut self, half_angle_deg: f32, radius: f32) -> Self {
        self.set_fov(half_angle_deg, radius);
        self
    }

    pub fn set_fov(&mut self, half_angle_deg: f32, radius: f32) {
        self.fov_half_angle = half_angle_deg.clamp(1.0, 179.0).to_radians();
        self.fov_radius = radius.max(0.0);
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed = self.base_speed * multiplier.max(0.0);
    }

    /// The waypoint currently steered toward.
    pub fn target(&self) -> Option<Vec3> {
        self.route.get(self.waypoint).copied()
    }

    pub fn has_route(&self) -> bool {
        !self.route.is_empty()
    }

    /// Unit forward vector on the ground plane.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Install a new route and restart at its first waypoint.
    ///
    /// The goal is not changed.
    pub fn replace_route(&mut self, route: Vec<Vec3>) {
        self.route = route;
        self.waypoint = 0;
        self.avoidance.reset_progress(self.position);
    }

    /// Set a new goal together with the route that reaches it.
    pub fn assign(&mut self, goal: Vec3, route: Vec<Vec3>) {
        self.goal = goal;
        self.replace_route(route);
    }

    /// Replan from the current position to [`goal`](Self::goal).
    ///
    /// Attempts share one cooldown: an attempt within `reroute_cooldown`
    /// seconds of the previous one is suppressed.  A failed plan keeps the
    /// current route.
    pub fn reroute_to_goal<P: Replanner + ?Sized>(&mut self, replanner: &P, params: &SteeringParams) -> RerouteOutcome {
        if self.avoidance.reroute_cooldown > 0.0 {
            return RerouteOutcome::Suppressed;
        }
        self.avoidance.reroute_cooldown = params.reroute_cooldown;
        match replanner.replan(self.position, self.goal) {
            Ok(route) if !route.is_empty() => {
                debug!(agent = %self.id, waypoints = route.len(), "rerouted to goal");
                self.replace_route(route);
                RerouteOutcome::Replaced
            }
            Ok(_) => RerouteOutcome::NoPath,
            Err(e) => {
                debug!(agent = %self.id, error = %e, "reroute failed, keeping route");
                RerouteOutcome::NoPath
            }
        }
    }
}
