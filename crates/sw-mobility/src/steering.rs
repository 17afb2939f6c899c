//! Per-tick steering and avoidance.

use glam::Vec3;

use sw_world::{HitFilter, ObstacleQuery, Ray};

use crate::agent::Agent;
use crate::replan::Replanner;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SteeringParams {
    /// Waypoint counts as reached inside this distance.
    pub arrive_distance:    f32,
    /// Forward hit closer than this: crawl and reroute.
    pub stop_distance:      f32,
    /// Forward hit closer than this: sidestep and slow down.
    pub avoid_distance:     f32,
    pub eye_height:         f32,
    /// Every tick ends with `position.y` set to this.
    pub ground_offset:      f32,
    pub crawl_factor:       f32,
    pub avoid_speed_factor: f32,
    /// Sidestep per second per unit of intrusion into `avoid_distance`.
    pub lateral_gain:       f32,
    /// Movement below this counts as no progress.
    pub progress_epsilon:   f32,
    pub stuck_threshold:    f32,
    pub reroute_cooldown:   f32,
    /// Frame-hitch guard: `dt` is clamped to this.
    pub max_dt:             f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            arrive_distance:    0.5,
            stop_distance:      0.6,
            avoid_distance:     2.5,
            eye_height:         1.6,
            ground_offset:      0.05,
            crawl_factor:       0.1,
            avoid_speed_factor: 0.6,
            lateral_gain:       1.2,
            progress_epsilon:   0.03,
            stuck_threshold:    0.8,
            reroute_cooldown:   2.5,
            max_dt:             0.033,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SteeringMode {
    /// No route.
    Idle,
    /// At the last waypoint.
    Arrived,
    Following,
    Avoiding,
    Blocked,
}

impl SteeringMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SteeringMode::Idle      => "idle",
            SteeringMode::Arrived   => "arrived",
            SteeringMode::Following => "following",
            SteeringMode::Avoiding  => "avoiding",
            SteeringMode::Blocked   => "blocked",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RerouteOutcome {
    /// A new route was installed.
    Replaced,
    /// Planning failed; the previous route is kept.
    NoPath,
    /// Still inside the cooldown window.
    Suppressed,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SteeringReport {
    pub mode:    SteeringMode,
    pub reroute: Option<RerouteOutcome>,
}

impl SteeringReport {
    fn mode(mode: SteeringMode) -> Self {
        Self { mode, reroute: None }
    }
}

/// Advance one agent by `dt` seconds.
pub fn steer<W, P>(agent: &mut Agent, dt: f32, params: &SteeringParams, world: &W, replanner: &P) -> SteeringReport
where
    W: ObstacleQuery + ?Sized,
    P: Replanner + ?Sized,
{
    let dt = if dt.is_finite() { dt.clamp(0.0, params.max_dt) } else { 0.0 };
    agent.avoidance.reroute_cooldown = (agent.avoidance.reroute_cooldown - dt).max(0.0);
    let report = steer_inner(agent, dt, params, world, replanner);
    agent.position.y = params.ground_offset;
    report
}

fn steer_inner<W, P>(agent: &mut Agent, dt: f32, params: &SteeringParams, world: &W, replanner: &P) -> SteeringReport
where
    W: ObstacleQuery + ?Sized,
    P: Replanner + ?Sized,
{
    let Some(target) = agent.target() else {
        return SteeringReport::mode(SteeringMode::Idle);
    };

    let mut to_target = target - agent.position;
    to_target.y = 0.0;
    let distance = to_target.length();
    if distance < params.arrive_distance {
        if agent.waypoint + 1 < agent.route.len() {
            agent.waypoint += 1;
            return SteeringReport::mode(SteeringMode::Following);
        }
        return SteeringReport::mode(SteeringMode::Arrived);
    }

    let dir = to_target / distance;
    agent.yaw = dir.x.atan2(dir.z);
    let step = agent.speed * dt;
    let eye = Vec3::new(agent.position.x, params.eye_height, agent.position.z);
    let hit = Ray::new(eye, dir).and_then(|ray| world.cast(&ray, params.avoid_distance, HitFilter::ObstaclesOnly));

    match hit {
        Some(h) if h.distance < params.stop_distance => {
            agent.position += dir * (step * params.crawl_factor).min(distance);
            let outcome = agent.reroute_to_goal(replanner, params);
            SteeringReport { mode: SteeringMode::Blocked, reroute: Some(outcome) }
        }
        Some(h) => {
            let side = clearer_side(eye, dir, params.avoid_distance, world);
            let lateral = side * (params.avoid_distance - h.distance) * params.lateral_gain * dt;
            let forward = dir * (step * params.avoid_speed_factor).min(distance);
            agent.position += lateral + forward;

            let stuck = agent.avoidance.track_progress(agent.position, dt, params.progress_epsilon);
            let reroute = (stuck > params.stuck_threshold).then(|| agent.reroute_to_goal(replanner, params));
            SteeringReport { mode: SteeringMode::Avoiding, reroute }
        }
        None => {
            agent.position += dir * step.min(distance);
            agent.avoidance.reset_progress(agent.position);
            SteeringReport::mode(SteeringMode::Following)
        }
    }
}

/// Unit vector 90° to the left of `dir` on the ground plane.
#[inline]
pub fn left_of(dir: Vec3) -> Vec3 {
    Vec3::new(dir.z, 0.0, -dir.x)
}

/// Probe both forward diagonals out to twice `avoid_distance` and return the
/// lateral unit vector of the side with more free space; left on a tie.
fn clearer_side<W: ObstacleQuery + ?Sized>(eye: Vec3, dir: Vec3, avoid_distance: f32, world: &W) -> Vec3 {
    let left = left_of(dir);
    let range = 2.0 * avoid_distance;
    let free = |side: Vec3| {
        Ray::new(eye, dir + side)
            .and_then(|ray| world.cast(&ray, range, HitFilter::ObstaclesOnly))
            .map_or(range, |h| h.distance)
    };
    if free(-left) > free(left) { -left } else { left }
}
