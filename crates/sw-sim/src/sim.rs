//! The `Sim` struct and its frame loop.

use glam::Vec3;
use tracing::{debug, info};

use sw_core::{AgentId, NodeId, SimClock, SimRng, Tick};
use sw_fov::{FovFan, shade_along_heading};
use sw_mobility::replan::ANCHOR_TOLERANCE;
use sw_mobility::{Agent, GraphReplanner, Replanner, RerouteOutcome, SteeringMode, SteeringReport, steer};
use sw_solar::SunPosition;
use sw_spatial::{RoadGraph, Router, find_path};
use sw_world::ObstacleQuery;

use crate::{SimConfig, SimError, SimObserver, SimResult};

// ── Per-agent state ───────────────────────────────────────────────────────────

/// One agent plus everything the frame loop derives for it.
#[derive(Clone, Debug)]
pub struct AgentSlot {
    pub agent:       Agent,
    /// Visibility fan, rebuilt in place every frame.
    pub fan:         FovFan,
    /// Steering mode from the last update.
    pub mode:        SteeringMode,
    /// Fraction of the strip ahead of the agent that is shaded.
    pub shade_ahead: f32,
}

impl AgentSlot {
    pub fn new(agent: Agent, fov_segments: u32) -> Self {
        Self { agent, fan: FovFan::new(fov_segments), mode: SteeringMode::Idle, shade_ahead: 0.0 }
    }
}

/// Flat per-agent record handed to [`SimObserver::on_snapshot`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentFrame {
    pub agent:            AgentId,
    pub tick:             Tick,
    /// Frame seconds since the run started.
    pub elapsed_secs:     f64,
    pub position:         Vec3,
    pub yaw:              f32,
    pub mode:             SteeringMode,
    pub waypoint:         usize,
    pub route_len:        usize,
    pub shade_ahead:      f32,
    /// Distance to the nearest obstacle inside the fan, if any.
    pub fov_cap_distance: Option<f32>,
}

/// What happened during one [`Sim::tick`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickSummary {
    pub tick:             Tick,
    pub elapsed_secs:     f64,
    pub paused:           bool,
    pub sun:              SunPosition,
    /// Edge shade scores were rescored this frame.
    pub shade_recomputed: bool,
    pub mean_shade:       f32,
    pub idle:             usize,
    pub following:        usize,
    pub avoiding:         usize,
    pub blocked:          usize,
    pub arrived:          usize,
    /// Steering reroutes that installed a new route.
    pub reroutes:         usize,
    /// Steering reroutes that found no path.
    pub reroute_failures: usize,
    /// Routes replaced by the periodic wander reroute.
    pub wander_reroutes:  usize,
}

impl TickSummary {
    fn new(tick: Tick, paused: bool, sun: SunPosition) -> Self {
        Self {
            tick,
            elapsed_secs: 0.0,
            paused,
            sun,
            shade_recomputed: false,
            mean_shade: 0.0,
            idle: 0,
            following: 0,
            avoiding: 0,
            blocked: 0,
            arrived: 0,
            reroutes: 0,
            reroute_failures: 0,
            wander_reroutes: 0,
        }
    }

    fn count_mode(&mut self, mode: SteeringMode) {
        match mode {
            SteeringMode::Idle      => self.idle += 1,
            SteeringMode::Following => self.following += 1,
            SteeringMode::Avoiding  => self.avoiding += 1,
            SteeringMode::Blocked   => self.blocked += 1,
            SteeringMode::Arrived   => self.arrived += 1,
        }
    }

    fn count_reroute(&mut self, report: &SteeringReport) {
        match report.reroute {
            Some(RerouteOutcome::Replaced) => self.reroutes += 1,
            Some(RerouteOutcome::NoPath)   => self.reroute_failures += 1,
            Some(RerouteOutcome::Suppressed) | None => {}
        }
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The simulation context: every piece of mutable state a run touches.
///
/// Each [`tick`](Self::tick) runs, in order:
///
/// 1. **Clock**: advance by `dt` unless paused.
/// 2. **Sun**: recompute from the clock and location.
/// 3. **Shade**: rescore edges if the sun moved past the threshold.
/// 4. **Agents** (skipped while paused, optionally parallel): apply the speed
///    multiplier, steer, rebuild the FOV fan, sample shade ahead.
/// 5. **Wander**: every `auto_reroute_period_secs`, replan each agent to a
///    fresh random node.
/// 6. **Observer**: `on_tick_end`, then `on_snapshot` on interval frames.
///
/// Create via [`SimBuilder`][crate::SimBuilder]; tear down with
/// [`dispose`](Self::dispose).
pub struct Sim<W: ObstacleQuery, R: Router> {
    pub config: SimConfig,

    /// Frame counter and sun timestamp.
    pub clock: SimClock,

    /// Sun position from the last frame.
    pub sun: SunPosition,

    /// Road graph.  Shade scores are the only part rewritten after build.
    pub graph: RoadGraph,

    pub world: W,

    pub router: R,

    /// Agents in update order.  `agents[i].agent.id == AgentId(i)`.
    pub agents: Vec<AgentSlot>,

    pub(crate) rng: SimRng,

    pub(crate) paused: bool,

    /// Frame seconds since the last wander reroute.
    pub(crate) wander_elapsed: f32,
}

impl<W: ObstacleQuery, R: Router> Sim<W, R> {
    // ── Frame loop ────────────────────────────────────────────────────────

    /// Advance the simulation by one frame of `dt` seconds.
    pub fn tick<O: SimObserver + ?Sized>(&mut self, dt: f32, observer: &mut O) -> SimResult<TickSummary> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if !self.paused {
            self.clock.advance(dt);
        }

        // The sun (and shade scores) must settle before any agent casts a ray.
        let shade_recomputed = self.refresh_sun();
        let mut summary = TickSummary::new(now, self.paused, self.sun);
        summary.shade_recomputed = shade_recomputed;

        if !self.paused {
            for report in self.update_agents(dt) {
                summary.count_reroute(&report);
            }
            if self.config.auto_reroute {
                self.wander_elapsed += dt;
                let period = self.config.auto_reroute_period_secs;
                if self.wander_elapsed >= period {
                    self.wander_elapsed %= period;
                    summary.wander_reroutes = self.wander_reroute();
                }
            }
        }

        for slot in &self.agents {
            summary.count_mode(slot.mode);
        }
        summary.elapsed_secs = self.clock.elapsed_real_secs;
        summary.mean_shade = self.graph.mean_shade();
        observer.on_tick_end(&summary);

        let interval = self.config.output_interval_ticks;
        if !self.paused && interval > 0 && now.0.is_multiple_of(interval) {
            observer.on_snapshot(now, &self.frames_at(now));
        }
        Ok(summary)
    }

    /// Run exactly `n` frames of `dt` seconds each.
    pub fn run_ticks<O: SimObserver + ?Sized>(&mut self, n: u64, dt: f32, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.tick(dt, observer)?;
        }
        Ok(())
    }

    /// Explicit teardown.  Fires `on_sim_end` and returns the final tick.
    pub fn dispose<O: SimObserver + ?Sized>(self, observer: &mut O) -> Tick {
        let final_tick = self.clock.current_tick;
        observer.on_sim_end(final_tick);
        info!(
            tick = final_tick.0,
            elapsed_secs = self.clock.elapsed_real_secs,
            agents = self.agents.len(),
            "simulation disposed"
        );
        final_tick
    }

    /// Update every agent and return the steering reports in agent order.
    ///
    /// With the `parallel` Cargo feature the agents are updated on Rayon's
    /// thread pool; they only read the graph, world, and router.
    fn update_agents(&mut self, dt: f32) -> Vec<SteeringReport> {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let config    = &self.config;
        let world     = &self.world;
        let light_dir = self.sun.direction;
        let sampler   = self.graph.shade_sampler();
        let replanner = GraphReplanner::new(&self.graph, &self.router, config.shade_bias);

        let update = |slot: &mut AgentSlot| -> SteeringReport {
            slot.agent.set_speed_multiplier(config.speed_multiplier);
            let report = steer(&mut slot.agent, dt, &config.steering, world, &replanner);
            slot.mode = report.mode;

            let agent = &slot.agent;
            slot.fan.update(agent.position, agent.yaw, agent.fov_half_angle, agent.fov_radius, &config.fov, world);
            slot.shade_ahead = shade_along_heading(
                agent.position,
                agent.yaw,
                config.heading_shade_distance,
                &sampler,
                world,
                light_dir,
            );
            report
        };

        #[cfg(not(feature = "parallel"))]
        {
            self.agents.iter_mut().map(update).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.agents.par_iter_mut().map(update).collect()
        }
    }

    /// Recompute the sun, then rescore shade if it moved far enough since
    /// the last scoring pass.  Returns `true` if edges were rescored.
    fn refresh_sun(&mut self) -> bool {
        self.sun = SunPosition::compute(self.config.latitude, self.config.longitude, self.clock.current_unix_secs());
        let moved = angle_between_deg(self.graph.light_dir, self.sun.direction);
        if moved <= self.config.shade_recompute_threshold_deg {
            return false;
        }
        self.graph.recompute_shade(&self.world, self.sun.direction);
        debug!(
            moved_deg = moved,
            altitude_deg = self.sun.altitude_deg,
            azimuth_deg = self.sun.azimuth_deg,
            "sun moved, shade rescored"
        );
        true
    }

    // ── Rerouting ─────────────────────────────────────────────────────────

    /// Replan every agent from where it stands to a fresh random graph node.
    ///
    /// This is the periodic wander reroute: the new route replaces the old
    /// one in place and `goal` is left alone, so a later stuck reroute still
    /// heads for the original goal.  Agents whose plan fails keep their
    /// route.  Returns the number of routes replaced.
    pub fn wander_reroute(&mut self) -> usize {
        let replanner = GraphReplanner::new(&self.graph, &self.router, self.config.shade_bias);
        let mut replaced = 0;
        for slot in &mut self.agents {
            let Some(target) = random_node_pos(&self.graph, &mut self.rng) else {
                break;
            };
            match replanner.replan(slot.agent.position, target) {
                Ok(route) => {
                    slot.agent.replace_route(route);
                    replaced += 1;
                }
                Err(e) => debug!(agent = %slot.agent.id, error = %e, "wander reroute failed, keeping route"),
            }
        }
        debug!(replaced, agents = self.agents.len(), "wander reroute");
        replaced
    }

    /// Shade-biased route between two arbitrary points, anchored at both.
    pub fn preview_route(&self, start: Vec3, goal: Vec3) -> SimResult<Vec<Vec3>> {
        let route = find_path(&self.router, &self.graph, start, goal, self.config.shade_bias)?;
        Ok(route.anchored(start, goal, ANCHOR_TOLERANCE))
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Freeze the clock and all agent updates.  Observers still see frames.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Scale every agent's walking speed.  Negative or non-finite input is
    /// ignored.
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        if !(multiplier.is_finite() && multiplier >= 0.0) {
            return;
        }
        self.config.speed_multiplier = multiplier;
        for slot in &mut self.agents {
            slot.agent.set_speed_multiplier(multiplier);
        }
    }

    /// Set the router's shade weight, clamped to `[0, 1]`.  Applies to the
    /// next plan; existing routes are kept.
    pub fn set_shade_bias(&mut self, bias: f32) {
        if bias.is_finite() {
            self.config.shade_bias = bias.clamp(0.0, 1.0);
        }
    }

    /// Jump the sun clock to `iso`.  Returns `false` if it did not parse, in
    /// which case the fallback sun is used.
    pub fn set_time(&mut self, iso: &str) -> bool {
        let parsed = self.clock.set_time(iso);
        self.config.start_time = iso.to_owned();
        self.refresh_sun();
        parsed
    }

    /// Move the observer location used for the sun.
    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> SimResult<()> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(SimError::Config(format!("location ({latitude}, {longitude}) is not a valid lat/lon")));
        }
        self.config.latitude = latitude;
        self.config.longitude = longitude;
        self.refresh_sun();
        Ok(())
    }

    /// Turn the periodic wander reroute on or off.  The period restarts.
    pub fn set_auto_reroute(&mut self, enabled: bool) {
        self.config.auto_reroute = enabled;
        self.wander_elapsed = 0.0;
    }

    pub fn set_fov(&mut self, half_angle_deg: f32, radius: f32) {
        self.config.fov.half_angle_deg = half_angle_deg;
        self.config.fov.radius = radius;
        for slot in &mut self.agents {
            slot.agent.set_fov(half_angle_deg, radius);
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index()).map(|slot| &slot.agent)
    }

    /// One [`AgentFrame`] per agent, stamped with the current tick.
    pub fn agent_frames(&self) -> Vec<AgentFrame> {
        self.frames_at(self.clock.current_tick)
    }

    fn frames_at(&self, tick: Tick) -> Vec<AgentFrame> {
        let elapsed_secs = self.clock.elapsed_real_secs;
        self.agents
            .iter()
            .map(|slot| AgentFrame {
                agent: slot.agent.id,
                tick,
                elapsed_secs,
                position: slot.agent.position,
                yaw: slot.agent.yaw,
                mode: slot.mode,
                waypoint: slot.agent.waypoint,
                route_len: slot.agent.route.len(),
                shade_ahead: slot.shade_ahead,
                fov_cap_distance: slot.fan.cap.map(|c| c.distance),
            })
            .collect()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Position of a uniformly chosen graph node.
pub(crate) fn random_node_pos(graph: &RoadGraph, rng: &mut SimRng) -> Option<Vec3> {
    rng.index(graph.node_count())
        .and_then(|i| graph.node_pos(NodeId::from_index(i)))
}

/// Angle between two directions in degrees; 180 if either is zero.
pub(crate) fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    match (a.try_normalize(), b.try_normalize()) {
        (Some(a), Some(b)) => a.dot(b).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 180.0,
    }
}
