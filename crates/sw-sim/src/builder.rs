//! Fluent builder for constructing a [`Sim`].

use glam::Vec3;
use tracing::{info, warn};

use sw_core::{AgentId, SimClock, SimRng};
use sw_mobility::{Agent, GraphReplanner, Replanner};
use sw_solar::SunPosition;
use sw_spatial::{RoadGraph, Router};
use sw_world::ObstacleQuery;

use crate::sim::{AgentSlot, angle_between_deg, random_node_pos};
use crate::{Sim, SimConfig, SimError, SimResult};

/// Attempts at drawing a goal node different from the spawn node.
const GOAL_DRAWS: usize = 8;

/// Fluent builder for [`Sim<W, R>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: agent count, seed, sun time and location, …
/// - [`RoadGraph`]: must have at least one edge
/// - `W: ObstacleQuery`: the world agents and sunlight collide with
/// - `R: Router`: the routing algorithm (e.g. [`sw_spatial::ShadeAStarRouter`])
///
/// # Optional inputs
///
/// | Method          | Default                                              |
/// |-----------------|------------------------------------------------------|
/// | `.agents(v)`    | `agent_count` agents at random nodes with random goals |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, graph, world, ShadeAStarRouter).build()?;
/// sim.run_ticks(600, 1.0 / 60.0, &mut NoopObserver)?;
/// sim.dispose(&mut NoopObserver);
/// ```
pub struct SimBuilder<W: ObstacleQuery, R: Router> {
    config: SimConfig,
    graph:  RoadGraph,
    world:  W,
    router: R,
    agents: Option<Vec<Agent>>,
}

impl<W: ObstacleQuery, R: Router> SimBuilder<W, R> {
    pub fn new(config: SimConfig, graph: RoadGraph, world: W, router: R) -> Self {
        Self { config, graph, world, router, agents: None }
    }

    /// Supply the agents instead of spawning `agent_count` random ones.
    ///
    /// Ids are reassigned to match list position.
    pub fn agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = Some(agents);
        self
    }

    /// Validate inputs, place the sun, score shade, and spawn agents.
    ///
    /// Everything the frame loop needs is ready when this returns.
    pub fn build(self) -> SimResult<Sim<W, R>> {
        let Self { config, mut graph, world, router, agents } = self;
        config.validate()?;
        if graph.edge_count() == 0 {
            return Err(SimError::EmptyGraph);
        }

        // ── Sun and shade ─────────────────────────────────────────────────
        let clock = SimClock::from_iso(&config.start_time, config.time_scale);
        if clock.start_unix_secs.is_none() {
            warn!(start_time = %config.start_time, "start time did not parse, sun uses its fallback position");
        }
        let sun = SunPosition::compute(config.latitude, config.longitude, clock.current_unix_secs());
        if angle_between_deg(graph.light_dir, sun.direction) > config.shade_recompute_threshold_deg {
            graph.recompute_shade(&world, sun.direction);
        }

        // ── Agents ────────────────────────────────────────────────────────
        let mut rng = SimRng::new(config.seed);
        let agents = match agents {
            Some(mut agents) => {
                for (i, agent) in agents.iter_mut().enumerate() {
                    agent.id = AgentId::from_index(i);
                    agent.position.y = config.steering.ground_offset;
                    agent.set_speed_multiplier(config.speed_multiplier);
                }
                agents
            }
            None => spawn_agents(&config, &graph, &router, &mut rng),
        };
        let agents: Vec<AgentSlot> = agents
            .into_iter()
            .map(|agent| AgentSlot::new(agent, config.fov.segments))
            .collect();

        info!(
            agents = agents.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            mean_shade = graph.mean_shade(),
            sun_altitude_deg = sun.altitude_deg,
            sun_azimuth_deg = sun.azimuth_deg,
            fallback_sun = sun.fallback,
            "simulation ready"
        );

        Ok(Sim {
            config,
            clock,
            sun,
            graph,
            world,
            router,
            agents,
            rng,
            paused: false,
            wander_elapsed: 0.0,
        })
    }
}

/// Spawn `config.agent_count` agents at random nodes, each routed to a
/// random goal node.
///
/// An agent whose first plan fails still spawns, idle, with its goal set.
fn spawn_agents<R: Router>(config: &SimConfig, graph: &RoadGraph, router: &R, rng: &mut SimRng) -> Vec<Agent> {
    let replanner = GraphReplanner::new(graph, router, config.shade_bias);
    let ground = config.steering.ground_offset;
    let mut failed = 0usize;

    let agents: Vec<Agent> = (0..config.agent_count)
        .filter_map(|i| {
            let start = random_node_pos(graph, rng)?;
            let mut goal = random_node_pos(graph, rng)?;
            for _ in 0..GOAL_DRAWS {
                if goal.distance(start) > config.steering.arrive_distance {
                    break;
                }
                goal = random_node_pos(graph, rng)?;
            }

            let position = Vec3::new(start.x, ground, start.z);
            let mut agent = Agent::new(AgentId::from_index(i), position, config.base_speed)
                .with_fov(config.fov.half_angle_deg, config.fov.radius);
            agent.set_speed_multiplier(config.speed_multiplier);
            match replanner.replan(start, goal) {
                Ok(route) => agent.assign(goal, route),
                Err(e) => {
                    warn!(agent = %agent.id, error = %e, "no initial route, agent spawns idle");
                    agent.goal = goal;
                    failed += 1;
                }
            }
            Some(agent)
        })
        .collect();

    if failed > 0 {
        warn!(failed, spawned = agents.len(), "some agents have no initial route");
    }
    agents
}
