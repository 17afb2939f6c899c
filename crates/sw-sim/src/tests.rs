//! Unit tests for sw-sim.

// ── Fixtures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fixtures {
    use glam::Vec3;
    use sw_core::Tick;
    use sw_spatial::{GraphParams, RoadGraph, RoadGraphBuilder, ShadeAStarRouter};
    use sw_world::OpenSky;

    use crate::{AgentFrame, Sim, SimBuilder, SimConfig, SimObserver, TickSummary};

    /// `side × side` grid with 10-unit spacing, scored under an overhead sun.
    pub fn grid(side: usize) -> RoadGraph {
        let mut b = RoadGraphBuilder::new(GraphParams::default());
        let at = |i: usize, j: usize| Vec3::new(i as f32 * 10.0, 0.0, j as f32 * 10.0);
        for i in 0..side {
            for j in 0..side {
                if i + 1 < side {
                    b.add_segment(at(i, j), at(i + 1, j));
                }
                if j + 1 < side {
                    b.add_segment(at(i, j), at(i, j + 1));
                }
            }
        }
        b.build(&OpenSky, Vec3::Y)
    }

    pub fn config(agents: usize) -> SimConfig {
        SimConfig { agent_count: agents, output_interval_ticks: 0, ..SimConfig::default() }
    }

    pub fn sim(config: SimConfig) -> Sim<OpenSky, ShadeAStarRouter> {
        SimBuilder::new(config, grid(4), OpenSky, ShadeAStarRouter).build().unwrap()
    }

    #[derive(Default)]
    pub struct Recorder {
        pub starts:    Vec<Tick>,
        pub summaries: Vec<TickSummary>,
        pub snapshots: Vec<(Tick, Vec<AgentFrame>)>,
        pub ended:     Option<Tick>,
    }

    impl SimObserver for Recorder {
        fn on_tick_start(&mut self, tick: Tick) {
            self.starts.push(tick);
        }

        fn on_tick_end(&mut self, summary: &TickSummary) {
            self.summaries.push(*summary);
        }

        fn on_snapshot(&mut self, tick: Tick, frames: &[AgentFrame]) {
            self.snapshots.push((tick, frames.to_vec()));
        }

        fn on_sim_end(&mut self, final_tick: Tick) {
            self.ended = Some(final_tick);
        }
    }
}

// ── SimBuilder ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use glam::Vec3;
    use sw_core::AgentId;
    use sw_mobility::Agent;
    use sw_spatial::{RoadGraph, ShadeAStarRouter};
    use sw_world::OpenSky;

    use super::fixtures::{config, grid, sim};
    use crate::{SimBuilder, SimConfig, SimError};

    #[test]
    fn empty_graph_is_rejected() {
        let result = SimBuilder::new(config(3), RoadGraph::empty(), OpenSky, ShadeAStarRouter).build();
        assert!(matches!(result, Err(SimError::EmptyGraph)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = SimConfig { shade_bias: 2.0, ..config(3) };
        let result = SimBuilder::new(bad, grid(3), OpenSky, ShadeAStarRouter).build();
        assert!(matches!(result, Err(SimError::Config(_))));

        let bad = SimConfig { auto_reroute_period_secs: 0.0, ..config(3) };
        let result = SimBuilder::new(bad, grid(3), OpenSky, ShadeAStarRouter).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn spawns_routed_agents_on_the_ground() {
        let s = sim(config(6));
        let ground = s.config.steering.ground_offset;
        assert_eq!(s.agents.len(), 6);
        for (i, slot) in s.agents.iter().enumerate() {
            let a = &slot.agent;
            assert_eq!(a.id, AgentId(i as u32));
            assert_eq!(a.position.y, ground);
            assert!(a.has_route(), "agent {i} spawned without a route");
            assert!(a.goal.distance(a.position) > s.config.steering.arrive_distance);
        }
    }

    #[test]
    fn supplied_agents_are_renumbered() {
        let agents = vec![
            Agent::new(AgentId(40), Vec3::new(0.0, 3.0, 0.0), 1.0),
            Agent::new(AgentId(7), Vec3::new(10.0, 0.0, 0.0), 1.0),
        ];
        let s = SimBuilder::new(config(9), grid(3), OpenSky, ShadeAStarRouter).agents(agents).build().unwrap();
        assert_eq!(s.agents.len(), 2);
        assert_eq!(s.agents[0].agent.id, AgentId(0));
        assert_eq!(s.agents[1].agent.id, AgentId(1));
        assert_eq!(s.agents[0].agent.position.y, s.config.steering.ground_offset);
    }

    #[test]
    fn shade_is_scored_for_the_start_sun() {
        // The fixture graph was scored with an overhead light.
        let s = sim(config(1));
        assert_eq!(s.graph.light_dir, s.sun.direction);
        assert!(!s.sun.fallback);
    }

    #[test]
    fn unparseable_start_time_uses_fallback_sun() {
        let s = sim(SimConfig { start_time: "not a date".into(), ..config(1) });
        assert!(s.sun.fallback);
    }
}

// ── Frame loop ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick {
    use sw_core::Tick;

    use super::fixtures::{Recorder, config, sim};
    use crate::{NoopObserver, SimConfig};

    #[test]
    fn observer_sees_every_frame_in_order() {
        let mut s = sim(SimConfig { output_interval_ticks: 5, ..config(3) });
        let mut rec = Recorder::default();
        s.run_ticks(11, 1.0 / 30.0, &mut rec).unwrap();

        assert_eq!(rec.starts, (0..11).map(Tick).collect::<Vec<_>>());
        assert_eq!(rec.summaries.len(), 11);
        let snap_ticks: Vec<Tick> = rec.snapshots.iter().map(|(t, _)| *t).collect();
        assert_eq!(snap_ticks, vec![Tick(0), Tick(5), Tick(10)]);
        for (tick, frames) in &rec.snapshots {
            assert_eq!(frames.len(), 3);
            assert!(frames.iter().all(|f| f.tick == *tick));
        }
        assert_eq!(s.clock.current_tick, Tick(11));
    }

    #[test]
    fn agents_stay_on_the_ground() {
        let mut s = sim(config(8));
        let ground = s.config.steering.ground_offset;
        for _ in 0..300 {
            s.tick(1.0 / 30.0, &mut NoopObserver).unwrap();
            assert!(s.agents.iter().all(|slot| slot.agent.position.y == ground));
        }
    }

    #[test]
    fn agents_move_and_fans_are_built() {
        let mut s = sim(config(4));
        let before: Vec<_> = s.agents.iter().map(|slot| slot.agent.position).collect();
        s.run_ticks(30, 1.0 / 30.0, &mut NoopObserver).unwrap();
        let moved = s.agents.iter().zip(&before).filter(|(slot, p)| slot.agent.position.distance(**p) > 0.1).count();
        assert!(moved > 0);
        let segments = s.config.fov.segments as usize;
        for slot in &s.agents {
            assert_eq!(slot.fan.vertices.len(), segments + 2);
            assert_eq!(slot.fan.triangle_count(), segments);
        }
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed: u64| {
            let mut s = sim(SimConfig { seed, ..config(6) });
            s.run_ticks(400, 1.0 / 30.0, &mut NoopObserver).unwrap();
            s.agents.iter().map(|slot| (slot.agent.position, slot.agent.route.clone())).collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn non_finite_dt_does_not_move_anyone() {
        let mut s = sim(config(3));
        let before: Vec<_> = s.agents.iter().map(|slot| slot.agent.position).collect();
        s.tick(f32::NAN, &mut NoopObserver).unwrap();
        let after: Vec<_> = s.agents.iter().map(|slot| slot.agent.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn summary_counts_every_agent() {
        let mut s = sim(config(5));
        let summary = s.tick(1.0 / 30.0, &mut NoopObserver).unwrap();
        let total = summary.idle + summary.following + summary.avoiding + summary.blocked + summary.arrived;
        assert_eq!(total, 5);
        assert_eq!(summary.tick, Tick(0));
    }

    #[test]
    fn dispose_reports_final_tick() {
        let mut s = sim(config(2));
        let mut rec = Recorder::default();
        s.run_ticks(4, 0.1, &mut rec).unwrap();
        let final_tick = s.dispose(&mut rec);
        assert_eq!(final_tick, Tick(4));
        assert_eq!(rec.ended, Some(Tick(4)));
    }
}

// ── Pause ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pause {
    use super::fixtures::{Recorder, config, sim};
    use crate::{NoopObserver, SimConfig};

    #[test]
    fn paused_frames_freeze_agents_and_clock() {
        let mut s = sim(SimConfig { output_interval_ticks: 1, ..config(4) });
        s.run_ticks(5, 1.0 / 30.0, &mut NoopObserver).unwrap();
        s.pause();
        assert!(s.is_paused());

        let tick = s.clock.current_tick;
        let before: Vec<_> = s.agents.iter().map(|slot| slot.agent.clone()).collect();
        let mut rec = Recorder::default();
        s.run_ticks(20, 1.0 / 30.0, &mut rec).unwrap();

        let after: Vec<_> = s.agents.iter().map(|slot| slot.agent.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(s.clock.current_tick, tick);
        assert_eq!(rec.summaries.len(), 20);
        assert!(rec.summaries.iter().all(|summary| summary.paused));
        assert!(rec.snapshots.is_empty());
    }

    #[test]
    fn resume_continues_moving() {
        let mut s = sim(config(4));
        s.pause();
        s.run_ticks(10, 1.0 / 30.0, &mut NoopObserver).unwrap();
        s.resume();
        let before: Vec<_> = s.agents.iter().map(|slot| slot.agent.position).collect();
        s.run_ticks(30, 1.0 / 30.0, &mut NoopObserver).unwrap();
        assert!(s.agents.iter().zip(&before).any(|(slot, p)| slot.agent.position != *p));
    }

    #[test]
    fn paused_time_does_not_count_toward_wander() {
        let mut s = sim(SimConfig { auto_reroute_period_secs: 1.0, ..config(2) });
        s.pause();
        let mut rec = Recorder::default();
        s.run_ticks(10, 0.5, &mut rec).unwrap();
        assert!(rec.summaries.iter().all(|summary| summary.wander_reroutes == 0));
    }
}

// ── Wander reroute ────────────────────────────────────────────────────────────

#[cfg(test)]
mod wander {
    use super::fixtures::{Recorder, config, sim};
    use crate::SimConfig;

    #[test]
    fn fires_once_per_period() {
        // 0.5 s frames, 7 s period: the 14th frame crosses it.
        let mut s = sim(config(5));
        let mut rec = Recorder::default();
        s.run_ticks(28, 0.5, &mut rec).unwrap();

        let fired: Vec<usize> = rec
            .summaries
            .iter()
            .enumerate()
            .filter(|(_, summary)| summary.wander_reroutes > 0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fired, vec![13, 27]);
        assert_eq!(rec.summaries[13].wander_reroutes, 5);
    }

    #[test]
    fn disabled_never_fires() {
        let mut s = sim(SimConfig { auto_reroute: false, ..config(3) });
        let mut rec = Recorder::default();
        s.run_ticks(40, 0.5, &mut rec).unwrap();
        assert!(rec.summaries.iter().all(|summary| summary.wander_reroutes == 0));
    }

    #[test]
    fn toggling_restarts_the_period() {
        let mut s = sim(config(2));
        let mut rec = Recorder::default();
        s.run_ticks(10, 0.5, &mut rec).unwrap();
        s.set_auto_reroute(false);
        s.set_auto_reroute(true);
        s.run_ticks(10, 0.5, &mut rec).unwrap();
        assert!(rec.summaries.iter().all(|summary| summary.wander_reroutes == 0));
    }

    #[test]
    fn keeps_goals_and_restarts_routes() {
        let mut s = sim(config(4));
        let goals: Vec<_> = s.agents.iter().map(|slot| slot.agent.goal).collect();
        let replaced = s.wander_reroute();
        assert_eq!(replaced, 4);
        for (slot, goal) in s.agents.iter().zip(&goals) {
            assert_eq!(slot.agent.goal, *goal);
            assert_eq!(slot.agent.waypoint, 0);
            assert!(slot.agent.has_route());
        }
    }
}

// ── Sun and shade ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod shade {
    use glam::Vec3;

    use super::fixtures::{Recorder, config, sim};
    use crate::SimConfig;
    use crate::sim::angle_between_deg;

    #[test]
    fn still_sun_is_not_rescored() {
        let mut s = sim(SimConfig { time_scale: 0.0, ..config(2) });
        let mut rec = Recorder::default();
        s.run_ticks(20, 0.5, &mut rec).unwrap();
        assert!(rec.summaries.iter().all(|summary| !summary.shade_recomputed));
    }

    #[test]
    fn slow_sun_stays_under_threshold() {
        // Real time: the sun moves about 0.25° per minute.
        let mut s = sim(SimConfig { time_scale: 1.0, ..config(2) });
        let mut rec = Recorder::default();
        s.run_ticks(20, 0.5, &mut rec).unwrap();
        assert!(rec.summaries.iter().all(|summary| !summary.shade_recomputed));
    }

    #[test]
    fn fast_sun_is_rescored() {
        // One simulated hour per frame second: 7.5° per half-second frame.
        let mut s = sim(SimConfig { time_scale: 3600.0, ..config(2) });
        let summary = s.tick(0.5, &mut Recorder::default()).unwrap();
        assert!(summary.shade_recomputed);
        assert_eq!(s.graph.light_dir, s.sun.direction);
    }

    #[test]
    fn set_time_moves_the_sun() {
        let mut s = sim(config(1));
        let noon = s.sun;
        assert!(s.set_time("2024-06-21T03:00:00Z"));
        assert!(s.sun.angle_to(&noon) > 10.0);
        assert_eq!(s.graph.light_dir, s.sun.direction);

        assert!(!s.set_time("yesterday-ish"));
        assert!(s.sun.fallback);
    }

    #[test]
    fn set_location_validates() {
        let mut s = sim(config(1));
        assert!(s.set_location(95.0, 0.0).is_err());
        assert!(s.set_location(0.0, 200.0).is_err());
        assert!(s.set_location(-33.9, 151.2).is_ok());
        assert_eq!(s.config.latitude, -33.9);
    }

    #[test]
    fn zero_direction_counts_as_moved() {
        assert_eq!(angle_between_deg(Vec3::ZERO, Vec3::Y), 180.0);
        assert!(angle_between_deg(Vec3::X, Vec3::X) < 1e-3);
        assert!((angle_between_deg(Vec3::X, Vec3::Z) - 90.0).abs() < 1e-3);
    }
}

// ── Controls ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod controls {
    use glam::Vec3;

    use super::fixtures::{config, sim};
    use crate::NoopObserver;

    #[test]
    fn speed_multiplier_reaches_agents() {
        let mut s = sim(config(3));
        s.set_speed_multiplier(2.0);
        let base = s.config.base_speed;
        assert!(s.agents.iter().all(|slot| (slot.agent.speed - base * 2.0).abs() < 1e-5));

        s.set_speed_multiplier(-1.0);
        assert_eq!(s.config.speed_multiplier, 2.0);
    }

    #[test]
    fn zero_speed_stops_everyone() {
        let mut s = sim(config(3));
        s.set_speed_multiplier(0.0);
        s.run_ticks(5, 1.0 / 30.0, &mut NoopObserver).unwrap();
        let before: Vec<_> = s.agents.iter().map(|slot| slot.agent.position).collect();
        s.run_ticks(30, 1.0 / 30.0, &mut NoopObserver).unwrap();
        let after: Vec<_> = s.agents.iter().map(|slot| slot.agent.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn shade_bias_is_clamped() {
        let mut s = sim(config(1));
        s.set_shade_bias(3.0);
        assert_eq!(s.config.shade_bias, 1.0);
        s.set_shade_bias(-1.0);
        assert_eq!(s.config.shade_bias, 0.0);
        s.set_shade_bias(f32::NAN);
        assert_eq!(s.config.shade_bias, 0.0);
    }

    #[test]
    fn fov_reaches_agents() {
        let mut s = sim(config(2));
        s.set_fov(60.0, 20.0);
        for slot in &s.agents {
            assert!((slot.agent.fov_half_angle.to_degrees() - 60.0).abs() < 1e-3);
            assert_eq!(slot.agent.fov_radius, 20.0);
        }
    }

    #[test]
    fn preview_route_is_anchored() {
        let s = sim(config(0));
        let start = Vec3::new(1.0, 0.0, -2.0);
        let goal = Vec3::new(29.0, 0.0, 31.0);
        let route = s.preview_route(start, goal).unwrap();
        assert_eq!(route.first(), Some(&start));
        assert_eq!(route.last(), Some(&goal));
        assert!(route.len() >= 4);
    }
}
