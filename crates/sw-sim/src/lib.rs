//! `sw-sim`: frame loop orchestrator for the shadewalk simulation.
//!
//! # Frame loop
//!
//! ```text
//! build():  validate → sun → shade scores → spawn agents + initial routes
//!
//! every tick(dt):
//!   ① Clock    advance by dt (frozen while paused).
//!   ② Sun      recompute from clock + location.
//!   ③ Shade    rescore edges only if the sun moved past the threshold.
//!   ④ Agents   speed, steer, FOV fan, shade ahead
//!              (parallel with the `parallel` feature; skipped while paused).
//!   ⑤ Wander   every auto_reroute_period_secs, replan everyone to a random
//!              node.
//!   ⑥ Observe  on_tick_end, on_snapshot every output_interval_ticks.
//!
//! dispose(): on_sim_end, drop everything.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the agent phase on Rayon's thread pool.           |
//! | `serde`    | `Serialize`/`Deserialize` for `SimConfig` and records. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sw_sim::{NoopObserver, SimBuilder, SimConfig};
//! use sw_spatial::ShadeAStarRouter;
//!
//! let mut sim = SimBuilder::new(SimConfig::default(), graph, world, ShadeAStarRouter).build()?;
//! for _ in 0..600 {
//!     sim.tick(1.0 / 60.0, &mut NoopObserver)?;
//! }
//! sim.dispose(&mut NoopObserver);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{AgentFrame, AgentSlot, Sim, TickSummary};
