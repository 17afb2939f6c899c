//! `sw-mobility`: moving one pedestrian along its route without walking
//! through buildings.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`agent`]    | `Agent`, `AvoidanceState`, goal-preserving reroute            |
//! | [`steering`] | `SteeringParams`, `steer`, `SteeringMode`, `SteeringReport`   |
//! | [`replan`]   | `Replanner` trait, `GraphReplanner`                           |
//! | [`error`]    | `MobilityError`, `MobilityResult<T>`                          |
//!
//! # Per-tick state machine
//!
//! ```text
//!            route empty ──────────────────────────────▶ Idle
//!   within arrive of waypoint ─ last? ─ yes ──────────▶ Arrived
//!                                  └─ no: advance ────▶ Following
//!   forward probe hit < stop ─ crawl + reroute ───────▶ Blocked
//!   forward probe hit < avoid ─ sidestep + slow ──────▶ Avoiding
//!                                  └─ stuck > 0.8 s: reroute
//!   clear ─ full step, capped at the waypoint ────────▶ Following
//! ```
//!
//! Reroutes from steering always target the agent's own goal and share one
//! cooldown.  The orchestrator's periodic wander reroute goes through
//! [`Agent::replace_route`] instead and leaves the goal alone.

pub mod agent;
pub mod error;
pub mod replan;
pub mod steering;


pub use agent::{Agent, AvoidanceState};
pub use error::{MobilityError, MobilityResult};
pub use replan::{GraphReplanner, Replanner};
pub use steering::{RerouteOutcome, SteeringMode, SteeringParams, SteeringReport, steer};
