//! Frame observer trait for progress reporting and data collection.

use sw_core::Tick;

use crate::sim::{AgentFrame, TickSummary};

/// Callbacks invoked by [`Sim::tick`][crate::Sim::tick] at key points of a
/// frame.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: arrival counter
///
/// ```rust,ignore
/// struct Arrivals(usize);
///
/// impl SimObserver for Arrivals {
///     fn on_tick_end(&mut self, summary: &TickSummary) {
///         self.0 = summary.arrived;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each frame, before the clock moves.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after every agent has been updated.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called every `config.output_interval_ticks` frames with one record per
    /// agent, in agent order.
    fn on_snapshot(&mut self, _tick: Tick, _frames: &[AgentFrame]) {}

    /// Called once from [`Sim::dispose`][crate::Sim::dispose].
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
