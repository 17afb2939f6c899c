//! The `OutputWriter` trait implemented by backend writers.

use crate::{AgentFrameRow, OutputResult, TickSummaryRow};

/// Sink for per-agent frames and per-tick summaries.
///
/// Errors surface to the caller through
/// [`FrameOutputObserver::take_error`][crate::FrameOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of agent frames.
    fn write_frames(&mut self, rows: &[AgentFrameRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
