//! `sw-output`: simulation output writers for shadewalk.
//!
//! | Writer       | Files created                                 |
//! |--------------|-----------------------------------------------|
//! | [`CsvWriter`] | `agent_frames.csv`, `tick_summaries.csv`     |
//! | [`write_route_geojson`] | one route preview `FeatureCollection` |
//!
//! Frame writers implement [`OutputWriter`] and are driven by
//! [`FrameOutputObserver`], which implements `sw_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sw_output::{CsvWriter, FrameOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = FrameOutputObserver::new(writer);
//! sim.run_ticks(600, 1.0 / 30.0, &mut obs)?;
//! sim.dispose(&mut obs);
//! if let Some(e) = obs.take_error() { eprintln!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod geojson;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use geojson::{route_to_geojson, write_route_geojson};
pub use observer::FrameOutputObserver;
pub use row::{AgentFrameRow, TickSummaryRow};
pub use writer::OutputWriter;
