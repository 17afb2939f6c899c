//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `agent_frames.csv`
//! - `tick_summaries.csv`

use std::fs::{self, File};
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentFrameRow, OutputResult, TickSummaryRow};

pub const FRAME_HEADERS: [&str; 12] = [
    "agent_id",
    "frame",
    "elapsed_secs",
    "x",
    "y",
    "z",
    "yaw",
    "mode",
    "waypoint",
    "route_len",
    "shade_ahead",
    "fov_cap_distance",
];

pub const SUMMARY_HEADERS: [&str; 15] = [
    "frame",
    "elapsed_secs",
    "paused",
    "sun_altitude_deg",
    "sun_azimuth_deg",
    "shade_recomputed",
    "mean_shade",
    "following",
    "avoiding",
    "blocked",
    "arrived",
    "idle",
    "reroutes",
    "reroute_failures",
    "wander_reroutes",
];

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    frames:    Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the two CSV files in it, and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;

        let mut frames = Writer::from_path(dir.join("agent_frames.csv"))?;
        frames.write_record(FRAME_HEADERS)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADERS)?;

        Ok(Self { frames, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_frames(&mut self, rows: &[AgentFrameRow]) -> OutputResult<()> {
        for row in rows {
            self.frames.write_record(&[
                row.agent_id.to_string(),
                row.frame.to_string(),
                format!("{:.4}", row.elapsed_secs),
                format!("{:.3}", row.x),
                format!("{:.3}", row.y),
                format!("{:.3}", row.z),
                format!("{:.4}", row.yaw),
                row.mode.to_owned(),
                row.waypoint.to_string(),
                row.route_len.to_string(),
                format!("{:.3}", row.shade_ahead),
                row.fov_cap_distance.map(|d| format!("{d:.3}")).unwrap_or_default(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.frame.to_string(),
            format!("{:.4}", row.elapsed_secs),
            (row.paused as u8).to_string(),
            format!("{:.3}", row.sun_altitude_deg),
            format!("{:.3}", row.sun_azimuth_deg),
            (row.shade_recomputed as u8).to_string(),
            format!("{:.4}", row.mean_shade),
            row.following.to_string(),
            row.avoiding.to_string(),
            row.blocked.to_string(),
            row.arrived.to_string(),
            row.idle.to_string(),
            row.reroutes.to_string(),
            row.reroute_failures.to_string(),
            row.wander_reroutes.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.frames.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
