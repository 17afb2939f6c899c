//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;

/// `city_walk` - shade-seeking pedestrians on a GeoJSON road network.
///
/// Loads roads and building footprints (falling back to a built-in road and a
/// placeholder block), builds the shade-scored road graph, and runs a
/// fixed-step simulation.  Every flag overrides the matching field of the
/// JSON config file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Road network GeoJSON (LineString / MultiLineString features).
    #[arg(long, env = "SHADEWALK_ROADS")]
    pub roads: Option<PathBuf>,

    /// Building footprint GeoJSON (Polygon / MultiPolygon features).
    #[arg(long, env = "SHADEWALK_BUILDINGS")]
    pub buildings: Option<PathBuf>,

    /// Tree and vegetation polygons (GeoJSON); canopy shades roads but
    /// never blocks walkers.
    #[arg(long, env = "SHADEWALK_VEGETATION")]
    pub vegetation: Option<PathBuf>,

    /// JSON file with `SimConfig` fields; missing fields keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub agents: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulated run length in frame seconds.
    #[arg(long, default_value_t = 60.0)]
    pub seconds: f32,

    /// Fixed frame rate of the step loop.
    #[arg(long, default_value_t = 30.0)]
    pub fps: f32,

    /// ISO-8601 sun time, e.g. `2024-06-21T09:30:00Z`.
    #[arg(long)]
    pub time: Option<String>,

    /// Simulated seconds per frame second for the sun clock.
    #[arg(long)]
    pub time_scale: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Router shade weight in `[0, 1]`.
    #[arg(long)]
    pub shade_bias: Option<f32>,

    /// Derive the shade weight from air temperature (°C) instead.
    #[arg(long, allow_hyphen_values = true, conflicts_with = "shade_bias")]
    pub temperature_c: Option<f32>,

    #[arg(long)]
    pub speed_multiplier: Option<f32>,

    #[arg(long)]
    pub no_auto_reroute: bool,

    /// Fit the road layer into a square of this many scene units (default:
    /// keep metres).
    #[arg(long)]
    pub fit_span: Option<f32>,

    /// Directory for `agent_frames.csv` and `tick_summaries.csv`.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Route preview start as scene `x,z`.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "preview_to")]
    pub preview_from: Option<Vec3>,

    /// Route preview goal as scene `x,z`.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "preview_from")]
    pub preview_to: Option<Vec3>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Parse `x,z` into a ground-plane point.
pub fn parse_point(s: &str) -> Result<Vec3, String> {
    let (x, z) = s.split_once(',').ok_or_else(|| format!("expected `x,z`, got `{s}`"))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("bad coordinate `{v}`: {e}"));
    Ok(Vec3::new(parse(x)?, 0.0, parse(z)?))
}
