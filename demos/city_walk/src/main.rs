//! city_walk: shade-aware pedestrians walking a city block.
//!
//! Setup runs sequentially before the first frame: roads (or the built-in
//! fallback road), buildings (or a placeholder block), then the shade-scored
//! road graph.  The fixed-step loop then drives the simulation for
//! `--seconds` at `--fps` and disposes it.

mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use glam::Vec3;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use sw_core::{SceneFrame, Tick};
use sw_output::{CsvWriter, FrameOutputObserver, OutputWriter, write_route_geojson};
use sw_sim::{AgentFrame, SimBuilder, SimConfig, SimObserver, SimResult, TickSummary};
use sw_solar::SunPosition;
use sw_spatial::{RoadGraph, ShadeAStarRouter, ShadePreference, load_roads_or_fallback};
use sw_world::{BuildingParams, VegetationParams, load_buildings_or_placeholder, load_vegetation};

use cli::Args;

// ── Observer ──────────────────────────────────────────────────────────────────

/// Keeps run totals and forwards to the CSV observer when `--out` is given.
struct RunObserver<W: OutputWriter> {
    output:          Option<FrameOutputObserver<W>>,
    last:            Option<TickSummary>,
    reroutes:        usize,
    wander_reroutes: usize,
    shade_passes:    usize,
    snapshot_rows:   usize,
}

impl<W: OutputWriter> RunObserver<W> {
    fn new(output: Option<FrameOutputObserver<W>>) -> Self {
        Self { output, last: None, reroutes: 0, wander_reroutes: 0, shade_passes: 0, snapshot_rows: 0 }
    }
}

impl<W: OutputWriter> SimObserver for RunObserver<W> {
    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.reroutes += summary.reroutes;
        self.wander_reroutes += summary.wander_reroutes;
        self.shade_passes += usize::from(summary.shade_recomputed);
        self.last = Some(*summary);
        if let Some(out) = self.output.as_mut() {
            out.on_tick_end(summary);
        }
    }

    fn on_snapshot(&mut self, tick: Tick, frames: &[AgentFrame]) {
        self.snapshot_rows += frames.len();
        if let Some(out) = self.output.as_mut() {
            out.on_snapshot(tick, frames);
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        if let Some(out) = self.output.as_mut() {
            out.on_sim_end(final_tick);
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimConfig::default(),
    };

    if let Some(n) = args.agents {
        config.agent_count = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(time) = &args.time {
        config.start_time = time.clone();
    }
    if let Some(scale) = args.time_scale {
        config.time_scale = scale;
    }
    if let Some(lat) = args.lat {
        config.latitude = lat;
    }
    if let Some(lon) = args.lon {
        config.longitude = lon;
    }
    if let Some(bias) = args.shade_bias {
        config.shade_bias = bias;
    }
    if let Some(temp) = args.temperature_c {
        config.shade_bias = ShadePreference::default().bias_for_temperature(temp);
        info!(temperature_c = temp, shade_bias = config.shade_bias, "shade bias from temperature");
    }
    if let Some(m) = args.speed_multiplier {
        config.speed_multiplier = m;
    }
    if args.no_auto_reroute {
        config.auto_reroute = false;
    }
    config.validate()?;
    Ok(config)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    if !(args.fps > 0.0 && args.fps.is_finite()) || !(args.seconds >= 0.0) {
        bail!("--fps must be positive and --seconds non-negative");
    }
    let config = load_config(&args)?;

    // 1. Roads.
    let started = Instant::now();
    let roads = load_roads_or_fallback(args.roads.as_deref(), args.fit_span);
    let frame = roads.frame;

    // 2. Buildings and tree canopy, in the road layer's frame.
    let mut world = load_buildings_or_placeholder(args.buildings.as_deref(), frame.as_ref(), &BuildingParams::default());
    load_vegetation(&mut world, args.vegetation.as_deref(), frame.as_ref(), &VegetationParams::default());

    // 3. Graph, scored for the start sun.
    let sun = SunPosition::from_iso(config.latitude, config.longitude, &config.start_time);
    let graph = RoadGraph::from_curves(&roads.walkable, config.graph, &world, sun.direction);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        blocked_curves = roads.blocked.len(),
        obstacles = world.obstacle_count(),
        canopies = world.canopy_count(),
        mean_shade = graph.mean_shade(),
        setup_ms = started.elapsed().as_millis() as u64,
        "scene ready"
    );

    // 4. Simulation.
    let fps = args.fps;
    let ticks = (args.seconds * fps).round() as u64;
    let mut sim = SimBuilder::new(config, graph, world, ShadeAStarRouter).build()?;
    println!("=== city_walk: shadewalk ===");
    println!(
        "Agents: {}  |  Frames: {ticks} @ {fps} fps  |  Sun: {}",
        sim.agents.len(),
        sim.clock
    );

    if let (Some(from), Some(to)) = (args.preview_from, args.preview_to) {
        if let Some(path) = preview(sim.preview_route(from, to), frame.as_ref(), args.out.as_deref())? {
            println!("Route preview     {}", path.display());
        }
    }

    let output = match &args.out {
        Some(dir) => Some(FrameOutputObserver::new(
            CsvWriter::new(dir).with_context(|| format!("opening output in {}", dir.display()))?,
        )),
        None => None,
    };
    let mut observer = RunObserver::new(output);

    // 5. Fixed-step loop.
    let dt = 1.0 / fps;
    let loop_started = Instant::now();
    let report_every = (fps.round() as u64).max(1) * 10;
    for i in 0..ticks {
        let summary = sim.tick(dt, &mut observer)?;
        if i > 0 && i.is_multiple_of(report_every) {
            info!(
                tick = summary.tick.0,
                following = summary.following,
                avoiding = summary.avoiding,
                blocked = summary.blocked,
                arrived = summary.arrived,
                mean_shade = summary.mean_shade,
                "progress"
            );
        }
    }
    let wall = loop_started.elapsed();

    // 6. Teardown.
    let final_tick = sim.dispose(&mut observer);
    if let Some(err) = observer.output.as_mut().and_then(FrameOutputObserver::take_error) {
        bail!("writing output failed: {err}");
    }

    println!();
    println!("Frames run:       {}", final_tick.0);
    println!("Wall time:        {:.2} s", wall.as_secs_f64());
    println!("Steering reroutes {}", observer.reroutes);
    println!("Wander reroutes   {}", observer.wander_reroutes);
    println!("Shade passes      {}", observer.shade_passes);
    if let Some(last) = observer.last {
        println!(
            "Final modes       following {} | avoiding {} | blocked {} | arrived {} | idle {}",
            last.following, last.avoiding, last.blocked, last.arrived, last.idle
        );
        println!(
            "Sun               alt {:.1}° az {:.1}°{}",
            last.sun.altitude_deg,
            last.sun.azimuth_deg,
            if last.sun.fallback { " (fallback)" } else { "" }
        );
    }
    if let Some(dir) = &args.out {
        println!("Output            {} ({} frame rows)", dir.display(), observer.snapshot_rows);
    }
    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

/// Write a route preview into `out`.  A route that could not be found is
/// logged and skipped; only a failed write is an error.
fn preview(route: SimResult<Vec<Vec3>>, frame: Option<&SceneFrame>, out: Option<&Path>) -> Result<Option<PathBuf>> {
    let route = match route {
        Ok(route) => route,
        Err(e) => {
            warn!(error = %e, "no route preview, continuing");
            return Ok(None);
        }
    };
    let length: f32 = route.windows(2).map(|w| w[0].distance(w[1])).sum();
    info!(waypoints = route.len(), length, "route preview");
    let Some(dir) = out else {
        warn!("no --out directory, route preview not written");
        return Ok(None);
    };
    fs::create_dir_all(dir)?;
    let path = dir.join("route_preview.geojson");
    write_route_geojson(&path, &route, frame)?;
    Ok(Some(path))
}
