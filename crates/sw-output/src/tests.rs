//! Unit tests for sw-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::{CsvWriter, FRAME_HEADERS, SUMMARY_HEADERS};
    use crate::row::{AgentFrameRow, TickSummaryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn frame_row(agent_id: u32, frame: u64, cap: Option<f32>) -> AgentFrameRow {
        AgentFrameRow {
            agent_id,
            frame,
            elapsed_secs:     frame as f64 / 30.0,
            x:                agent_id as f32,
            y:                0.05,
            z:                -2.5,
            yaw:              0.5,
            mode:             "following",
            waypoint:         1,
            route_len:        4,
            shade_ahead:      0.25,
            fov_cap_distance: cap,
        }
    }

    fn summary_row(frame: u64) -> TickSummaryRow {
        TickSummaryRow {
            frame,
            elapsed_secs:     frame as f64 * 0.5,
            paused:           false,
            sun_altitude_deg: 60.0,
            sun_azimuth_deg:  180.0,
            shade_recomputed: true,
            mean_shade:       0.4,
            following:        3,
            avoiding:         1,
            blocked:          0,
            arrived:          0,
            idle:             0,
            reroutes:         1,
            reroute_failures: 0,
            wander_reroutes:  4,
        }
    }

    #[test]
    fn files_created_in_new_directory() {
        let dir = tmp();
        let out = dir.path().join("nested").join("run");
        let _w = CsvWriter::new(&out).unwrap();
        assert!(out.join("agent_frames.csv").exists());
        assert!(out.join("tick_summaries.csv").exists());
    }

    #[test]
    fn headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("agent_frames.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, FRAME_HEADERS);
        assert_eq!(headers[0], "agent_id");
        assert_eq!(headers[2], "elapsed_secs");
        assert_eq!(headers[11], "fov_cap_distance");

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, SUMMARY_HEADERS);
    }

    #[test]
    fn frame_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_frames(&[frame_row(0, 30, None), frame_row(1, 30, Some(4.25))]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("agent_frames.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "0");        // agent_id
        assert_eq!(&rows[0][1], "30");       // frame
        assert_eq!(&rows[0][2], "1.0000");   // elapsed_secs
        assert_eq!(&rows[0][7], "following");
        assert_eq!(&rows[0][11], "");        // no cap
        assert_eq!(&rows[1][3], "1.000");    // x
        assert_eq!(&rows[1][11], "4.250");
    }

    #[test]
    fn summary_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&summary_row(3)).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][1], "1.5000");
        assert_eq!(&rows[0][5], "1");        // shade_recomputed
        assert_eq!(&rows[0][14], "4");       // wander_reroutes
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(test)]
mod observer_tests {
    use glam::Vec3;
    use sw_core::Tick;
    use sw_sim::{SimBuilder, SimConfig, SimObserver};
    use sw_spatial::{GraphParams, RoadGraphBuilder, ShadeAStarRouter};
    use sw_world::OpenSky;

    use crate::{AgentFrameRow, CsvWriter, FrameOutputObserver, OutputError, OutputResult, OutputWriter, TickSummaryRow};

    /// Writer that fails every call.
    struct Broken;

    impl OutputWriter for Broken {
        fn write_frames(&mut self, _rows: &[AgentFrameRow]) -> OutputResult<()> {
            Err(OutputError::Io(std::io::Error::other("disk full")))
        }

        fn write_tick_summary(&mut self, _row: &TickSummaryRow) -> OutputResult<()> {
            Err(OutputError::Io(std::io::Error::other("disk full")))
        }

        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }

    #[test]
    fn sim_output_lands_in_csv() {
        let mut b = RoadGraphBuilder::new(GraphParams::default());
        b.add_segment(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0));
        b.add_segment(Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 20.0));
        let graph = b.build(&OpenSky, Vec3::Y);
        let config = SimConfig { agent_count: 3, output_interval_ticks: 2, ..SimConfig::default() };
        let mut sim = SimBuilder::new(config, graph, OpenSky, ShadeAStarRouter).build().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut obs = FrameOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        sim.run_ticks(5, 1.0 / 30.0, &mut obs).unwrap();
        sim.dispose(&mut obs);
        assert!(obs.take_error().is_none());

        // Snapshots at frames 0, 2, 4.
        let mut rdr = csv::Reader::from_path(dir.path().join("agent_frames.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 9);
        assert!(rows.iter().all(|r| &r[4] == "0.050"));
        // Frame seconds, not the sun clock's timestamp.
        assert!(rows.iter().all(|r| r[2].parse::<f64>().is_ok_and(|t| (0.0..1.0).contains(&t))));

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        assert_eq!(rdr.records().count(), 5);
    }

    #[test]
    fn first_error_is_kept_once() {
        let mut obs = FrameOutputObserver::new(Broken);
        obs.on_snapshot(Tick(0), &[]);
        assert!(obs.take_error().is_none(), "empty snapshot should not touch the writer");

        let mut b = RoadGraphBuilder::new(GraphParams::default());
        b.add_segment(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        let graph = b.build(&OpenSky, Vec3::Y);
        let config = SimConfig { agent_count: 1, ..SimConfig::default() };
        let mut sim = SimBuilder::new(config, graph, OpenSky, ShadeAStarRouter).build().unwrap();
        sim.run_ticks(3, 0.1, &mut obs).unwrap();

        assert!(matches!(obs.take_error(), Some(OutputError::Io(_))));
        assert!(obs.take_error().is_none());
    }
}

#[cfg(test)]
mod geojson_tests {
    use glam::Vec3;
    use sw_core::{GeoPoint, SceneFrame};

    use crate::{route_to_geojson, write_route_geojson};

    #[test]
    fn geographic_route_round_trips_coordinates() {
        let a = GeoPoint::new(47.060, 34.310);
        let b = GeoPoint::new(47.070, 34.318);
        let frame = SceneFrame::from_points(&[a, b], Some(200.0)).unwrap();
        let route = [frame.to_local(a), frame.to_local(b)];

        let feature = route_to_geojson(&route, Some(&frame));
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "LineString");
        let coords = feature["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(coords.len(), 2);
        let lon = coords[1][0].as_f64().unwrap();
        let lat = coords[1][1].as_f64().unwrap();
        assert!((lon - b.lon).abs() < 1e-6);
        assert!((lat - b.lat).abs() < 1e-6);
        assert_eq!(feature["properties"]["geographic"], true);
    }

    #[test]
    fn planar_route_uses_east_north() {
        let route = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(3.0, 0.0, -4.0)];
        let feature = route_to_geojson(&route, None);
        let coords = feature["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(coords[1][0].as_f64(), Some(3.0));
        assert_eq!(coords[1][1].as_f64(), Some(4.0));
        assert_eq!(feature["properties"]["waypoints"], 2);
        assert!((feature["properties"]["scene_length"].as_f64().unwrap() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn written_file_is_a_feature_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.geojson");
        write_route_geojson(&path, &[Vec3::ZERO, Vec3::X], None).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().map(Vec::len), Some(1));
    }
}
