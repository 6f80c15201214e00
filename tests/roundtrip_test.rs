use std::collections::BTreeMap;
use std::io::Write;

use gpx_doc::{Gpx, GpxError, Line, Point, Properties, WriteOptions};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---- reading fixtures ----

#[test]
fn test_waypoints_fixture() {
    let gpx = Gpx::from_xml(&load_fixture("waypoints.gpx")).unwrap();
    assert_eq!(gpx.waypoints().count(), 3);

    let home = gpx.waypoint("Home").unwrap();
    assert_eq!(home.lonlat(), ("-120.0", "45.0"));
    assert_eq!(home.properties().get("ele").map(String::as_str), Some("212.4"));
    assert_eq!(home.extensions().get("hr").map(String::as_str), Some("62"));

    let tower = gpx.waypoint("Tokyo Tower").unwrap();
    assert!(tower.extensions().is_empty());

    // The third waypoint has no name; it takes the 0-based insertion index.
    let eiffel = gpx.waypoint("waypoint_2").unwrap();
    assert_eq!(eiffel.lonlat(), ("2.2945", "48.8584"));
}

#[test]
fn test_track_fixture() {
    let gpx = Gpx::from_xml(&load_fixture("track.gpx")).unwrap();
    let track = gpx.track("Morning Run").unwrap();

    assert_eq!(
        track.properties().get("desc").map(String::as_str),
        Some("Two laps around the park")
    );
    assert_eq!(
        track.extensions().get("activity").map(String::as_str),
        Some("running")
    );

    assert_eq!(track.segments().len(), 2);
    for seg in track.segments() {
        assert_eq!(seg.points().len(), 3);
    }
    assert_eq!(
        track.segments()[0].properties().get("src").map(String::as_str),
        Some("watch")
    );
    assert_eq!(
        track.segments()[0].points()[1].properties().get("time").map(String::as_str),
        Some("2025-01-01T00:01:00Z")
    );
    assert_eq!(track.segments()[1].points()[2].lon(), "140.002");
}

#[test]
fn test_route_fixture() {
    let gpx = Gpx::from_xml(&load_fixture("route.gpx")).unwrap();
    let route = gpx.route("Scenic Drive").unwrap();
    assert_eq!(route.points().len(), 2);
    assert_eq!(route.points()[0].name(), Some("San Francisco"));
    assert_eq!(route.points()[1].lonlat(), ("-118.2437", "34.0522"));
}

#[test]
fn test_empty_fixture_parses_to_empty_store() {
    let gpx = Gpx::from_xml(&load_fixture("empty.gpx")).unwrap();
    assert!(gpx.is_empty());
}

#[test]
fn test_missing_lat_fixture_aborts() {
    let err = Gpx::from_xml(&load_fixture("missing_lat.gpx")).unwrap_err();
    assert!(matches!(
        err,
        GpxError::MissingCoordinate {
            element: "wpt",
            attribute: "lat",
        }
    ));
}

// ---- round trips ----

fn sample_store() -> Gpx {
    let mut gpx = Gpx::new();

    gpx.add_waypoint(Point::new("2.2945", "48.8584"));
    gpx.add_waypoint(Point::with_fields(
        "-120.0",
        "45.0",
        props(&[("name", "Home"), ("ele", "212.4")]),
        props(&[("hr", "62")]),
    ));

    gpx.add_track(
        &[
            Line::with_fields(
                vec![(139.0, 35.0), (139.5, 35.5)],
                BTreeMap::from([(
                    "ele".to_string(),
                    vec!["10".to_string(), "11".to_string()],
                )]),
                props(&[("src", "watch")]),
            ),
            Line::new(vec![(140.0, 36.0)]),
        ],
        props(&[("name", "Morning Run")]),
        props(&[("activity", "running")]),
    );

    gpx.add_route(&Line::with_fields(
        vec![(-122.4194, 37.7749), (-118.2437, 34.0522)],
        BTreeMap::new(),
        props(&[("name", "Scenic Drive")]),
    ));

    gpx
}

#[test]
fn test_write_then_read_reproduces_store() {
    let gpx = sample_store();
    let xml = gpx.to_xml_string(&WriteOptions::default()).unwrap();
    let reparsed = Gpx::from_xml(&xml).unwrap();
    assert_eq!(gpx, reparsed);
}

#[test]
fn test_round_trip_through_file() {
    let gpx = sample_store();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gpx");
    gpx.write_to_file(&path, &WriteOptions::default()).unwrap();

    let reparsed = Gpx::from_file(&path).unwrap();
    assert_eq!(gpx, reparsed);
}

#[test]
fn test_fixture_survives_round_trip() {
    let original = Gpx::from_xml(&load_fixture("track.gpx")).unwrap();
    let xml = original.to_xml_string(&WriteOptions::default()).unwrap();
    let reparsed = Gpx::from_xml(&xml).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_from_reader_stream() {
    let mut file = tempfile::NamedTempFile::with_suffix(".gpx").unwrap();
    file.write_all(load_fixture("waypoints.gpx").as_bytes()).unwrap();
    file.flush().unwrap();

    let gpx = Gpx::from_reader(file.reopen().unwrap()).unwrap();
    assert_eq!(gpx.waypoints().count(), 3);
}

// ---- writing ----

#[test]
fn test_empty_store_output_has_no_entries() {
    let xml = Gpx::new().to_xml_string(&WriteOptions::default()).unwrap();
    assert!(xml.contains(r#"version="1.1""#));
    assert!(xml.contains(r#"creator="gpx-doc""#));
    assert!(!xml.contains("<wpt"));
    assert!(!xml.contains("<trk"));
    assert!(!xml.contains("<rte"));
}

#[test]
fn test_write_order_is_waypoints_tracks_routes() {
    let xml = sample_store().to_xml_string(&WriteOptions::default()).unwrap();
    let wpt = xml.find("<wpt").unwrap();
    let trk = xml.find("<trk>").unwrap();
    let rte = xml.find("<rte>").unwrap();
    assert!(wpt < trk);
    assert!(trk < rte);
}

#[test]
fn test_write_options_deserialize_with_defaults() {
    let opts: WriteOptions = serde_json::from_str(r#"{"waypoints": false}"#).unwrap();
    assert!(!opts.waypoints);
    assert!(opts.tracks);
    assert!(opts.routes);

    let xml = sample_store().to_xml_string(&opts).unwrap();
    assert!(!xml.contains("<wpt"));
    assert!(xml.contains("<trk>"));
    assert!(xml.contains("<rte>"));
}

#[test]
fn test_write_to_unwritable_destination_is_io_error() {
    let gpx = Gpx::new();
    let err = gpx
        .write_to_file("/nonexistent-dir/out.gpx", &WriteOptions::default())
        .unwrap_err();
    assert!(matches!(err, GpxError::Io(_)));
}
