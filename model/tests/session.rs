use anyhow::Result;
use geojson::Feature;
use geom::{Duration, LonLat};
use serde_json::json;

use model::{
    AggregateRow, AggregationService, Config, Key, MapArea, RegionQuery, Session,
    FIRST_DISPLAYED_BUCKET,
};
use tiles::TileID;

struct CannedService {
    queries: Vec<RegionQuery>,
    fail: bool,
}

impl AggregationService for CannedService {
    fn activity_by_region(&mut self, query: &RegionQuery) -> Result<Vec<AggregateRow>> {
        self.queries.push(query.clone());
        if self.fail {
            anyhow::bail!("permission denied for function activity_by_region_and_time_local");
        }
        Ok(serde_json::from_value(json!([
            { "time_int": "2021-01-08T02:00:00Z", "hexid": "871f1d489ffffff", "count": 9 },
            { "time_int": "2021-01-08T00:00:00Z", "hexid": "871f1d489ffffff", "count": 1 },
            { "time_int": "2021-01-08T00:00:00Z", "hexid": "871f1d48affffff", "count": 4 },
            { "time_int": "2021-01-08T01:00:00Z", "hexid": "871f1d48bffffff", "count": 2 },
        ]))?)
    }
}

fn config() -> Config {
    serde_json::from_value(json!({
        "start_time": "2021-01-08T00:00:00Z",
        "end_time": "2021-01-08T03:00:00Z",
        "interval": "1 hour",
        "animation_speed": 600.0,
        "trail_length": 1200.0
    }))
    .unwrap()
}

fn tile() -> Vec<Feature> {
    vec![serde_json::from_value(json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": [[10.14, 54.36], [10.15, 54.37], [10.16, 54.38]]
        },
        "properties": { "times": "[1610064000,1610064600,1610065200]", "trip_id": "211000001" }
    }))
    .unwrap()]
}

fn draw_region(session: &mut Session) {
    assert!(session.toggle_drawing());
    for (lon, lat) in [(10.1, 54.3), (10.2, 54.3), (10.2, 54.4), (10.1, 54.4)] {
        assert!(session.map_drag(LonLat::new(lon, lat)));
    }
}

fn frame() -> Duration {
    Duration::seconds(1.0 / 60.0)
}

fn loaded_session() -> Session {
    let mut session = Session::new(config()).unwrap();
    let id = TileID::new(7, 67, 39);
    session.request_tile(id);
    let content = tile();
    assert_eq!(session.on_tile_load(id, Some(content.as_slice())), 1);
    session
}

#[test]
fn nothing_until_first_tile() {
    let mut session = Session::new(config()).unwrap();
    assert!(session.is_loading());
    assert!(!session.toggle_drawing());
    assert!(!session.on_key(Key::Escape));

    session.on_tile_error(TileID::new(7, 0, 0), &anyhow::anyhow!("404"));
    assert!(!session.is_loading());
    assert!(session.toggle_drawing());
}

#[test]
fn draw_query_replay() {
    let mut session = loaded_session();
    assert!(!session.map_drag(LonLat::new(10.0, 54.0)));

    draw_region(&mut session);
    let mut service = CannedService {
        queries: Vec::new(),
        fail: false,
    };
    session.map_drag_end_with(&mut service);

    assert_eq!(service.queries.len(), 1);
    assert_eq!(service.queries[0].ring().len(), 5);
    assert_eq!(service.queries[0].interval.to_string(), "1 hours");
    assert_eq!(service.queries[0].resolution, 7);

    assert_eq!(session.draw().current_bucket(), Some(FIRST_DISPLAYED_BUCKET));
    assert_eq!(session.visible_rows()[0].hex_id, "871f1d48bffffff");

    // 10 minutes of loop time per frame; the clock is in the first hour
    session.frame(frame());
    assert_eq!(session.clock().time(), 600.0);
    assert_eq!(session.draw().current_bucket(), Some(0));
    assert_eq!(session.visible_rows().len(), 2);
    assert_eq!(session.visible_segments().count(), 1);

    for _ in 0..5 {
        session.frame(frame());
    }
    assert_eq!(session.clock().time(), 3600.0);
    assert_eq!(session.draw().bucket_label().unwrap(), "2021-01-08 01:00:00");

    // Wraps back to the first bucket
    for _ in 0..13 {
        session.frame(frame());
    }
    assert_eq!(session.clock().time(), 600.0);
    assert_eq!(session.draw().current_bucket(), Some(0));

    assert!(session.on_key(Key::Escape));
    assert!(session.draw().is_idle());
    assert!(session.visible_rows().is_empty());
}

#[test]
fn cancel_inhibited_while_querying() {
    let mut session = loaded_session();
    draw_region(&mut session);
    let query = session.map_drag_end().unwrap();
    assert_eq!(query.ring().len(), 5);
    assert!(session.is_loading());
    assert!(!session.on_key(Key::Escape));
    assert!(!session.toggle_drawing());
    assert!(session.draw().is_querying());

    session.on_query_result(Ok(Vec::new()));
    assert!(!session.is_loading());
    assert!(session.on_key(Key::Escape));
}

#[test]
fn failed_query_returns_to_idle() {
    let mut session = loaded_session();
    draw_region(&mut session);
    let mut service = CannedService {
        queries: Vec::new(),
        fail: true,
    };
    session.map_drag_end_with(&mut service);
    assert_eq!(service.queries.len(), 1);
    assert!(session.draw().is_idle());
    assert!(!session.is_loading());
    assert!(session.draw().preview().is_none());
}

#[test]
fn scrubbing_drives_bucket() {
    let mut session = loaded_session();
    draw_region(&mut session);
    let mut service = CannedService {
        queries: Vec::new(),
        fail: false,
    };
    session.map_drag_end_with(&mut service);

    session.timeline_drag_start(0.5);
    assert!(session.is_scrubbing());
    assert_eq!(session.clock().time(), 5400.0);
    assert_eq!(session.timeline_position(), 0.5);
    assert_eq!(session.draw().current_bucket(), Some(1));

    session.timeline_drag(0.9);
    assert_eq!(session.draw().current_bucket(), Some(2));
    assert_eq!(session.visible_rows()[0].count, 9);

    // Held handle: frames don't move the clock
    session.frame(frame());
    assert_eq!(session.clock().time(), 9720.0);

    session.timeline_drag_end();
    assert!(!session.clock().is_paused());
    session.frame(frame());
    assert_eq!(session.clock().time(), 10320.0);

    assert!(session.on_key(Key::Space));
    assert!(session.clock().is_paused());
    let (time, date) = session.timeline_labels();
    assert_eq!(time, "02:52 UTC");
    assert_eq!(date, "(08.01.2021)");
}

#[test]
fn poller_converges_with_frames() {
    let mut session = loaded_session();
    draw_region(&mut session);
    let mut service = CannedService {
        queries: Vec::new(),
        fail: false,
    };
    session.map_drag_end_with(&mut service);

    session.on_key(Key::Space);
    // Paused: only the poller runs, and it lands on the clock's bucket
    session.frame(Duration::seconds(0.5));
    assert_eq!(session.draw().current_bucket(), Some(session.clock().bucket()));
    assert_eq!(session.clock().bucket(), 0);
}

#[test]
fn four_vertices_always_close_a_region() {
    let mut config = serde_json::to_value(config()).unwrap();
    config["min_draw_vertices"] = json!(10);
    let config: Config = serde_json::from_value(config).unwrap();

    let mut session = Session::new(config).unwrap();
    session.on_tile_load(TileID::new(7, 67, 39), None);
    draw_region(&mut session);
    assert!(session.map_drag_end().is_some());
    assert!(session.draw().is_querying());
}

#[test]
fn evicted_tile_stops_drawing() {
    let mut session = loaded_session();
    session.frame(frame());
    assert_eq!(session.visible_segments().count(), 1);

    session.on_tile_evict(TileID::new(7, 67, 39));
    assert_eq!(session.visible_segments().count(), 0);
    assert_eq!(session.tiles().num_tiles(), 0);
    assert!(!session.is_loading());
}

#[test]
fn navigation() {
    let mut session = loaded_session();
    let view = session.go_to(MapArea::Gothenburg);
    assert_eq!(session.current_area(), MapArea::Gothenburg);
    assert_eq!(view.zoom, 14.0);
}
