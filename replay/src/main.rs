#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod service;

use abstutil::prettyprint_usize;
use anyhow::Result;
use geojson::{GeoJson, Value};
use geom::{Duration, LonLat};
use structopt::StructOpt;

use model::{Config, FrameLoop, MapArea, Session};
use tiles::TileID;

use self::service::FileAggregationService;

#[derive(StructOpt)]
struct Args {
    /// A JSON config file. Anything missing uses the defaults.
    #[structopt(long)]
    config: Option<String>,
    /// GeoJSON FeatureCollection files, each one standing in for a vector tile
    #[structopt(long)]
    tiles: Vec<String>,
    /// A GeoJSON Polygon to trace, as if drawn on the map
    #[structopt(long)]
    region: Option<String>,
    /// A JSON array of rows to answer the region query with
    #[structopt(long)]
    aggregate: Option<String>,
    /// How many animation frames to play
    #[structopt(long, default_value = "600")]
    frames: usize,
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_args();
    let config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut session = Session::new(config)?;

    let area = MapArea::KielCanal;
    let view = session.go_to(area);
    info!("Camera moves to {}: {:?}", area.describe(), view);

    load_tiles(&mut session, &args.tiles);
    info!(
        "{} segments loaded from {} tiles",
        prettyprint_usize(session.tiles().segments().count()),
        session.tiles().num_tiles()
    );

    if let Some(ref path) = args.region {
        let mut service = FileAggregationService::new(args.aggregate.clone());
        draw_region(&mut session, path, &mut service)?;
    }

    play(&mut session, args.frames);
    Ok(())
}

// Each file is one tile. A file that can't be read or parsed is a failed tile fetch.
fn load_tiles(session: &mut Session, paths: &[String]) {
    for (idx, path) in paths.iter().enumerate() {
        let tile = TileID::new(0, idx as u32, 0);
        session.request_tile(tile);
        match read_features(path) {
            Ok(features) => {
                let n = session.on_tile_load(tile, Some(features.as_slice()));
                info!("{path}: {n} segments");
            }
            Err(err) => session.on_tile_error(tile, &err),
        }
    }
}

fn read_features(path: &str) -> Result<Vec<geojson::Feature>> {
    let raw = fs_err::read_to_string(path)?;
    match raw.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Feature(f) => Ok(vec![f]),
        GeoJson::Geometry(_) => bail!("{path} is a bare geometry, not features"),
    }
}

fn draw_region(
    session: &mut Session,
    path: &str,
    service: &mut FileAggregationService,
) -> Result<()> {
    let mut vertices = read_ring(path)?;
    // The drawing closes the ring itself
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    if !session.toggle_drawing() {
        bail!("Can't start drawing right now");
    }
    for pt in vertices {
        session.map_drag(pt);
    }
    session.map_drag_end_with(service);

    match session.draw().aggregate() {
        Some(aggregate) => info!(
            "Region has {} buckets; max count per hex is {}",
            aggregate.len(),
            aggregate.max_count()
        ),
        None => warn!("Nothing to show for {path}"),
    }
    Ok(())
}

fn read_ring(path: &str) -> Result<Vec<LonLat>> {
    let raw = fs_err::read_to_string(path)?;
    let geometry = match raw.parse::<GeoJson>()? {
        GeoJson::Geometry(g) => g,
        GeoJson::Feature(f) => match f.geometry {
            Some(g) => g,
            None => bail!("{path} has no geometry"),
        },
        GeoJson::FeatureCollection(_) => bail!("{path} should hold one polygon"),
    };
    let ring = match geometry.value {
        Value::Polygon(mut rings) if !rings.is_empty() => rings.remove(0),
        _ => bail!("{path} isn't a Polygon"),
    };
    let mut pts = Vec::new();
    for pos in ring {
        if pos.len() < 2 {
            bail!("{path} has a bad position {:?}", pos);
        }
        pts.push(LonLat::new(pos[0], pos[1]));
    }
    Ok(pts)
}

fn play(session: &mut Session, num_frames: usize) {
    let frame_dt = Duration::seconds(1.0 / 60.0);
    let mut frames = FrameLoop::new();
    let guard = frames.start();

    let mut last_label = None;
    let mut count = 0;
    while frames.is_running() && count < num_frames {
        session.frame(frame_dt);
        count += 1;

        let label = session.draw().bucket_label();
        if label.is_some() && label != last_label {
            let (time, _) = session.timeline_labels();
            info!(
                "At {time}, showing {} hexes for {}",
                session.visible_rows().len(),
                label.as_deref().unwrap_or("")
            );
            last_label = label;
        }
    }
    guard.stop();

    let (time, date) = session.timeline_labels();
    info!(
        "Stopped after {} frames at {time} {date} ({:.0}% through the loop), {} trails visible",
        prettyprint_usize(count),
        session.timeline_position() * 100.0,
        session.visible_segments().count()
    );
}
