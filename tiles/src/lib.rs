//! Turns decoded vector-tile features into timestamped path segments that an animation clock can
//! play back.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod ids;
mod layer;
mod times;

use anyhow::Result;
use geojson::{Feature, Value};
use geom::LonLat;
use serde::Serialize;

pub use ids::{orig, CheapID, IDAllocator, IDMapping, SegmentID, VesselID};
pub use layer::{TileID, TileLayer};
pub use times::{parse_relative, partition};

/// One contiguous path with one timestamp per vertex. Timestamps are seconds since the epoch
/// origin of the playback loop.
#[derive(Clone, Debug, Serialize)]
pub struct TrajectorySegment {
    pub id: SegmentID,
    pub vessel: Option<VesselID>,
    pub path: Vec<LonLat>,
    pub timestamps: Vec<i64>,
}

impl TrajectorySegment {
    pub fn start_time(&self) -> Option<i64> {
        self.timestamps.first().copied()
    }

    pub fn end_time(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }

    /// Does any part of the trail ending at `time` fall on this segment?
    pub fn is_visible_at(&self, time: f64, trail_length: f64) -> bool {
        match (self.start_time(), self.end_time()) {
            (Some(t1), Some(t2)) => t1 as f64 <= time && time - trail_length <= t2 as f64,
            _ => false,
        }
    }
}

/// Converts the features of one tile at a time. Tiles may arrive in any order; each call is
/// independent, except that IDs keep counting up across calls.
pub struct Normalizer {
    epoch_origin: i64,
    segment_ids: IDAllocator,
    vessel_ids: IDMapping<orig::VesselName, VesselID>,
}

impl Normalizer {
    pub fn new(epoch_origin: i64) -> Self {
        Self {
            epoch_origin,
            segment_ids: IDAllocator::new(),
            vessel_ids: IDMapping::new(),
        }
    }

    pub fn epoch_origin(&self) -> i64 {
        self.epoch_origin
    }

    pub fn vessel_ids(&self) -> &IDMapping<orig::VesselName, VesselID> {
        &self.vessel_ids
    }

    /// Missing or empty tile content produces no segments. Individual features that can't be
    /// understood are skipped.
    pub fn normalize_tile(&mut self, content: Option<&[Feature]>) -> Vec<TrajectorySegment> {
        let mut segments = Vec::new();
        for feature in content.unwrap_or(&[]) {
            if let Err(err) = self.normalize_feature(feature, &mut segments) {
                warn!("Skipping tile feature {:?}: {err}", feature.id);
            }
        }
        segments
    }

    fn normalize_feature(
        &mut self,
        feature: &Feature,
        output: &mut Vec<TrajectorySegment>,
    ) -> Result<()> {
        let raw_times = match feature.property("times").and_then(|x| x.as_str()) {
            Some(x) => x,
            None => bail!("no times property"),
        };
        let timestamps = parse_relative(raw_times, self.epoch_origin)?;
        let vessel = vessel_name(feature).map(|name| self.vessel_ids.insert_idempotent(&name));

        let geometry = match feature.geometry {
            Some(ref x) => x,
            None => bail!("no geometry"),
        };
        match geometry.value {
            Value::LineString(ref line) => {
                let path = to_path(line)?;
                if path.len() != timestamps.len() {
                    bail!(
                        "LineString has {} vertices, but {} timestamps",
                        path.len(),
                        timestamps.len()
                    );
                }
                output.push(TrajectorySegment {
                    id: self.segment_ids.next(),
                    vessel,
                    path,
                    timestamps,
                });
            }
            Value::MultiLineString(ref lines) => {
                let mut paths = Vec::new();
                for line in lines {
                    paths.push(to_path(line)?);
                }
                let lengths: Vec<usize> = paths.iter().map(|p| p.len()).collect();
                for (path, timestamps) in paths.into_iter().zip(partition(&timestamps, &lengths)?)
                {
                    output.push(TrajectorySegment {
                        id: self.segment_ids.next(),
                        vessel,
                        path,
                        timestamps,
                    });
                }
            }
            _ => bail!("only LineString and MultiLineString geometry is supported"),
        }
        Ok(())
    }
}

fn to_path(line: &[Vec<f64>]) -> Result<Vec<LonLat>> {
    let mut path = Vec::new();
    for pos in line {
        if pos.len() < 2 || !pos[0].is_finite() || !pos[1].is_finite() {
            bail!("bad position {:?}", pos);
        }
        path.push(LonLat::new(pos[0], pos[1]));
    }
    Ok(path)
}

fn vessel_name(feature: &Feature) -> Option<orig::VesselName> {
    match feature.property("trip_id")? {
        serde_json::Value::String(x) => Some(orig::VesselName(x.clone())),
        serde_json::Value::Number(x) => Some(orig::VesselName(x.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn feature(value: serde_json::Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn line_string() {
        let tile = vec![feature(json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": [[10.1, 54.3], [10.2, 54.35], [10.3, 54.4]]
            },
            "properties": { "times": "[100,101,102]" }
        }))];

        let segments = Normalizer::new(100).normalize_tile(Some(tile.as_slice()));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].timestamps, vec![0, 1, 2]);
        assert_eq!(segments[0].path.len(), 3);
        assert_eq!(segments[0].path[1].x(), 10.2);
        assert_eq!(segments[0].path[1].y(), 54.35);
        assert!(segments[0].vessel.is_none());
    }

    #[test]
    fn multi_line_string_splits_per_line() {
        let tile = vec![feature(json!({
            "type": "Feature",
            "geometry": {
                "type": "MultiLineString",
                "coordinates": [
                    [[10.0, 54.0], [10.1, 54.1]],
                    [[11.0, 55.0], [11.1, 55.1], [11.2, 55.2]]
                ]
            },
            "properties": { "times": "[1000,1010,1020,1030,1040]", "trip_id": 219000123 }
        }))];

        let segments = Normalizer::new(1000).normalize_tile(Some(tile.as_slice()));
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].timestamps.len(), 2);
        assert_eq!(segments[1].timestamps.len(), 3);
        let rejoined: Vec<i64> = segments
            .iter()
            .flat_map(|s| s.timestamps.clone())
            .collect();
        assert_eq!(rejoined, vec![0, 10, 20, 30, 40]);
        assert_ne!(segments[0].id, segments[1].id);
        assert_eq!(segments[0].vessel, segments[1].vessel);
        assert!(segments[0].vessel.is_some());
    }

    #[test]
    fn later_lines_keep_their_own_times() {
        // Three lines, where a cursor that didn't accumulate would hand line 3 the times of line 2
        let tile = vec![feature(json!({
            "type": "Feature",
            "geometry": {
                "type": "MultiLineString",
                "coordinates": [
                    [[0.0, 0.0], [0.1, 0.1], [0.2, 0.2]],
                    [[1.0, 1.0], [1.1, 1.1], [1.2, 1.2]],
                    [[2.0, 2.0], [2.1, 2.1]]
                ]
            },
            "properties": { "times": "[0,1,2,3,4,5,6,7]" }
        }))];

        let segments = Normalizer::new(0).normalize_tile(Some(tile.as_slice()));
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].timestamps, vec![0, 1, 2]);
        assert_eq!(segments[1].timestamps, vec![3, 4, 5]);
        assert_eq!(segments[2].timestamps, vec![6, 7]);
        for segment in &segments {
            assert_eq!(segment.path.len(), segment.timestamps.len());
        }
    }

    #[test]
    fn empty_or_missing_content() {
        let mut normalizer = Normalizer::new(0);
        assert!(normalizer.normalize_tile(None).is_empty());
        assert!(normalizer.normalize_tile(Some(&[][..])).is_empty());
    }

    #[test]
    fn bad_features_are_skipped() {
        let tile = vec![
            // Wrong number of timestamps
            feature(json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": { "times": "[1,2,3]" }
            })),
            // Not a line
            feature(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
                "properties": { "times": "[1]" }
            })),
            // No times at all
            feature(json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": {}
            })),
            // Too far before the origin to be an offset
            feature(json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": { "times": "[-9223372036854775808,6]" }
            })),
            feature(json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": { "times": "[5,6]", "trip_id": "abc" }
            })),
        ];

        let mut normalizer = Normalizer::new(5);
        let segments = normalizer.normalize_tile(Some(tile.as_slice()));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].timestamps, vec![0, 1]);
        assert_eq!(normalizer.vessel_ids().len(), 1);
    }

    #[test]
    fn visibility_window() {
        let segment = TrajectorySegment {
            id: SegmentID(0),
            vessel: None,
            path: vec![LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0)],
            timestamps: vec![100, 200],
        };
        assert!(!segment.is_visible_at(50.0, 1000.0));
        assert!(segment.is_visible_at(150.0, 1000.0));
        assert!(segment.is_visible_at(1100.0, 1000.0));
        assert!(!segment.is_visible_at(1300.0, 1000.0));
    }
}
