use anyhow::Result;
use geojson::{Geometry, Value};
use geom::LonLat;
use serde::Serialize;

use crate::{AggregateRow, BucketInterval};

/// The payload of one region aggregation request.
#[derive(Clone, Debug, Serialize)]
pub struct RegionQuery {
    /// A closed GeoJSON Polygon
    #[serde(rename = "geojson")]
    pub region: Geometry,
    #[serde(rename = "interval_val")]
    pub interval: BucketInterval,
    #[serde(rename = "resolution_val")]
    pub resolution: u8,
}

impl RegionQuery {
    /// `ring` must already be closed, with the first vertex repeated at the end.
    pub fn new(ring: &[LonLat], interval: BucketInterval, resolution: u8) -> Self {
        Self {
            region: Geometry::new(Value::Polygon(vec![to_positions(ring)])),
            interval,
            resolution,
        }
    }

    pub fn ring(&self) -> Vec<LonLat> {
        match self.region.value {
            Value::Polygon(ref rings) => rings
                .first()
                .map(|ring| ring.iter().map(|pos| LonLat::new(pos[0], pos[1])).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

pub fn to_positions(pts: &[LonLat]) -> Vec<Vec<f64>> {
    pts.iter().map(|pt| vec![pt.x(), pt.y()]).collect()
}

/// The backend computing per-cell, per-bucket activity inside a region.
pub trait AggregationService {
    fn activity_by_region(&mut self, query: &RegionQuery) -> Result<Vec<AggregateRow>>;
}
