use std::collections::{BTreeMap, BTreeSet};

use geojson::Feature;

use crate::{Normalizer, TrajectorySegment};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileID {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileID {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// Owns the normalized segments of every loaded tile and the state of the loading indicators.
pub struct TileLayer {
    normalizer: Normalizer,
    segments_per_tile: BTreeMap<TileID, Vec<TrajectorySegment>>,
    pending: BTreeSet<TileID>,
    // Nothing has come back from the transport yet
    awaiting_first_tile: bool,
}

impl TileLayer {
    pub fn new(epoch_origin: i64) -> Self {
        Self {
            normalizer: Normalizer::new(epoch_origin),
            segments_per_tile: BTreeMap::new(),
            pending: BTreeSet::new(),
            awaiting_first_tile: true,
        }
    }

    /// The transport started fetching this tile.
    pub fn request(&mut self, tile: TileID) {
        self.pending.insert(tile);
    }

    /// Normalizes the tile's content, replacing anything previously loaded for the same tile.
    /// This ends the tile's loading lifecycle.
    pub fn on_tile_load(
        &mut self,
        tile: TileID,
        content: Option<&[Feature]>,
    ) -> &[TrajectorySegment] {
        let segments = self.normalizer.normalize_tile(content);
        debug!("{:?} normalized into {} segments", tile, segments.len());
        self.finish(tile);
        self.segments_per_tile.insert(tile, segments);
        &self.segments_per_tile[&tile]
    }

    /// The transport gave up on this tile. No data is kept for it, and nothing is retried here.
    pub fn on_tile_error(&mut self, tile: TileID, err: &anyhow::Error) {
        warn!("Loading {:?} failed: {err}", tile);
        self.finish(tile);
        self.segments_per_tile.remove(&tile);
    }

    /// The transport dropped the tile from its cache.
    pub fn evict(&mut self, tile: TileID) {
        self.pending.remove(&tile);
        self.segments_per_tile.remove(&tile);
    }

    fn finish(&mut self, tile: TileID) {
        self.pending.remove(&tile);
        self.awaiting_first_tile = false;
    }

    /// Should the "loading trips" indicator show?
    pub fn is_loading(&self) -> bool {
        self.awaiting_first_tile || !self.pending.is_empty()
    }

    pub fn awaiting_first_tile(&self) -> bool {
        self.awaiting_first_tile
    }

    pub fn epoch_origin(&self) -> i64 {
        self.normalizer.epoch_origin()
    }

    pub fn segments(&self) -> impl Iterator<Item = &TrajectorySegment> {
        self.segments_per_tile.values().flatten()
    }

    /// The segments with some part of their trail showing at `time`.
    pub fn visible_segments(
        &self,
        time: f64,
        trail_length: f64,
    ) -> impl Iterator<Item = &TrajectorySegment> {
        self.segments()
            .filter(move |segment| segment.is_visible_at(time, trail_length))
    }

    pub fn num_tiles(&self) -> usize {
        self.segments_per_tile.len()
    }
}
