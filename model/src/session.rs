use anyhow::Result;
use geojson::Feature;
use geom::{Duration, LonLat};
use tiles::{TileID, TileLayer, TrajectorySegment};

use crate::scrub::{clock_label, date_label};
use crate::{
    AggregateRow, AggregationService, BucketPoller, ClockUpdate, Config, DrawController,
    MapArea, PlaybackClock, RegionQuery, Scrubber, ViewState,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Cancels drawing or clears the displayed region
    Escape,
    /// Pauses or resumes playback
    Space,
}

/// Everything the map and timeline share: the one playback clock, the region workflow, and the
/// loaded trajectory tiles. User input and collaborator callbacks come in through here.
pub struct Session {
    config: Config,
    clock: PlaybackClock,
    draw: DrawController,
    scrubber: Scrubber,
    tiles: TileLayer,
    poller: BucketPoller,
    area: MapArea,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let clock = PlaybackClock::new(config.bucket_indexer()?, config.animation_speed);
        let draw = DrawController::new(config.interval, config.resolution);
        let tiles = TileLayer::new(config.epoch_origin());
        let poller = BucketPoller::new(config.poll_period());
        Ok(Self {
            config,
            clock,
            draw,
            scrubber: Scrubber::new(),
            tiles,
            poller,
            area: MapArea::KielCanal,
        })
    }

    /// One animation frame, after `real_dt` of wall time. Advances the clock and keeps the
    /// displayed bucket in step with it.
    pub fn frame(&mut self, real_dt: Duration) {
        if let Some(update) = self.clock.tick() {
            self.apply(update);
        }
        if self.poller.advance(real_dt) {
            self.poll_bucket();
        }
    }

    /// Resamples the bucket from the clock as it is right now.
    pub fn poll_bucket(&mut self) {
        let current = self.clock.current();
        self.apply(current);
    }

    fn apply(&mut self, update: ClockUpdate) {
        self.draw.sync_bucket(update);
    }

    /// True before the first tile arrives and while a region query is in flight.
    pub fn is_loading(&self) -> bool {
        self.tiles.awaiting_first_tile() || self.draw.is_querying()
    }

    pub fn on_key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => self.cancel(),
            Key::Space => {
                self.scrubber.toggle_pause(&mut self.clock);
                true
            }
        }
    }

    /// Inhibited while loading, so nothing gets cancelled halfway.
    pub fn cancel(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.draw.cancel()
    }

    /// The draw button. Unavailable while loading.
    pub fn toggle_drawing(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.draw.toggle_drawing()
    }

    /// Returns false if the drag wasn't used for drawing, and the camera should pan instead.
    pub fn map_drag(&mut self, pt: LonLat) -> bool {
        self.draw.drag(pt)
    }

    /// Ends a map drag. If this closed a region, the query to send is returned, and
    /// `on_query_result` must be called with the answer.
    pub fn map_drag_end(&mut self) -> Option<RegionQuery> {
        self.draw.drag_end()
    }

    pub fn on_query_result(&mut self, result: Result<Vec<AggregateRow>>) {
        self.draw.on_query_result(result);
        if self.draw.aggregate().is_some() {
            debug!(
                "Displaying bucket {:?} until the clock says otherwise",
                self.draw.current_bucket()
            );
        }
    }

    /// Ends a map drag and, if a region was closed, answers it with `service` right away.
    pub fn map_drag_end_with(&mut self, service: &mut dyn AggregationService) {
        if let Some(query) = self.map_drag_end() {
            let result = service.activity_by_region(&query);
            self.on_query_result(result);
        }
    }

    pub fn timeline_drag_start(&mut self, offset: f64) {
        let update = self.scrubber.drag_start(&mut self.clock, offset);
        self.apply(update);
    }

    pub fn timeline_drag(&mut self, offset: f64) {
        if let Some(update) = self.scrubber.drag_move(&mut self.clock, offset) {
            self.apply(update);
        }
    }

    pub fn timeline_drag_end(&mut self) {
        self.scrubber.drag_end(&mut self.clock);
    }

    pub fn request_tile(&mut self, tile: TileID) {
        self.tiles.request(tile);
    }

    pub fn on_tile_load(&mut self, tile: TileID, content: Option<&[Feature]>) -> usize {
        self.tiles.on_tile_load(tile, content).len()
    }

    pub fn on_tile_error(&mut self, tile: TileID, err: &anyhow::Error) {
        self.tiles.on_tile_error(tile, err);
    }

    /// The tile left the transport's cache; its trails stop being drawn.
    pub fn on_tile_evict(&mut self, tile: TileID) {
        self.tiles.evict(tile);
    }

    /// Records the area and returns the view the camera should move to.
    pub fn go_to(&mut self, area: MapArea) -> ViewState {
        self.area = area;
        area.view_state()
    }

    pub fn current_area(&self) -> MapArea {
        self.area
    }

    /// The trails the renderer should draw at the current time.
    pub fn visible_segments(&self) -> impl Iterator<Item = &TrajectorySegment> {
        self.tiles
            .visible_segments(self.clock.time(), self.config.trail_length)
    }

    /// The hex rows for the current bucket.
    pub fn visible_rows(&self) -> &[AggregateRow] {
        self.draw.visible_rows()
    }

    /// (time of day, date) for the timeline
    pub fn timeline_labels(&self) -> (String, String) {
        let time = self.clock.time();
        (
            clock_label(self.config.start_time, time),
            date_label(self.config.start_time, time),
        )
    }

    /// Where the timeline handle sits, from 0 to 1
    pub fn timeline_position(&self) -> f64 {
        self.clock.percent()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.clock.set_speed(speed);
    }

    pub fn draw(&self) -> &DrawController {
        &self.draw
    }

    pub fn tiles(&self) -> &TileLayer {
        &self.tiles
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubber.is_dragging()
    }
}
