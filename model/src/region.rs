use anyhow::Result;
use geojson::{Geometry, Value};
use geom::LonLat;

use crate::query::to_positions;
use crate::{AggregateRow, BucketInterval, ClockUpdate, RegionAggregate, RegionQuery};

/// After a successful query, start on the second bucket. The first one is often a partial,
/// nearly empty bin.
pub const FIRST_DISPLAYED_BUCKET: usize = 1;

/// A drag needs strictly more than 3 samples to count as a region.
pub const MIN_DRAW_VERTICES: usize = 4;

pub enum DrawState {
    Idle,
    /// Every drag sample, in order
    Drawing { vertices: Vec<LonLat> },
    /// Exactly one request is in flight
    Querying { query: RegionQuery },
    Displaying {
        aggregate: RegionAggregate,
        bucket: usize,
        // Sequence number of the last clock update applied
        last_seq: u64,
    },
}

impl DrawState {
    pub fn name(&self) -> &'static str {
        match self {
            DrawState::Idle => "idle",
            DrawState::Drawing { .. } => "drawing",
            DrawState::Querying { .. } => "querying",
            DrawState::Displaying { .. } => "displaying",
        }
    }
}

/// Turns a pointer drag into a closed polygon, issues one aggregation query for it, and then
/// tracks which time bucket of the answer is showing.
pub struct DrawController {
    state: DrawState,
    interval: BucketInterval,
    resolution: u8,
}

impl DrawController {
    pub fn new(interval: BucketInterval, resolution: u8) -> Self {
        Self {
            state: DrawState::Idle,
            interval,
            resolution,
        }
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    /// The draw button. Starts drawing from idle, and otherwise goes back to idle, dropping any
    /// displayed aggregate. Refused while a query is in flight. Returns false if nothing changed.
    pub fn toggle_drawing(&mut self) -> bool {
        match self.state {
            DrawState::Idle => {
                info!("Started drawing a region");
                self.state = DrawState::Drawing {
                    vertices: Vec::new(),
                };
                true
            }
            DrawState::Drawing { .. } | DrawState::Displaying { .. } => self.clear(),
            DrawState::Querying { .. } => false,
        }
    }

    /// Appends one vertex per drag sample while drawing. No deduplication.
    pub fn drag(&mut self, pt: LonLat) -> bool {
        if let DrawState::Drawing { ref mut vertices } = self.state {
            vertices.push(pt);
            true
        } else {
            false
        }
    }

    /// Closes the polygon and returns the query to send, if the drag was long enough. A shorter
    /// drag is discarded and the controller goes back to idle.
    pub fn drag_end(&mut self) -> Option<RegionQuery> {
        let vertices = match self.state {
            DrawState::Drawing { ref mut vertices } => std::mem::take(vertices),
            _ => return None,
        };
        if vertices.len() < MIN_DRAW_VERTICES {
            debug!("Discarding a drag with only {} vertices", vertices.len());
            self.state = DrawState::Idle;
            return None;
        }

        let mut ring = vertices;
        ring.push(ring[0]);
        let query = RegionQuery::new(&ring, self.interval, self.resolution);
        info!(
            "Querying activity in a {}-vertex region, every {}, at resolution {}",
            ring.len(),
            self.interval,
            self.resolution
        );
        self.state = DrawState::Querying {
            query: query.clone(),
        };
        Some(query)
    }

    /// Handles the response to the in-flight query. A failure is logged and nothing is shown.
    pub fn on_query_result(&mut self, result: Result<Vec<AggregateRow>>) {
        if !self.is_querying() {
            warn!(
                "Got a query response while {}; ignoring it",
                self.state.name()
            );
            return;
        }
        match result {
            Ok(rows) => {
                let aggregate = RegionAggregate::from_rows(rows);
                info!(
                    "Region query returned {} rows over {} buckets",
                    aggregate.num_rows(),
                    aggregate.len()
                );
                self.state = DrawState::Displaying {
                    aggregate,
                    bucket: FIRST_DISPLAYED_BUCKET,
                    last_seq: 0,
                };
            }
            Err(err) => {
                error!("Region query failed: {err}");
                self.state = DrawState::Idle;
            }
        }
    }

    /// The cancel key. Leaves drawing or displaying; does nothing while a query is in flight.
    pub fn cancel(&mut self) -> bool {
        self.clear()
    }

    /// Drops the vertices or displayed aggregate. Refused while a query is in flight.
    pub fn clear(&mut self) -> bool {
        match self.state {
            DrawState::Idle | DrawState::Querying { .. } => false,
            DrawState::Drawing { .. } | DrawState::Displaying { .. } => {
                info!("Cleared the region ({})", self.state.name());
                self.state = DrawState::Idle;
                true
            }
        }
    }

    /// Follows the playback clock. Updates older than one already applied are ignored.
    pub fn sync_bucket(&mut self, update: ClockUpdate) {
        if let DrawState::Displaying {
            ref mut bucket,
            ref mut last_seq,
            ..
        } = self.state
        {
            if update.seq < *last_seq {
                return;
            }
            *last_seq = update.seq;
            *bucket = update.bucket;
        }
    }

    pub fn aggregate(&self) -> Option<&RegionAggregate> {
        match self.state {
            DrawState::Displaying { ref aggregate, .. } => Some(aggregate),
            _ => None,
        }
    }

    pub fn current_bucket(&self) -> Option<usize> {
        match self.state {
            DrawState::Displaying { bucket, .. } => Some(bucket),
            _ => None,
        }
    }

    /// The rows of the currently displayed bucket, for hex rendering.
    pub fn visible_rows(&self) -> &[AggregateRow] {
        match self.state {
            DrawState::Displaying {
                ref aggregate,
                bucket,
                ..
            } => aggregate.rows_for(bucket),
            _ => &[],
        }
    }

    pub fn bucket_label(&self) -> Option<String> {
        match self.state {
            DrawState::Displaying {
                ref aggregate,
                bucket,
                ..
            } => aggregate.label_for(bucket),
            _ => None,
        }
    }

    /// What the polygon preview should draw: the open outline while drawing, and the closed
    /// region while waiting for the answer.
    pub fn preview(&self) -> Option<Geometry> {
        match self.state {
            DrawState::Drawing { ref vertices } if !vertices.is_empty() => Some(Geometry::new(
                Value::LineString(to_positions(vertices)),
            )),
            DrawState::Querying { ref query } => Some(query.region.clone()),
            _ => None,
        }
    }

    /// While drawing, drags trace the region instead of panning the map.
    pub fn captures_drag(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    pub fn is_querying(&self) -> bool {
        matches!(self.state, DrawState::Querying { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DrawState::Idle)
    }

    pub fn vertices(&self) -> &[LonLat] {
        match self.state {
            DrawState::Drawing { ref vertices } => vertices.as_slice(),
            _ => &[],
        }
    }
}
