#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod aggregate;
mod clock;
mod config;
mod frame;
mod interval;
mod query;
mod region;
mod scrub;
mod session;
mod views;

pub use self::aggregate::{AggregateRow, RegionAggregate};
pub use self::clock::{ClockUpdate, PlaybackClock};
pub use self::config::Config;
pub use self::frame::{BucketPoller, FrameGuard, FrameLoop};
pub use self::interval::{bucket_for, BucketIndexer, BucketInterval, IntervalUnit};
pub use self::query::{AggregationService, RegionQuery};
pub use self::region::{DrawController, DrawState, FIRST_DISPLAYED_BUCKET, MIN_DRAW_VERTICES};
pub use self::scrub::{
    clock_label, date_label, datetime_at, offset_to_time, pointer_offset, Scrubber,
};
pub use self::session::{Key, Session};
pub use self::views::{all_landmarks, ease_in_out, Landmark, LandmarkKind, MapArea, ViewState};
