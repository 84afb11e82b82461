use crate::BucketIndexer;

/// The result of moving the clock. Sequence numbers strictly increase with every tick or seek, so
/// a consumer can tell a stale update from a fresh one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockUpdate {
    pub seq: u64,
    pub time: f64,
    pub bucket: usize,
}

/// The single authoritative playback time. It loops over `[0, loop_length)`, and only its own
/// methods change it.
pub struct PlaybackClock {
    time: f64,
    paused: bool,
    // Loop seconds per animation frame
    speed: f64,
    indexer: BucketIndexer,
    seq: u64,
}

impl PlaybackClock {
    pub fn new(indexer: BucketIndexer, speed: f64) -> Self {
        Self {
            time: 0.0,
            paused: false,
            speed: sanitize_speed(speed),
            indexer,
            seq: 0,
        }
    }

    /// Advances by one frame of `speed`, as last set by `set_speed`.
    pub fn tick(&mut self) -> Option<ClockUpdate> {
        self.tick_by(self.speed)
    }

    /// Advances by `delta` seconds of loop time, unless paused. Wrapping past the end of the loop
    /// is silent.
    pub fn tick_by(&mut self, delta: f64) -> Option<ClockUpdate> {
        if self.paused {
            return None;
        }
        if !delta.is_finite() {
            warn!("Ignoring clock step {delta}");
            return None;
        }
        let loop_length = self.loop_length();
        let mut time = (self.time + delta).rem_euclid(loop_length);
        // rem_euclid can round up to the modulus itself
        if time >= loop_length {
            time = 0.0;
        }
        self.time = time;
        Some(self.bump())
    }

    /// Jumps to an absolute time, clamped to `[0, loop_length]`, and pauses until `resume` is
    /// called.
    pub fn seek(&mut self, time: f64) -> ClockUpdate {
        self.time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.loop_length())
        };
        self.paused = true;
        self.bump()
    }

    fn bump(&mut self) -> ClockUpdate {
        self.seq += 1;
        self.current()
    }

    /// The latest state, without advancing anything.
    pub fn current(&self) -> ClockUpdate {
        ClockUpdate {
            seq: self.seq,
            time: self.time,
            bucket: self.bucket(),
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Returns true if the clock is now paused.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn bucket(&self) -> usize {
        self.indexer.bucket(self.time)
    }

    pub fn indexer(&self) -> &BucketIndexer {
        &self.indexer
    }

    pub fn loop_length(&self) -> f64 {
        self.indexer.loop_length()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = sanitize_speed(speed);
    }

    /// How far through the loop, from 0 to 1
    pub fn percent(&self) -> f64 {
        self.time / self.loop_length()
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed
    } else {
        warn!("Ignoring playback speed {speed}");
        0.0
    }
}
