use std::cell::Cell;
use std::rc::Rc;

use geom::Duration;

/// A task that reschedules itself every animation frame until torn down. `start` hands out a
/// guard, and the loop runs exactly as long as the newest guard is alive.
#[derive(Default)]
pub struct FrameLoop {
    // 0 means stopped; otherwise the generation of the live guard
    active: Rc<Cell<u64>>,
    generations: u64,
}

pub struct FrameGuard {
    active: Rc<Cell<u64>>,
    generation: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> FrameGuard {
        self.generations += 1;
        self.active.set(self.generations);
        FrameGuard {
            active: self.active.clone(),
            generation: self.generations,
        }
    }

    /// Should the driver schedule another frame?
    pub fn is_running(&self) -> bool {
        self.active.get() != 0
    }
}

impl FrameGuard {
    pub fn stop(self) {}
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        // An older guard going away doesn't stop a newer one
        if self.active.get() == self.generation {
            self.active.set(0);
        }
    }
}

/// Samples the time bucket on a fixed wall-clock cadence, independent of animation frames.
pub struct BucketPoller {
    period: Duration,
    elapsed: Duration,
}

impl BucketPoller {
    pub fn new(period: Duration) -> Self {
        let period = if period > Duration::ZERO {
            period
        } else {
            warn!("Poll period {period} isn't positive; using 200ms");
            Duration::seconds(0.2)
        };
        Self {
            period,
            elapsed: Duration::ZERO,
        }
    }

    /// Accounts for `dt` of wall time passing. True if a sample is due.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed + dt;
        if self.elapsed < self.period {
            return false;
        }
        // Several missed periods still produce only one sample
        self.elapsed = Duration::seconds(
            self.elapsed.inner_seconds() % self.period.inner_seconds(),
        );
        true
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
