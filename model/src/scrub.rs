use chrono::{DateTime, Utc};

use crate::{ClockUpdate, PlaybackClock};

/// Connects the timeline's drag handle and the pause key to the playback clock.
#[derive(Default)]
pub struct Scrubber {
    // While the handle is held: should playback resume on release?
    resume_on_release: Option<bool>,
}

impl Scrubber {
    pub fn new() -> Self {
        Self::default()
    }

    /// `offset` runs from 0 to 1 across the timeline. Grabbing the handle always pauses.
    pub fn drag_start(&mut self, clock: &mut PlaybackClock, offset: f64) -> ClockUpdate {
        if self.resume_on_release.is_none() {
            self.resume_on_release = Some(!clock.is_paused());
        }
        clock.seek(offset_to_time(offset, clock.loop_length()))
    }

    pub fn drag_move(&mut self, clock: &mut PlaybackClock, offset: f64) -> Option<ClockUpdate> {
        if !self.is_dragging() {
            return None;
        }
        Some(clock.seek(offset_to_time(offset, clock.loop_length())))
    }

    /// Lets go of the handle. Playback resumes unless it was paused before the drag started.
    /// Returns true if it resumed.
    pub fn drag_end(&mut self, clock: &mut PlaybackClock) -> bool {
        match self.resume_on_release.take() {
            Some(true) => {
                clock.resume();
                true
            }
            _ => false,
        }
    }

    /// The pause key. While the handle is held, the clock stays paused and this flips what
    /// happens on release instead. Returns true if playback is (or will be) paused.
    pub fn toggle_pause(&mut self, clock: &mut PlaybackClock) -> bool {
        match self.resume_on_release {
            Some(ref mut resume) => {
                *resume = !*resume;
                !*resume
            }
            None => clock.toggle_pause(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.resume_on_release.is_some()
    }
}

pub fn offset_to_time(offset: f64, loop_length: f64) -> f64 {
    if offset.is_nan() {
        return 0.0;
    }
    offset.clamp(0.0, 1.0) * loop_length
}

/// Where a pointer at `x` sits along a timeline span, from 0 to 1.
pub fn pointer_offset(x: f64, span_left: f64, span_width: f64) -> f64 {
    if span_width.is_nan() || span_width <= 0.0 {
        return 0.0;
    }
    ((x - span_left) / span_width).clamp(0.0, 1.0)
}

pub fn datetime_at(start: DateTime<Utc>, time: f64) -> DateTime<Utc> {
    start + chrono::Duration::milliseconds((time * 1000.0).round() as i64)
}

/// Like "01:30 UTC"
pub fn clock_label(start: DateTime<Utc>, time: f64) -> String {
    format!("{} UTC", datetime_at(start, time).format("%H:%M"))
}

/// Like "(08.01.2021)"
pub fn date_label(start: DateTime<Utc>, time: f64) -> String {
    datetime_at(start, time).format("(%d.%m.%Y)").to_string()
}
