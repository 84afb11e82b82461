use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use geom::Duration;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntervalUnit {
    Minutes,
    Hours,
}

/// The width of one aggregation bucket, like "24 hours" or "15 minutes".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketInterval {
    pub magnitude: usize,
    pub unit: IntervalUnit,
}

impl BucketInterval {
    pub fn hours(magnitude: usize) -> Self {
        Self {
            magnitude,
            unit: IntervalUnit::Hours,
        }
    }

    pub fn minutes(magnitude: usize) -> Self {
        Self {
            magnitude,
            unit: IntervalUnit::Minutes,
        }
    }

    pub fn to_duration(self) -> Duration {
        match self.unit {
            IntervalUnit::Minutes => Duration::minutes(self.magnitude),
            IntervalUnit::Hours => Duration::hours(self.magnitude),
        }
    }

    pub fn seconds(self) -> f64 {
        self.to_duration().inner_seconds()
    }
}

impl FromStr for BucketInterval {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        if parts.len() != 2 {
            bail!("Interval {raw:?} should look like \"24 hours\"");
        }
        let magnitude: usize = parts[0]
            .parse()
            .map_err(|err| anyhow!("Interval {raw:?} has a bad magnitude: {err}"))?;
        if magnitude == 0 {
            bail!("Interval {raw:?} must be positive");
        }
        let unit = match parts[1] {
            "min" | "mins" | "minute" | "minutes" => IntervalUnit::Minutes,
            "hour" | "hours" => IntervalUnit::Hours,
            x => bail!("Unsupported interval unit: {x}"),
        };
        Ok(Self { magnitude, unit })
    }
}

impl TryFrom<String> for BucketInterval {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<BucketInterval> for String {
    fn from(interval: BucketInterval) -> Self {
        interval.to_string()
    }
}

impl fmt::Display for BucketInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let unit = match self.unit {
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Hours => "hours",
        };
        write!(f, "{} {}", self.magnitude, unit)
    }
}

/// Which bucket of the loop `time` falls into. Always a valid index into `total_buckets`
/// buckets, for any `time`, including exactly 0 and exactly `loop_length`.
pub fn bucket_for(time: f64, loop_length: f64, interval: BucketInterval) -> usize {
    let interval_seconds = interval.seconds();
    let total = total_buckets(loop_length, interval_seconds);
    ((time / interval_seconds).floor() as i64).rem_euclid(total as i64) as usize
}

// An interval longer than the loop still leaves one bucket.
fn total_buckets(loop_length: f64, interval_seconds: f64) -> usize {
    ((loop_length / interval_seconds).floor() as usize).max(1)
}

/// `bucket_for`, with the loop length and interval fixed at startup. Holds no other state, so
/// any caller asking about the same time gets the same bucket.
#[derive(Clone, Copy, Debug)]
pub struct BucketIndexer {
    loop_length: f64,
    interval: BucketInterval,
}

impl BucketIndexer {
    pub fn new(loop_length: f64, interval: BucketInterval) -> Result<Self> {
        if !(loop_length.is_finite() && loop_length > 0.0) {
            bail!("Loop length must be positive, not {loop_length}");
        }
        if interval.seconds() > loop_length {
            warn!(
                "Interval {interval} is longer than the {loop_length}s loop; there's only one bucket"
            );
        }
        Ok(Self {
            loop_length,
            interval,
        })
    }

    pub fn bucket(&self, time: f64) -> usize {
        bucket_for(time, self.loop_length, self.interval)
    }

    pub fn total_buckets(&self) -> usize {
        total_buckets(self.loop_length, self.interval.seconds())
    }

    pub fn interval(&self) -> BucketInterval {
        self.interval
    }

    pub fn loop_length(&self) -> f64 {
        self.loop_length
    }
}
