use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use geom::Duration;
use serde::{Deserialize, Serialize};

use crate::{BucketIndexer, BucketInterval};

/// Settings for one playback session. Anything missing from the JSON falls back to the defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The epoch origin. Time 0 of the loop.
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Width of the aggregation buckets. An unsupported unit fails loading.
    pub interval: BucketInterval,
    /// Loop seconds per animation frame
    pub animation_speed: f64,
    /// In loop seconds
    pub trail_length: f64,
    /// Hex resolution sent with region queries
    pub resolution: u8,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // 2021-01-08 00:00 to 03:30 UTC
            start_time: utc(1_610_064_000),
            end_time: utc(1_610_076_600),
            interval: BucketInterval::hours(24),
            animation_speed: 10.0,
            trail_length: 1000.0,
            resolution: 7,
            poll_interval_ms: 200,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let raw = fs_err::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|err| anyhow!("{path}: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_time <= self.start_time {
            bail!(
                "end_time {} isn't after start_time {}",
                self.end_time,
                self.start_time
            );
        }
        if !self.animation_speed.is_finite() {
            bail!("animation_speed {} isn't a number", self.animation_speed);
        }
        if self.resolution > 15 {
            bail!("resolution {} is beyond the finest hex level", self.resolution);
        }
        Ok(())
    }

    /// Seconds from start_time to end_time
    pub fn loop_length(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64
    }

    /// start_time in epoch seconds
    pub fn epoch_origin(&self) -> i64 {
        self.start_time.timestamp()
    }

    pub fn poll_period(&self) -> Duration {
        Duration::seconds(self.poll_interval_ms as f64 / 1000.0)
    }

    pub fn bucket_indexer(&self) -> Result<BucketIndexer> {
        BucketIndexer::new(self.loop_length(), self.interval)
    }
}

// Only called with constants in range
fn utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.loop_length(), 12600.0);
        assert_eq!(config.epoch_origin(), 1_610_064_000);
        assert_eq!(config.interval.to_string(), "24 hours");
        assert_eq!(config.bucket_indexer().unwrap().total_buckets(), 1);
    }

    #[test]
    fn partial_json() {
        let config: Config = serde_json::from_str(
            r#"{ "end_time": "2021-01-08T06:00:00Z", "interval": "30 minutes", "animation_speed": 25 }"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.loop_length(), 6.0 * 3600.0);
        assert_eq!(config.interval, BucketInterval::minutes(30));
        assert_eq!(config.animation_speed, 25.0);
        assert_eq!(config.resolution, 7);
        assert_eq!(config.bucket_indexer().unwrap().total_buckets(), 12);
    }

    #[test]
    fn unsupported_unit_is_fatal() {
        let result: Result<Config, _> = serde_json::from_str(r#"{ "interval": "2 fortnights" }"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unsupported interval unit"), "{err}");
    }

    #[test]
    fn backwards_range() {
        let config: Config = serde_json::from_str(
            r#"{ "start_time": "2021-01-08T06:00:00Z", "end_time": "2021-01-08T03:00:00Z" }"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
