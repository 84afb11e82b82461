use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row returned by the region aggregation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Identifies the time bucket. An ISO-like timestamp.
    #[serde(rename = "time_int")]
    pub bucket_key: String,
    #[serde(rename = "hexid")]
    pub hex_id: String,
    pub count: u64,
    // Whatever else the service sends along is passed through to the renderer untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The rows of one region query, grouped per time bucket. Built once per completed draw and
/// replaced wholesale by the next.
#[derive(Clone, Debug, Default)]
pub struct RegionAggregate {
    // Sorted chronologically
    keys: Vec<String>,
    groups: BTreeMap<String, Vec<AggregateRow>>,
}

impl RegionAggregate {
    pub fn from_rows(rows: Vec<AggregateRow>) -> Self {
        let mut groups: BTreeMap<String, Vec<AggregateRow>> = BTreeMap::new();
        for row in rows {
            groups
                .entry(row.bucket_key.clone())
                .or_insert_with(Vec::new)
                .push(row);
        }

        let mut keys: Vec<String> = groups.keys().cloned().collect();
        // Keys that aren't timestamps go last, in plain string order
        keys.sort_by_cached_key(|key| {
            let parsed = parse_bucket_key(key);
            (parsed.is_none(), parsed, key.clone())
        });

        Self { keys, groups }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_for(&self, bucket: usize) -> Option<&str> {
        self.keys.get(bucket).map(|x| x.as_str())
    }

    /// Empty if there's no bucket at this index.
    pub fn rows_for(&self, bucket: usize) -> &[AggregateRow] {
        self.key_for(bucket)
            .and_then(|key| self.groups.get(key))
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    /// The bucket's key as `YYYY-MM-DD HH:MM:SS` in UTC, or the raw key if it isn't a timestamp
    pub fn label_for(&self, bucket: usize) -> Option<String> {
        let key = self.key_for(bucket)?;
        Some(match parse_bucket_key(key) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => key.to_string(),
        })
    }

    pub fn num_rows(&self) -> usize {
        self.groups.values().map(|rows| rows.len()).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.groups
            .values()
            .flatten()
            .map(|row| row.count)
            .max()
            .unwrap_or(0)
    }
}

fn parse_bucket_key(key: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(key) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres prints offsets like +00
    if let Ok(dt) = DateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(key, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }
    None
}
