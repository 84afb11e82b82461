use anyhow::Result;

use model::{AggregateRow, AggregationService, RegionQuery};

/// Answers every region query with the same rows, read from a JSON file.
pub struct FileAggregationService {
    path: Option<String>,
}

impl FileAggregationService {
    pub fn new(path: Option<String>) -> Self {
        Self { path }
    }
}

impl AggregationService for FileAggregationService {
    fn activity_by_region(&mut self, query: &RegionQuery) -> Result<Vec<AggregateRow>> {
        let path = match self.path {
            Some(ref x) => x,
            None => bail!("No --aggregate file to answer the region query with"),
        };
        debug!("Request: {}", serde_json::to_string(query)?);
        let raw = fs_err::read_to_string(path)?;
        let rows: Vec<AggregateRow> =
            serde_json::from_str(&raw).map_err(|err| anyhow!("{path}: {err}"))?;
        Ok(rows)
    }
}
