//! Synthetic feed source for demos and smoke tests.
//!
//! Generates plausible position reports inside the configured bounding box
//! so the full pipeline can run without an external feed or API key.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{FeedError, FeedSource};
use crate::config::BoundingBox;

pub struct SyntheticFeed {
    bbox: BoundingBox,
    batch_size: usize,
    interval: Duration,
    next_mmsi: u64,
}

impl SyntheticFeed {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            batch_size: 8,
            interval: Duration::from_secs(30),
            next_mmsi: 367_000_000,
        }
    }
}

#[async_trait]
impl FeedSource for SyntheticFeed {
    async fn fetch_batch(&mut self) -> Result<Vec<serde_json::Value>, FeedError> {
        let mut rng = rand::thread_rng();
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let mut batch = Vec::with_capacity(self.batch_size);
        for _ in 0..self.batch_size {
            self.next_mmsi += 1;
            batch.push(serde_json::json!({
                "MMSI": self.next_mmsi,
                "TIMESTAMP": now,
                "LATITUDE": rng.gen_range(self.bbox.lat_min..=self.bbox.lat_max),
                "LONGITUDE": rng.gen_range(self.bbox.lon_min..=self.bbox.lon_max),
                "COURSE": rng.gen_range(0.0..360.0),
                "SPEED": rng.gen_range(0.0..25.0),
                "HEADING": rng.gen_range(0.0..360.0),
                "NAVSTAT": rng.gen_range(0..9),
                "NAME": format!("SYNTH-{}", self.next_mmsi % 1000),
            }));
        }
        Ok(batch)
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }

    fn source_name(&self) -> &str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::filter_reports;

    #[tokio::test]
    async fn synthetic_batches_pass_the_filter() {
        let bbox = BoundingBox::default();
        let mut feed = SyntheticFeed::new(bbox);
        let raw = feed.fetch_batch().await.expect("synthetic batch");
        let reports = filter_reports(raw, &bbox);
        assert_eq!(reports.len(), 8);
    }
}
