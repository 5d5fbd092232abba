//! Pipeline regression tests.
//!
//! Exercises the feed poller → streaming queue → processing loop →
//! broadcast hub path end to end with a stubbed scorer, asserting the
//! escalation contract and FIFO ordering.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use spill_sentinel::acquisition::{run_feed_poller, FeedError, FeedSource};
use spill_sentinel::config::BoundingBox;
use spill_sentinel::escalation::escalation_queue_with;
use spill_sentinel::hub::BroadcastHub;
use spill_sentinel::pipeline::{
    stream_queue_with, FeaturePipeline, FittedLabelEncoder, FittedScaler, ProcessingLoop,
};
use spill_sentinel::scoring::{Scorer, ScoringError};
use spill_sentinel::types::{AnomalyVerdict, FeatureVector};

/// Scorer stub returning a fixed probability for every record.
struct FixedScorer(f64);

impl Scorer for FixedScorer {
    fn score(&self, _features: &FeatureVector) -> Result<AnomalyVerdict, ScoringError> {
        Ok(AnomalyVerdict::from_probabilities(self.0, 0.2))
    }
}

/// Feed stub yielding one scripted batch, then empty cycles.
struct OneShotFeed {
    batch: Option<Vec<serde_json::Value>>,
}

#[async_trait]
impl FeedSource for OneShotFeed {
    async fn fetch_batch(&mut self) -> Result<Vec<serde_json::Value>, FeedError> {
        Ok(self.batch.take().unwrap_or_default())
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(20)
    }

    fn source_name(&self) -> &str {
        "one-shot"
    }
}

fn feature_pipeline() -> Arc<FeaturePipeline> {
    Arc::new(FeaturePipeline::new(
        FittedScaler::identity(),
        FittedLabelEncoder::time_of_day(),
    ))
}

fn afternoon_record(mmsi: u64, speed: f64) -> serde_json::Value {
    serde_json::json!({
        "MMSI": mmsi,
        "TIMESTAMP": "2015-04-03 14:12:05 UTC",
        "LATITUDE": 20.0,
        "LONGITUDE": -90.0,
        "SPEED": speed,
        "COURSE": 90.0,
        "HEADING": 88.0,
        "NAVSTAT": 0
    })
}

/// Wire the full path with the given scorer and scripted batch; returns the
/// subscriber receiver, escalation receiver, and the cancel token.
fn start_pipeline(
    probability: f64,
    batch: Vec<serde_json::Value>,
) -> (
    spill_sentinel::hub::EventReceiver,
    tokio::sync::mpsc::Receiver<spill_sentinel::types::EscalationTask>,
    CancellationToken,
) {
    let hub = Arc::new(BroadcastHub::new());
    let (_sub_id, sub_rx) = hub.register();
    let (esc_tx, esc_rx) = escalation_queue_with(8);
    let (queue_tx, queue_rx) = stream_queue_with(16, Duration::from_millis(100));

    let processing = ProcessingLoop::new(
        feature_pipeline(),
        Arc::new(FixedScorer(probability)),
        Arc::clone(&hub),
        esc_tx,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(processing.run(queue_rx, cancel.clone()));
    tokio::spawn(run_feed_poller(
        OneShotFeed { batch: Some(batch) },
        BoundingBox::default(),
        queue_tx,
        cancel.clone(),
    ));

    (sub_rx, esc_rx, cancel)
}

async fn next_event(rx: &mut spill_sentinel::hub::EventReceiver) -> serde_json::Value {
    let payload = tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("event within deadline")
        .expect("hub open");
    serde_json::from_str(&payload).expect("valid event json")
}

#[tokio::test]
async fn anomalous_fetch_cycle_broadcasts_once_and_escalates_once() {
    let (mut sub_rx, mut esc_rx, cancel) =
        start_pipeline(0.9, vec![afternoon_record(367_001_122, 15.0)]);

    let event = next_event(&mut sub_rx).await;
    assert_eq!(event["ais_data"]["MMSI"], serde_json::json!(367_001_122));
    assert_eq!(event["anomaly_result"]["anomaly"], serde_json::json!(true));
    assert_eq!(
        event["anomaly_result"]["anomaly_probability"],
        serde_json::json!(0.9)
    );

    let task = tokio::time::timeout(Duration::from_secs(3), esc_rx.recv())
        .await
        .expect("task within deadline")
        .expect("queue open");
    assert_eq!(task.report.mmsi, 367_001_122);

    // Exactly one of each: nothing else arrives.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(sub_rx.try_recv().is_err());
    assert!(esc_rx.try_recv().is_err());

    cancel.cancel();
}

#[tokio::test]
async fn normal_fetch_cycle_broadcasts_once_and_never_escalates() {
    let (mut sub_rx, mut esc_rx, cancel) =
        start_pipeline(0.1, vec![afternoon_record(367_003_344, 15.0)]);

    let event = next_event(&mut sub_rx).await;
    assert_eq!(event["anomaly_result"]["anomaly"], serde_json::json!(false));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(esc_rx.try_recv().is_err());
    assert!(sub_rx.try_recv().is_err());

    cancel.cancel();
}

#[tokio::test]
async fn successive_reports_for_one_vessel_keep_arrival_order() {
    let batch = vec![
        afternoon_record(500_000_001, 5.0),
        afternoon_record(500_000_001, 10.0),
        afternoon_record(500_000_001, 15.0),
    ];
    let (mut sub_rx, _esc_rx, cancel) = start_pipeline(0.1, batch);

    for expected_speed in [5.0, 10.0, 15.0] {
        let event = next_event(&mut sub_rx).await;
        assert_eq!(
            event["ais_data"]["SPEED"],
            serde_json::json!(expected_speed)
        );
    }

    cancel.cancel();
}

#[tokio::test]
async fn scoring_is_deterministic_for_identical_input() {
    let batch = vec![
        afternoon_record(600_000_001, 12.0),
        afternoon_record(600_000_001, 12.0),
    ];
    let (mut sub_rx, _esc_rx, cancel) = start_pipeline(0.5, batch);

    let first = next_event(&mut sub_rx).await;
    let second = next_event(&mut sub_rx).await;
    assert_eq!(first["anomaly_result"], second["anomaly_result"]);

    cancel.cancel();
}
