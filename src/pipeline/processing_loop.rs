//! Ingestion processing loop: dequeue → transform → score → broadcast →
//! escalate.
//!
//! Per-record failures are an explicit skip branch, not control flow by
//! exception: every record either becomes a complete broadcast event or is
//! dropped with a logged [`SkipReason`], and the loop always continues.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{FeatureError, FeaturePipeline, QueueReceiver};
use crate::escalation::EscalationSender;
use crate::hub::BroadcastHub;
use crate::scoring::Scorer;
use crate::types::{EscalationTask, StreamEvent, VesselReport};

/// Why a record was dropped instead of broadcast.
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("scoring failed: {0}")]
    Scoring(String),
}

/// Counters the status endpoint exposes.
#[derive(Default)]
pub struct IngestStats {
    pub records_processed: AtomicU64,
    pub records_skipped: AtomicU64,
    pub anomalies_flagged: AtomicU64,
    pub escalations_enqueued: AtomicU64,
}

/// What happened to one successfully scored record.
struct ScoredRecord {
    anomaly: bool,
    escalated: bool,
    delivery_attempts: usize,
}

pub struct ProcessingLoop {
    features: Arc<FeaturePipeline>,
    scorer: Arc<dyn Scorer>,
    hub: Arc<BroadcastHub>,
    escalation: EscalationSender,
    stats: Arc<IngestStats>,
}

impl ProcessingLoop {
    pub fn new(
        features: Arc<FeaturePipeline>,
        scorer: Arc<dyn Scorer>,
        hub: Arc<BroadcastHub>,
        escalation: EscalationSender,
    ) -> Self {
        Self {
            features,
            scorer,
            hub,
            escalation,
            stats: Arc::new(IngestStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// Consume the streaming queue until cancellation.
    ///
    /// The queue's receive timeout doubles as the housekeeping tick: every
    /// empty read re-checks cancellation instead of blocking forever.
    pub async fn run(
        self,
        mut queue: QueueReceiver<VesselReport>,
        cancel_token: CancellationToken,
    ) {
        info!("Ingestion processor starting");
        loop {
            let report = tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Ingestion processor observed shutdown");
                    break;
                }
                report = queue.get() => match report {
                    Some(report) => report,
                    None => {
                        debug!("No data currently available");
                        continue;
                    }
                },
            };

            let mmsi = report.mmsi;
            match self.process_report(report).await {
                Ok(scored) => {
                    self.stats.records_processed.fetch_add(1, Ordering::Relaxed);
                    if scored.anomaly {
                        self.stats.anomalies_flagged.fetch_add(1, Ordering::Relaxed);
                    }
                    if scored.escalated {
                        self.stats
                            .escalations_enqueued
                            .fetch_add(1, Ordering::Relaxed);
                    }
                    debug!(
                        mmsi,
                        anomaly = scored.anomaly,
                        subscribers = scored.delivery_attempts,
                        "Report processed"
                    );
                }
                Err(reason) => {
                    self.stats.records_skipped.fetch_add(1, Ordering::Relaxed);
                    warn!(mmsi, reason = %reason, "Record dropped");
                }
            }
        }
        info!(
            processed = self.stats.records_processed.load(Ordering::Relaxed),
            skipped = self.stats.records_skipped.load(Ordering::Relaxed),
            anomalies = self.stats.anomalies_flagged.load(Ordering::Relaxed),
            "Ingestion processor stopped"
        );
    }

    /// Transform, score, broadcast, and (for anomalies) escalate one
    /// report. Inference runs on the blocking pool so it never stalls the
    /// cooperative scheduler.
    async fn process_report(&self, report: VesselReport) -> Result<ScoredRecord, SkipReason> {
        let features = self.features.transform(&report)?;

        let scorer = Arc::clone(&self.scorer);
        let verdict = tokio::task::spawn_blocking(move || scorer.score(&features))
            .await
            .map_err(|e| SkipReason::Scoring(format!("inference task: {e}")))?
            .map_err(|e| SkipReason::Scoring(e.to_string()))?;

        let escalated = if verdict.anomaly {
            self.escalation.enqueue(EscalationTask {
                report: report.clone(),
                verdict,
                features,
            })
        } else {
            false
        };

        let delivery_attempts = self.hub.broadcast(&StreamEvent::Ingestion {
            ais_data: report,
            anomaly_result: verdict,
        });

        Ok(ScoredRecord {
            anomaly: verdict.anomaly,
            escalated,
            delivery_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::escalation_queue_with;
    use crate::pipeline::{FittedLabelEncoder, FittedScaler};
    use crate::scoring::ScoringError;
    use crate::types::{AnomalyVerdict, FeatureVector};

    /// Stub scorer returning a fixed probability.
    struct FixedScorer(f64);

    impl Scorer for FixedScorer {
        fn score(&self, _features: &FeatureVector) -> Result<AnomalyVerdict, ScoringError> {
            Ok(AnomalyVerdict::from_probabilities(self.0, 0.1))
        }
    }

    fn report(mmsi: u64) -> VesselReport {
        serde_json::from_value(serde_json::json!({
            "MMSI": mmsi,
            "TIMESTAMP": "2015-04-03 14:12:05 UTC",
            "LATITUDE": 20.0,
            "LONGITUDE": -90.0,
            "SPEED": 15.0,
            "COURSE": 90.0,
            "HEADING": 88.0,
            "NAVSTAT": 0
        }))
        .expect("valid report")
    }

    fn pipeline_with(probability: f64) -> (ProcessingLoop, Arc<BroadcastHub>, EscalationSender) {
        let hub = Arc::new(BroadcastHub::new());
        let (esc_tx, _esc_rx) = escalation_queue_with(8);
        let features = Arc::new(FeaturePipeline::new(
            FittedScaler::identity(),
            FittedLabelEncoder::time_of_day(),
        ));
        let processing = ProcessingLoop::new(
            features,
            Arc::new(FixedScorer(probability)),
            Arc::clone(&hub),
            esc_tx.clone(),
        );
        (processing, hub, esc_tx)
    }

    #[tokio::test]
    async fn anomalous_record_is_broadcast_and_escalated() {
        let hub = Arc::new(BroadcastHub::new());
        let (_sub, mut sub_rx) = hub.register();
        let (esc_tx, mut esc_rx) = escalation_queue_with(8);
        let features = Arc::new(FeaturePipeline::new(
            FittedScaler::identity(),
            FittedLabelEncoder::time_of_day(),
        ));
        let processing = ProcessingLoop::new(
            features,
            Arc::new(FixedScorer(0.9)),
            Arc::clone(&hub),
            esc_tx,
        );

        let scored = processing
            .process_report(report(42))
            .await
            .expect("record scores");
        assert!(scored.anomaly);
        assert!(scored.escalated);
        assert_eq!(scored.delivery_attempts, 1);

        let payload = sub_rx.try_recv().expect("event delivered");
        let json: serde_json::Value = serde_json::from_str(&payload).expect("valid json");
        assert_eq!(json["anomaly_result"]["anomaly"], serde_json::json!(true));

        let task = esc_rx.try_recv().expect("task enqueued");
        assert_eq!(task.report.mmsi, 42);
    }

    #[tokio::test]
    async fn normal_record_is_broadcast_but_never_escalated() {
        let hub = Arc::new(BroadcastHub::new());
        let (_sub, mut sub_rx) = hub.register();
        let (esc_tx, mut esc_rx) = escalation_queue_with(8);
        let features = Arc::new(FeaturePipeline::new(
            FittedScaler::identity(),
            FittedLabelEncoder::time_of_day(),
        ));
        let processing = ProcessingLoop::new(
            features,
            Arc::new(FixedScorer(0.1)),
            Arc::clone(&hub),
            esc_tx,
        );

        let scored = processing
            .process_report(report(43))
            .await
            .expect("record scores");
        assert!(!scored.anomaly);
        assert!(!scored.escalated);

        let payload = sub_rx.try_recv().expect("event delivered");
        let json: serde_json::Value = serde_json::from_str(&payload).expect("valid json");
        assert_eq!(json["anomaly_result"]["anomaly"], serde_json::json!(false));
        assert!(esc_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_required_field_is_a_skip_not_a_crash() {
        let (processing, _hub, _esc) = pipeline_with(0.9);
        let mut r = report(44);
        r.heading = None;
        let result = processing.process_report(r).await;
        assert!(matches!(result, Err(SkipReason::Feature(_))));
    }
}
