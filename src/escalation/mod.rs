//! Escalation of anomalous reports into the SAR imaging pipeline.
//!
//! Anomalies land on a second bounded queue drained by a dedicated worker,
//! keeping the expensive imaging and vision calls off the ingestion path.
//! The queue rejects new tasks when full (with a warning and a counter)
//! rather than growing without bound under sustained anomaly bursts.

mod analysis;
mod imagery;
mod worker;

pub use analysis::{DetectionClient, SpillAnalyzer};
pub use imagery::{ImageryProvider, SarImageryClient, SarScene};
pub use worker::{EscalationStats, EscalationWorker};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::defaults::ESCALATION_QUEUE_CAPACITY;
use crate::types::EscalationTask;

#[derive(Error, Debug)]
pub enum EscalationError {
    #[error("collaborator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("imagery service error: {0}")]
    Imagery(String),

    #[error("detection service error: {0}")]
    Analysis(String),

    #[error(transparent)]
    Scoring(#[from] crate::scoring::ScoringError),
}

/// Producer half of the escalation queue. Enqueueing never blocks the
/// caller; a full queue drops the new task.
#[derive(Clone)]
pub struct EscalationSender {
    tx: mpsc::Sender<EscalationTask>,
    rejected: Arc<AtomicU64>,
}

impl EscalationSender {
    /// Enqueue a task, returning whether it was accepted.
    pub fn enqueue(&self, task: EscalationTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                let total = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    mmsi = task.report.mmsi,
                    rejected_total = total,
                    "Escalation queue full — task dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                warn!(mmsi = task.report.mmsi, "Escalation worker gone — task dropped");
                false
            }
        }
    }

    /// Tasks rejected because the queue was full.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Create the bounded escalation queue with the default capacity.
pub fn escalation_queue() -> (EscalationSender, mpsc::Receiver<EscalationTask>) {
    escalation_queue_with(ESCALATION_QUEUE_CAPACITY)
}

/// Create the bounded escalation queue with an explicit capacity.
pub fn escalation_queue_with(
    capacity: usize,
) -> (EscalationSender, mpsc::Receiver<EscalationTask>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        EscalationSender {
            tx,
            rejected: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnomalyVerdict, FeatureVector};

    fn task(mmsi: u64) -> EscalationTask {
        EscalationTask {
            report: serde_json::from_value(serde_json::json!({
                "MMSI": mmsi, "LATITUDE": 20.0, "LONGITUDE": -90.0
            }))
            .expect("valid report"),
            verdict: AnomalyVerdict::from_probabilities(0.9, 0.5),
            features: FeatureVector {
                sog: 0.0,
                cog: 0.0,
                lat: 0.0,
                lon: 0.0,
                heading: 0.0,
                status: 0.0,
                time_of_day: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn full_queue_rejects_new_tasks_and_counts_them() {
        let (tx, mut rx) = escalation_queue_with(2);
        assert!(tx.enqueue(task(1)));
        assert!(tx.enqueue(task(2)));
        assert!(!tx.enqueue(task(3)));
        assert_eq!(tx.rejected_count(), 1);

        // Earlier tasks are intact; the rejected one never arrives.
        assert_eq!(rx.recv().await.map(|t| t.report.mmsi), Some(1));
        assert_eq!(rx.recv().await.map(|t| t.report.mmsi), Some(2));
        assert!(rx.try_recv().is_err());
    }
}
