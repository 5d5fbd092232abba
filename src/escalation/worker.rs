//! Escalation worker loop.
//!
//! Drains the escalation queue one task at a time: feature attribution,
//! SAR scene acquisition over the fixed lookback window, spill analysis,
//! persistence, then broadcast. Any step failing is logged and the loop
//! moves to the next task — one bad task never stops the worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{EscalationError, ImageryProvider, SpillAnalyzer};
use crate::hub::BroadcastHub;
use crate::scoring::explain::PerturbationExplainer;
use crate::storage::{Notifier, ReportStore};
use crate::types::{EscalationTask, OilSpillFinding, StreamEvent, Timestamp};

/// Counters the status endpoint exposes.
#[derive(Default)]
pub struct EscalationStats {
    pub tasks_processed: AtomicU64,
    pub findings_produced: AtomicU64,
    pub tasks_failed: AtomicU64,
}

pub struct EscalationWorker {
    imagery: Arc<dyn ImageryProvider>,
    analyzer: Arc<dyn SpillAnalyzer>,
    store: Option<Arc<dyn ReportStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    explainer: Option<Arc<PerturbationExplainer>>,
    hub: Arc<BroadcastHub>,
    stats: Arc<EscalationStats>,
}

impl EscalationWorker {
    pub fn new(
        imagery: Arc<dyn ImageryProvider>,
        analyzer: Arc<dyn SpillAnalyzer>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            imagery,
            analyzer,
            store: None,
            notifier: None,
            explainer: None,
            hub,
            stats: Arc::new(EscalationStats::default()),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_explainer(mut self, explainer: Arc<PerturbationExplainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn stats(&self) -> Arc<EscalationStats> {
        Arc::clone(&self.stats)
    }

    /// Drain the queue until cancellation or until every sender is gone.
    pub async fn run(
        self,
        mut queue: mpsc::Receiver<EscalationTask>,
        cancel_token: CancellationToken,
    ) {
        info!("Escalation worker starting");
        loop {
            let task = tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Escalation worker observed shutdown");
                    break;
                }
                task = queue.recv() => match task {
                    Some(task) => task,
                    None => {
                        info!("Escalation queue closed, worker stopping");
                        break;
                    }
                },
            };

            self.stats.tasks_processed.fetch_add(1, Ordering::Relaxed);
            let mmsi = task.report.mmsi;
            match self.process_task(task).await {
                Ok(Some(())) => {
                    self.stats.findings_produced.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => {
                    debug!(mmsi, "Escalation yielded no finding");
                }
                Err(e) => {
                    self.stats.tasks_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(mmsi, error = %e, "Escalation task failed — continuing");
                }
            }
        }
    }

    /// Run one task through the imaging and vision collaborators.
    ///
    /// `Ok(None)` means no SAR scene covered the window: nothing is
    /// broadcast or persisted for the task, by design.
    async fn process_task(&self, task: EscalationTask) -> Result<Option<()>, EscalationError> {
        let mmsi = task.report.mmsi;

        // Feature attribution runs the model repeatedly; keep it off the
        // scheduler thread.
        let attributions = match &self.explainer {
            Some(explainer) => {
                let explainer = Arc::clone(explainer);
                let features = task.features;
                tokio::task::spawn_blocking(move || explainer.attributions(&features))
                    .await
                    .map_err(|e| EscalationError::Analysis(format!("explainer task: {e}")))??
            }
            None => Vec::new(),
        };

        let end_date = resolve_report_date(task.report.timestamp.as_ref());
        let scene = self
            .imagery
            .fetch_scene(task.report.latitude, task.report.longitude, end_date)
            .await?;

        let Some(scene) = scene else {
            info!(mmsi, end_date = %end_date, "No SAR scene in lookback window");
            return Ok(None);
        };

        let mut finding: OilSpillFinding = self.analyzer.analyze(&scene).await?;
        finding.feature_attributions = attributions;

        if let Some(store) = &self.store {
            if let Err(e) = store.persist(&task.report, &task.verdict, &finding).await {
                warn!(mmsi, error = %e, "Report persistence failed");
            }
        }
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify_spill(mmsi, &finding).await {
                warn!(mmsi, error = %e, "Spill notification failed");
            }
        }

        let attempts = self.hub.broadcast(&StreamEvent::Escalation {
            mmsi,
            oil_spill_prediction: finding,
        });
        info!(
            mmsi,
            subscribers = attempts,
            "Oil-spill finding broadcast"
        );

        Ok(Some(()))
    }
}

/// The report's own date anchors the imagery window; an absent or
/// unparsable timestamp falls back to today.
fn resolve_report_date(timestamp: Option<&Timestamp>) -> NaiveDate {
    timestamp
        .and_then(Timestamp::to_datetime)
        .map_or_else(|| Utc::now().date_naive(), |dt| dt.date_naive())
}
