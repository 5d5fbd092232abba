//! Feed polling loop.
//!
//! Drives a [`FeedSource`] on its polling interval: fetch, filter, then
//! enqueue the surviving reports one at a time with a small pacing delay so
//! the queue fills at a rate the consumer can realistically drain. A failed
//! fetch logs and yields an empty cycle; the loop only exits on
//! cancellation or when the consumer side of the queue is gone.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{filter_reports, FeedSource};
use crate::config::defaults::ENQUEUE_PACING_MS;
use crate::config::BoundingBox;
use crate::pipeline::QueueSender;
use crate::types::VesselReport;

pub async fn run_feed_poller<S: FeedSource>(
    mut source: S,
    bbox: BoundingBox,
    queue: QueueSender<VesselReport>,
    cancel_token: CancellationToken,
) {
    let pacing = Duration::from_millis(ENQUEUE_PACING_MS);
    info!(source = source.source_name(), "Feed poller starting");

    loop {
        let batch = tokio::select! {
            _ = cancel_token.cancelled() => break,
            result = source.fetch_batch() => match result {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source = source.source_name(), error = %e, "Fetch cycle failed, yielding empty batch");
                    Vec::new()
                }
            },
        };

        let reports = filter_reports(batch, &bbox);
        let enqueued = reports.len();

        for report in reports {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Feed poller observed shutdown mid-batch");
                    return;
                }
                result = queue.put(report) => {
                    if result.is_err() {
                        // Consumer gone; nothing left to feed.
                        warn!("Stream queue closed, stopping feed poller");
                        return;
                    }
                }
            }
            tokio::select! {
                _ = cancel_token.cancelled() => return,
                () = tokio::time::sleep(pacing) => {}
            }
        }

        if enqueued > 0 {
            debug!(count = enqueued, "Enqueued filtered reports");
        }

        let interval = source.poll_interval();
        if !interval.is_zero() {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
    }

    info!("Feed poller stopped");
}
