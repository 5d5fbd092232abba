//! Spill Sentinel — AIS anomaly detection with SAR oil-spill escalation.
//!
//! # Usage
//!
//! ```bash
//! # Run against a polled REST feed
//! SPILL_FEED_URL=https://example.com/ais ./spill-sentinel
//!
//! # Run against a push socket feed
//! ./spill-sentinel --feed-mode socket --feed-url stream.example.com:9009
//!
//! # Run with locally generated traffic (no external feed needed)
//! ./spill-sentinel --feed-mode synthetic
//! ```
//!
//! # Environment Variables
//!
//! See [`spill_sentinel::config`] for the full list. The important ones:
//! `SPILL_FEED_URL`, `SPILL_MODEL_DIR`, `SPILL_SERVER_ADDR`, `RUST_LOG`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use spill_sentinel::acquisition::{run_feed_poller, RestFeed, SocketFeed, SyntheticFeed};
use spill_sentinel::api::{create_app, ServerState};
use spill_sentinel::config::{AppConfig, FeedMode};
use spill_sentinel::escalation::{
    escalation_queue, DetectionClient, EscalationWorker, SarImageryClient,
};
use spill_sentinel::hub::BroadcastHub;
use spill_sentinel::pipeline::{stream_queue, FeaturePipeline, ProcessingLoop};
use spill_sentinel::scoring::{explain::PerturbationExplainer, ModelArtifacts, OnnxScorer, Scorer};
use spill_sentinel::storage::{HttpNotifier, HttpReportStore, Notifier, ReportStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "spill-sentinel")]
#[command(about = "AIS anomaly detection with SAR oil-spill escalation")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8765")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the feed URL (REST URL, or HOST:PORT for the socket feed)
    #[arg(long)]
    feed_url: Option<String>,

    /// Override the feed mode
    #[arg(long, value_enum)]
    feed_mode: Option<FeedMode>,

    /// Override the model artifact directory
    #[arg(long)]
    model_dir: Option<String>,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    FeedPoller,
    StreamProcessor,
    EscalationWorker,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::FeedPoller => write!(f, "FeedPoller"),
            TaskName::StreamProcessor => write!(f, "StreamProcessor"),
            TaskName::EscalationWorker => write!(f, "EscalationWorker"),
        }
    }
}

// ============================================================================
// Task Spawning
// ============================================================================

/// Spawn the HTTP/WebSocket server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Spawn the feed poller for the configured source.
fn spawn_feed_poller(
    task_set: &mut JoinSet<Result<TaskName>>,
    config: &AppConfig,
    queue: spill_sentinel::pipeline::QueueSender<spill_sentinel::types::VesselReport>,
    cancel_token: CancellationToken,
) {
    let bbox = config.bounding_box;
    match config.feed_mode {
        FeedMode::Rest => {
            let source = RestFeed::new(&config.feed_url);
            task_set.spawn(async move {
                info!("[FeedPoller] Task starting (REST)");
                run_feed_poller(source, bbox, queue, cancel_token).await;
                Ok(TaskName::FeedPoller)
            });
        }
        FeedMode::Socket => {
            let source = SocketFeed::new(&config.feed_url, &config.feed_api_key, bbox);
            task_set.spawn(async move {
                info!("[FeedPoller] Task starting (socket)");
                run_feed_poller(source, bbox, queue, cancel_token).await;
                Ok(TaskName::FeedPoller)
            });
        }
        FeedMode::Synthetic => {
            let source = SyntheticFeed::new(bbox);
            task_set.spawn(async move {
                info!("[FeedPoller] Task starting (synthetic)");
                run_feed_poller(source, bbox, queue, cancel_token).await;
                Ok(TaskName::FeedPoller)
            });
        }
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Run the supervisor loop: monitor tasks, cancel the rest on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Wait for in-flight work to observe cancellation before exiting.
    while task_set.join_next().await.is_some() {}
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let mut config = AppConfig::from_env();
    if let Some(addr) = args.addr {
        config.server_addr = addr;
    }
    if let Some(url) = args.feed_url {
        config.feed_url = url;
    }
    if let Some(mode) = args.feed_mode {
        config.feed_mode = mode;
    }
    if let Some(dir) = args.model_dir {
        config.model_dir = dir;
    }

    info!("Spill Sentinel — AIS anomaly detection");
    info!(
        "Feed: {:?} ({}) | Box: lat {}..{}, lon {}..{}",
        config.feed_mode,
        if config.feed_url.is_empty() {
            "unset"
        } else {
            config.feed_url.as_str()
        },
        config.bounding_box.lat_min,
        config.bounding_box.lat_max,
        config.bounding_box.lon_min,
        config.bounding_box.lon_max,
    );

    // Model artifacts load before the listener binds: a missing or
    // mismatched artifact must never leave the service accepting
    // subscribers half-initialized.
    let artifacts = ModelArtifacts::load(Path::new(&config.model_dir), config.onnx_threads)
        .context("Failed to load model artifacts")?;
    let features = Arc::new(FeaturePipeline::new(
        artifacts.scaler.clone(),
        artifacts.encoder.clone(),
    ));
    let scorer: Arc<dyn Scorer> = Arc::new(OnnxScorer::new(artifacts));
    let explainer = Arc::new(PerturbationExplainer::new(Arc::clone(&scorer)));

    let hub = Arc::new(BroadcastHub::new());
    let (stream_tx, stream_rx) = stream_queue();
    let (escalation_tx, escalation_rx) = escalation_queue();

    let imagery = Arc::new(
        SarImageryClient::new(&config.imagery_url).context("Failed to build imagery client")?,
    );
    let analyzer = Arc::new(
        DetectionClient::new(&config.detection_url).context("Failed to build detection client")?,
    );
    let mut worker =
        EscalationWorker::new(imagery, analyzer, Arc::clone(&hub)).with_explainer(explainer);
    if let Some(url) = &config.report_store_url {
        let store: Arc<dyn ReportStore> =
            Arc::new(HttpReportStore::new(url).context("Failed to build report store")?);
        worker = worker.with_store(store);
    } else {
        info!("Report persistence disabled (SPILL_REPORT_STORE_URL not set)");
    }
    if let Some(url) = &config.notify_url {
        let notifier: Arc<dyn Notifier> =
            Arc::new(HttpNotifier::new(url).context("Failed to build notifier")?);
        worker = worker.with_notifier(notifier);
    }

    let processing = ProcessingLoop::new(
        features,
        Arc::clone(&scorer),
        Arc::clone(&hub),
        escalation_tx.clone(),
    );

    let state = ServerState {
        hub: Arc::clone(&hub),
        ingest_stats: processing.stats(),
        escalation_stats: worker.stats(),
        escalation: escalation_tx,
        started_at: Instant::now(),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;
    info!("Stream endpoint listening on ws://{}/ws", config.server_addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task 1: HTTP/WebSocket server
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    // Task 2: Feed poller
    spawn_feed_poller(&mut task_set, &config, stream_tx, cancel_token.clone());

    // Task 3: Ingestion processor (consume → score → broadcast → escalate)
    {
        let cancel = cancel_token.clone();
        task_set.spawn(async move {
            info!("[StreamProcessor] Task starting");
            processing.run(stream_rx, cancel).await;
            Ok(TaskName::StreamProcessor)
        });
    }

    // Task 4: Escalation worker (SAR imaging + vision, off the hot path)
    {
        let cancel = cancel_token.clone();
        task_set.spawn(async move {
            info!("[EscalationWorker] Task starting");
            worker.run(escalation_rx, cancel).await;
            Ok(TaskName::EscalationWorker)
        });
    }

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("Spill Sentinel shutdown complete");
    Ok(())
}
