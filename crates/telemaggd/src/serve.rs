//! `telemaggd serve` — wires the store, worker and read API together.

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use telemagg_api::{ApiState, build_router};
use telemagg_core::{AggregatorConfig, SnapshotParser};
use telemagg_ingest::{HttpFetcher, IngestionOutcome, IngestionPipeline, IngestionWorker, RetryPolicy};
use telemagg_metrics::IngestionMetrics;
use telemagg_store::SnapshotStore;

pub async fn run(config: AggregatorConfig, once: bool) -> anyhow::Result<()> {
    let store = SnapshotStore::new();
    let metrics = IngestionMetrics::new();

    let fetcher = HttpFetcher::new(&config.source_url, config.fetch_timeout())?;
    let pipeline = IngestionPipeline::new(
        fetcher,
        SnapshotParser::new(&config.parser)?,
        RetryPolicy::new(config.max_attempts, config.backoff_base()),
    );
    let mut worker = IngestionWorker::new(
        pipeline,
        store.clone(),
        metrics.clone(),
        config.poll_interval(),
    );

    if once {
        return match worker.run_cycle().await {
            IngestionOutcome::Success { snapshot, .. } => {
                println!("{}", serde_json::to_string_pretty(&*snapshot)?);
                Ok(())
            }
            IngestionOutcome::Failure { kind, detail, attempts } => {
                anyhow::bail!("ingestion failed after {attempts} attempt(s) ({kind}): {detail}")
            }
        };
    }

    info!(
        source = %config.source_url,
        listen = %config.listen,
        poll_interval_secs = config.poll_interval_secs,
        max_attempts = config.max_attempts,
        "telemaggd starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    let router = build_router(ApiState::new(store, metrics));
    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(address = %config.listen, "read API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = worker_handle.await {
        error!(error = %e, "ingestion worker panicked");
    }

    info!("telemaggd stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
