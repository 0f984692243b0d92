mod config;
mod server;

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use flux_ingest::Instance;
use flux_job::{Handle, RpcError};
use flux_model::wire;
use flux_observe::logger_init;
use flux_prometheus::PrometheusMetrics;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = DaemonConfig::from_env()?;
    logger_init(&cfg.logger)?;
    info!(format = %cfg.logger.format, level = %cfg.logger.level, "logger initialized");

    // 2) Coordinator
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let instance = Instance::builder(cfg.instance.clone())
        .with_metrics(metrics.clone())
        .start()
        .await
        .context("starting instance")?;
    info!(owner = cfg.instance.owner_userid, "instance ready");

    // 3) HTTP
    let listener = TcpListener::bind(cfg.http_addr)
        .await
        .with_context(|| format!("binding {}", cfg.http_addr))?;
    info!(addr = %cfg.http_addr, "listening");
    info!("press Ctrl+C to stop");

    axum::serve(listener, server::router(instance.owner(), metrics))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;

    // 4) Refuse new jobs, let the last batch flush, then stop
    info!("shutting down...");
    if let Err(e) = shutdown_ingest(&instance).await {
        warn!(error = %e, "ingest shutdown failed");
    }
    tokio::time::sleep(cfg.instance.ingest.batch_timeout * 2).await;
    instance.stop();

    Ok(())
}

async fn shutdown_ingest(instance: &Instance) -> Result<(), RpcError> {
    instance
        .owner()
        .rpc(wire::INGEST_SHUTDOWN, json!({}))?
        .get()
        .await?;
    Ok(())
}
