use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use cryptodash::api::{self, ApiState};
use cryptodash::cache::SnapshotCache;
use cryptodash::config::AppConfig;
use cryptodash::hub::BroadcastHub;
use cryptodash::observability::init_tracing;
use cryptodash::poll::Poller;
use cryptodash::source;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    info!(
        provider = ?config.source.provider,
        port = config.server.port,
        interval_secs = config.poll.interval_secs,
        "cryptodash starting"
    );

    let cache = Arc::new(SnapshotCache::new());
    let hub = Arc::new(BroadcastHub::new(Arc::clone(&cache)));
    let price_source = source::build_source(&config.source)?;

    let poller = Poller::new(
        price_source,
        Arc::clone(&cache),
        Arc::clone(&hub),
        Duration::from_secs(config.poll.interval_secs),
    );
    let mut poller_handle = tokio::spawn(poller.run());

    let state = Arc::new(ApiState { hub });
    let router = api::create_router(state, &config.server.allowed_origins)?;

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    let mut server_handle = tokio::spawn(async move { axum::serve(listener, router).await });

    tokio::select! {
        res = &mut poller_handle => {
            match res {
                Ok(()) => warn!("poller exited"),
                Err(err) => warn!(error = %err, "poller task panicked"),
            }
        }
        res = &mut server_handle => {
            match res {
                Ok(Ok(())) => warn!("server exited"),
                Ok(Err(err)) => warn!(error = %err, "server returned error"),
                Err(err) => warn!(error = %err, "server task panicked"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
    }

    poller_handle.abort();
    server_handle.abort();

    Ok(())
}
