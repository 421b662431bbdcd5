mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use livemap_pings::{PingLayer, PingPoller};
use livemap_store::RealtimeDbStore;
use livemap_sync::Syncer;
use tokio::sync::{watch, RwLock};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = livemap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting livemap server");

    let store = RealtimeDbStore::from_config(&config)?;
    let syncer = Arc::new(Syncer::from_config(&config, store)?);
    let pings = Arc::new(RwLock::new(PingLayer::with_max_retained(
        config.pings_max_retained,
    )));

    let (stop_tx, stop_rx) = watch::channel(false);
    let poller = match PingPoller::from_config(&config, Arc::clone(&pings))? {
        Some(mut poller) => Some(tokio::spawn(async move {
            if let Err(e) = poller.run(stop_rx).await {
                tracing::error!(error = %e, "ping poller stopped");
            }
        })),
        None => {
            tracing::info!("TELEGRAM_BOT_TOKEN not set; ping polling disabled");
            None
        }
    };

    let _scheduler = match config.sync_schedule.as_deref() {
        Some(schedule) => Some(scheduler::build_scheduler(Arc::clone(&syncer), schedule).await?),
        None => {
            tracing::info!("scheduled sync disabled");
            None
        }
    };

    let auth = AuthState::from_env(matches!(config.env, livemap_core::Environment::Development))?;
    let app = build_app(AppState { syncer, pings }, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop_tx.send(true);
    if let Some(handle) = poller {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "ping poller task did not exit cleanly");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
