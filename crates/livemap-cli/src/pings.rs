//! `livemap pings`.

use std::sync::Arc;
use std::time::Duration;

use livemap_core::AppConfig;
use livemap_pings::{PingLayer, PingPoller};
use tokio::sync::{watch, RwLock};

/// Polls until ctrl-c (or until `limit` pings arrive), then prints the layer
/// as JSON.
///
/// # Errors
///
/// Returns an error if no bot token is configured or polling gives up after
/// repeated failures.
pub(crate) async fn run_pings(config: &AppConfig, limit: Option<usize>) -> anyhow::Result<()> {
    let layer = Arc::new(RwLock::new(PingLayer::with_max_retained(
        config.pings_max_retained,
    )));
    let Some(mut poller) = PingPoller::from_config(config, Arc::clone(&layer))? else {
        anyhow::bail!("TELEGRAM_BOT_TOKEN is required for `livemap pings`");
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut task = tokio::spawn(async move { poller.run(stop_rx).await });
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    // The layer never holds more than its retention cap.
    let limit = limit.map(|n| n.min(config.pings_max_retained));

    let finished = loop {
        tokio::select! {
            joined = &mut task => break Some(joined?),
            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::info!("interrupted; stopping ping poller");
                break None;
            }
            _ = tick.tick() => {
                if let Some(limit) = limit {
                    if layer.read().await.len() >= limit {
                        tracing::info!(limit, "ping limit reached");
                        break None;
                    }
                }
            }
        }
    };

    let result = match finished {
        Some(result) => result,
        None => {
            let _ = stop_tx.send(true);
            task.await?
        }
    };

    let view = layer.read().await.view();
    println!("{}", serde_json::to_string_pretty(&view)?);
    result.map_err(Into::into)
}
