use futures::future::join_all;
use slack_hub_relay::config::{Settings, load_settings};
use slack_hub_relay::error::Result;
use slack_hub_relay::logging::{self, log_error};
use slack_hub_relay::relay::{EventRouter, LogCache, WorkspaceHandle, Workspaces};
use slack_hub_relay::slack::{EventListener, RelayEvent, SlackClient};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Per-workspace event queue depth
const EVENT_QUEUE_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    logging::init_tracing();

    tracing::info!("Starting Slack hub relay");

    let settings = load_settings()?;
    tracing::info!(
        hub = %settings.hub.name,
        workspaces = settings.workspaces.len(),
        prefix = %settings.relay.channel_prefix,
        "Configuration loaded"
    );

    let hub_client = Arc::new(SlackClient::new(&settings.hub)?);
    let source_clients = settings
        .workspaces
        .iter()
        .map(|ws| SlackClient::new(ws).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;

    let workspaces = Arc::new(Workspaces::new(
        WorkspaceHandle::new(settings.hub.name.clone(), hub_client.clone()),
        source_clients
            .iter()
            .map(|client| WorkspaceHandle::new(client.workspace(), client.clone())),
    ));

    let log_cache = Arc::new(LogCache::new(
        settings.relay.cache_capacity,
        settings.relay.cache_ttl,
    ));

    let router = Arc::new(EventRouter::new(
        workspaces.clone(),
        log_cache.clone(),
        &settings.relay,
    ));

    spawn_sweeper(&settings, workspaces.clone(), log_cache.clone());

    let mut listeners = Vec::with_capacity(source_clients.len() + 1);
    for client in source_clients {
        let (tx, rx) = mpsc::channel::<RelayEvent>(EVENT_QUEUE_SIZE);
        tokio::spawn(router.clone().consume_source(client.workspace().to_string(), rx));
        listeners.push(spawn_listener(client, tx));
    }

    let (hub_tx, hub_rx) = mpsc::channel::<RelayEvent>(EVENT_QUEUE_SIZE);
    tokio::spawn(router.clone().consume_hub(hub_rx));
    listeners.push(spawn_listener(hub_client, hub_tx));

    tracing::info!(listeners = listeners.len(), "All listeners started");

    tokio::select! {
        _ = join_all(listeners) => {
            tracing::info!("All listeners stopped");
        }
        signal_name = setup_shutdown_handler() => {
            tracing::info!(signal = %signal_name, "Received shutdown signal");
        }
    }

    tracing::info!(cached_entries = log_cache.len(), "Shutdown complete");
    Ok(())
}

fn spawn_listener(client: Arc<SlackClient>, tx: mpsc::Sender<RelayEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let workspace = client.workspace().to_string();
        if let Err(e) = EventListener::new(client).start(tx).await {
            tracing::error!(workspace = %workspace, "Listener failed");
            log_error("event_listener", &e);
        }
    })
}

/// Periodically drop expired log entries and stale metadata
fn spawn_sweeper(settings: &Settings, workspaces: Arc<Workspaces>, log_cache: Arc<LogCache>) {
    let period = settings.relay.cache_sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = log_cache.evict_expired();
            workspaces.cleanup_metadata().await;
            tracing::debug!(
                evicted = evicted,
                remaining = log_cache.len(),
                "Cache sweep complete"
            );
        }
    });
}

/// Wait for SIGINT, SIGTERM or SIGQUIT (Ctrl+C only off Unix)
async fn setup_shutdown_handler() -> String {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        let (Ok(mut sigint), Ok(mut sigterm), Ok(mut sigquit)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) else {
            tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C");
            let _ = signal::ctrl_c().await;
            return "Ctrl+C".to_string();
        };

        tokio::select! {
            _ = sigint.recv() => "SIGINT (Ctrl+C)".to_string(),
            _ = sigterm.recv() => "SIGTERM".to_string(),
            _ = sigquit.recv() => "SIGQUIT".to_string(),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        "Ctrl+C".to_string()
    }
}

