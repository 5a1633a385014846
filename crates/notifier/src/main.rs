use std::sync::Arc;
use std::time::Duration;

use ordercast_events::{AmqpBroker, QueueConsumer, QueueError};
use ordercast_notifier::{
    run_action_listener, ActionInvoked, NotificationSink, NotificationSurface, NotifierConfig,
    SystemUrlOpener,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Buffered clicks awaiting the action listener.
const ACTION_CHANNEL_CAPACITY: usize = 32;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ordercast_notifier=info,ordercast_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match NotifierConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(queue = %config.queue.queue_name, app_url = %config.app_url, "Starting notifier");

    // --- Action listener ---
    let (action_tx, action_rx) = mpsc::channel(ACTION_CHANNEL_CAPACITY);
    let listener_handle = tokio::spawn(run_action_listener(
        action_rx,
        SystemUrlOpener,
        config.app_url.clone(),
    ));

    let sink = NotificationSink::new(build_surface(action_tx), &config);

    // --- Shutdown signal ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    // --- Consumer ---
    let consumer = QueueConsumer::new(AmqpBroker::new(config.queue.url.clone()), &config.queue);
    let result = consumer.run(&sink, cancel).await;

    // Pending desktop notifications may keep the action channel open.
    drop(sink);
    match tokio::time::timeout(Duration::from_secs(1), listener_handle).await {
        Ok(Ok(())) => tracing::debug!("Action listener stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Action listener task failed"),
        Err(_) => tracing::debug!("Action listener still running at shutdown"),
    }

    match result {
        Ok(()) => tracing::info!("Notifier stopped"),
        Err(e @ QueueError::ReconnectExhausted { .. }) => {
            tracing::error!(error = %e, "Giving up on the broker");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "Queue consumer failed");
            std::process::exit(1);
        }
    }
}

#[cfg(all(feature = "desktop-notifications", target_os = "linux"))]
fn build_surface(actions: mpsc::Sender<ActionInvoked>) -> Arc<dyn NotificationSurface> {
    tracing::info!("Using desktop notification surface");
    Arc::new(ordercast_notifier::desktop::DesktopSurface::new(actions))
}

#[cfg(not(all(feature = "desktop-notifications", target_os = "linux")))]
fn build_surface(actions: mpsc::Sender<ActionInvoked>) -> Arc<dyn NotificationSurface> {
    tracing::info!("Desktop notifications not compiled in, logging notifications instead");
    drop(actions);
    Arc::new(ordercast_notifier::LoggingSurface::new())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
