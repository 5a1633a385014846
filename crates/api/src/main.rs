use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ordercast_events::{AmqpBroker, EventDispatcher, EventPublisher, Hub, QueuePublisher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ordercast_api::config::ServerConfig;
use ordercast_api::router::build_app_router;
use ordercast_api::shutdown::join_with_grace;
use ordercast_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ordercast_api=debug,ordercast_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Session hub ---
    let (hub, hub_task) = Hub::start();

    // --- Queue publisher (optional) ---
    let broker = AmqpBroker::new(config.queue.url.clone());
    let publisher = match QueuePublisher::connect(&broker, &config.queue).await {
        Ok(publisher) => {
            tracing::info!(queue = %publisher.queue_name(), "Queue publisher connected");
            Some(Arc::new(publisher))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Queue unavailable, continuing without publisher");
            None
        }
    };

    let dispatcher = EventDispatcher::new(
        hub.clone(),
        publisher
            .clone()
            .map(|p| p as Arc<dyn EventPublisher>),
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        hub: hub.clone(),
        dispatcher,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let ip = match config.host.parse() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let ws_count = hub.session_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket sessions");
    hub.shutdown().await;
    join_with_grace("session hub", hub_task, Duration::from_secs(5)).await;

    if let Some(publisher) = publisher {
        publisher.close().await;
        tracing::info!("Queue publisher closed");
    }

    tracing::info!("Graceful shutdown complete");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
