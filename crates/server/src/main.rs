//! `hookrelay-server` -- ComfyUI completion webhook relay.
//!
//! Receives prompt submission and completion hooks from a ComfyUI host,
//! remembers which client queued each prompt, and posts a
//! `workflow_completed` event to the configured endpoint when the prompt
//! finishes.
//!
//! # Environment variables
//!
//! | Variable            | Required | Default   | Description                          |
//! |---------------------|----------|-----------|--------------------------------------|
//! | `EVENT_WEBHOOK_URL` | yes      | --        | Endpoint receiving completion events |
//! | `HOST`              | no       | `0.0.0.0` | Bind address                         |
//! | `PORT`              | no       | `8190`    | Bind port                            |
//! | `RUST_LOG`          | no       | see below | `tracing` filter directives          |
//! | `LOG_FORMAT`        | no       | `text`    | `text` or `json`                     |

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use hookrelay_comfyui::CorrelationTracker;
use hookrelay_events::WebhookDelivery;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookrelay_server::config::{LogFormat, RelayConfig};
use hookrelay_server::router::build_app_router;
use hookrelay_server::state::AppState;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str =
    "hookrelay_server=info,hookrelay_comfyui=info,hookrelay_events=info,tower_http=info";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing(LogFormat::from_env());

    // --- Configuration ---
    let config = RelayConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %config.host,
        port = config.port,
        webhook_url = %config.webhook_url,
        "Loaded relay configuration",
    );

    // --- Tracker ---
    let delivery = Arc::new(WebhookDelivery::new(config.webhook_url.clone()));
    let tracker = Arc::new(CorrelationTracker::new(delivery));

    let state = AppState {
        tracker: Arc::clone(&tracker),
    };
    let app = build_app_router(state);

    // --- Start server ---
    let ip: IpAddr = config.host.parse().unwrap_or_else(|e| {
        tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
        std::process::exit(1);
    });
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting hookrelay server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // Entries still pending are lost; the map is not persisted.
    let pending_jobs = tracker.pending_count().await;
    tracing::info!(pending_jobs, "Graceful shutdown complete");
}

/// Install the global tracing subscriber.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
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
