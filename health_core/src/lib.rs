//! Health aggregation for applications and their dependencies.
//!
//! Services are registered into named groups on a [`Health`] registry. Each
//! call to [`Health::status`] runs every check and returns an immutable
//! [`Summary`] that answers overall and essential-only health questions and
//! renders the full report. The HTTP handlers in [`handlers`] expose that
//! report.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;

pub use bootstrap::build_health;
pub use config::AppConfig;
pub use error::{HealthError, Result};
pub use handlers::routes::create_routes;
pub use health::{CallableService, Health, MemoryService, Service, Status, StatusSummary, Summary};

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<Health>,
    pub concurrent_checks: bool,
}

impl AppState {
    pub fn new(health: Health) -> Self {
        Self {
            health: Arc::new(health),
            concurrent_checks: false,
        }
    }

    pub fn with_concurrent_checks(mut self, concurrent_checks: bool) -> Self {
        self.concurrent_checks = concurrent_checks;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
