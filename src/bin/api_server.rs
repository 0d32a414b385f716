// src/bin/api_server.rs

use profile_booking_service::infra::{config::Config, telemetry};
use profile_booking_service::transport::http::{self, AppState};
use profile_booking_service::{app, PersistenceGateway};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    // --- Configuration ---
    let config = Config::from_env()?;
    info!(backend = ?config.storage, port = config.port, "configuration loaded");

    // --- Storage + Gateway Initialization ---
    let store = app::open_store(&config).await?;
    let app_state = AppState::new(PersistenceGateway::new(store));

    // --- API Server Initialization ---
    let router = http::app(app_state);
    let address = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("API server listening on http://{}", address);
    info!("Swagger UI available at http://{}/swagger-ui", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
