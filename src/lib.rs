use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod analysis;
pub mod auth;
pub mod auth_service;
pub mod context;
pub mod db;
pub mod health;
pub mod image_service;
pub mod routes;
pub mod user_service;

pub use stegano_config as config;
pub use stegano_error as error;

use config::Config;
use context::AppContext;

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(app_context: AppContext, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = routes::create_router(Arc::new(app_context));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

pub async fn run() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_address = config.listen_address();
    let app_context = AppContext::initialize(config).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Stegano gateway listening on {}", bind_address);

    serve(app_context, listener, async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received. Shutting down...");
    })
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
