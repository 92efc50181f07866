use std::sync::Arc;

use anyhow::Context;

use lovespark::config::AppConfig;
use lovespark::subscription::spawn_reset_ticker;
use lovespark::{AppServices, app_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("💘 loveSpark v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Notifications: ws://0.0.0.0:{}/ws/notifications", config.port);
    eprintln!(
        "   Backend: {}",
        config
            .backend
            .as_ref()
            .map(|b| b.url.as_str())
            .unwrap_or("demo (in-process)")
    );

    let services = AppServices::build(&config)
        .await
        .with_context(|| format!("Failed to start with database {}", config.db_path.display()))?;

    let ticker = spawn_reset_ticker(
        Arc::clone(&services.subscription),
        config.reset_check_interval,
    );

    let app = app_router(&services);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    ticker.abort();
    Ok(())
}
