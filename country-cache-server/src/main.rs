use anyhow::Result;
use country_cache_server::bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    // Bootstrap the application (setup logging, DB, refresh pipeline, API router)
    let app = bootstrap::setup().await?;

    let listener = tokio::net::TcpListener::bind(app.socket_addr).await?;
    tracing::info!("HTTP server listening on http://{}", app.bind_address);

    axum::serve(listener, app.router.clone())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
