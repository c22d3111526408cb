use anyhow::Result;
use outflow_server::config::ServiceConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    let app = outflow_server::build(&config)?;

    app.dispatcher.start().await;

    let router = outflow_server::router(app.state, &config.allowed_origins)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, workers = config.worker_count, "outflow server listening");

    axum::serve(listener, router).await?;
    Ok(())
}
