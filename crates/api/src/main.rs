use anyhow::Context;

use gatekeeper_api::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    gatekeeper_observability::init();

    let config = ApiConfig::from_env().context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let app = gatekeeper_api::build_app(&config)
        .await
        .context("building application")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
