use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    itemsearch_observability::init();

    let config = itemsearch_api::config::ApiConfig::from_env()?;
    let app = itemsearch_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        engine = %config.engine.url,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
