use anyhow::Context;

use maison_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    maison_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let services = maison_api::app::services::build_services(&config)
        .await
        .context("failed to initialise services")?;
    let app = maison_api::app::build_app(services);

    let address = config.app_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
