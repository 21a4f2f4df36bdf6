use std::sync::Arc;

use dotenvy::dotenv;
use markdown_converter::{
    AppState, Config, ConversionService, Converter, MarkItDownCli, server,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,markdown_converter=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let engine = MarkItDownCli::new(&config.engine);
    match engine.probe().await {
        Ok(version) => tracing::info!(program = engine.program(), %version, "converter available"),
        Err(e) => tracing::warn!(
            program = engine.program(),
            error = %e,
            "converter not available, conversions will fail until it is installed"
        ),
    }

    let service = ConversionService::new(Converter::new(Arc::new(engine)))
        .with_upload_dir(config.upload_dir.clone());

    if config.auth_token.is_some() {
        tracing::info!("token auth enabled for /api endpoints");
    } else {
        tracing::info!("token auth disabled (API_AUTH_TOKEN is empty or not set)");
    }

    let state = AppState::new(service)
        .with_auth_token(config.auth_token.clone())
        .with_max_upload_bytes(config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("markdown converter listening on http://{}", config.addr);

    server::serve(listener, state).await?;

    Ok(())
}
