use anyhow::{Context, Result};
use isoterma_weather::OpenMeteoClient;
use isoterma_weather::client::FORECAST_TIMEOUT;
use reqwest::Client as HTTPClient;
use state::AppState;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod logging;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .without_time()
        .init();

    let config = config::config()?;
    let http_client = HTTPClient::builder().timeout(FORECAST_TIMEOUT).build()?;
    let state = AppState::new(config, OpenMeteoClient::from_env(http_client));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    logging::Logger::new().info(
        "server.started",
        &format!(
            "Listening on {} with farms from {}",
            config.bind_addr,
            config.farms_file.display()
        ),
    );
    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
