use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod backends;
mod config;
mod dispatch;
mod logging;
mod server;
mod transform;
mod types;

use backends::GeminiClient;
use config::load_config;
use dispatch::Dispatcher;
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration. A missing API key stops the process before the
    // listener is bound.
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let config = load_config(&config_path)?;

    init_tracing(&config.logging.level);
    tracing::info!(
        config_path = %config_path,
        from_file = Path::new(&config_path).exists(),
        base_url = %config.gemini.base_url,
        fallback_model = %config.gemini.fallback_model,
        "Configuration loaded"
    );

    let client = Arc::new(GeminiClient::new(&config.gemini)?);
    let dispatcher = Dispatcher::from_config(client, &config.gemini, &config.logging);
    tracing::info!(
        max_attempts = dispatcher.max_attempts(),
        "Dispatcher ready"
    );

    let app = server::router(AppState {
        dispatcher: Arc::new(dispatcher),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("LLM gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("llm_gateway_rust={},tower_http=info", level).into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
