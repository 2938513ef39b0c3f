//! Solace - a counseling chat served to the browser
//!
//! Keeps one conversation thread on disk and relays each turn, with the
//! prior turns as context, to a hosted chat-completion model.

mod api;
mod config;
mod llm;
mod persona;
mod request;
mod sanitize;
mod session;
mod store;
#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use config::AppConfig;
use llm::{LlmService, LoggingService, OpenAIService};
use request::RequestClient;
use sanitize::WordListFilter;
use session::SessionController;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{CredentialStore, KvStore, MessageStore, SqliteKv};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solace=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKv::open(&config.db_path)?);

    let credentials = CredentialStore::new(kv.clone());
    if !credentials.is_present() {
        tracing::warn!("No API key stored yet. The browser will ask for one.");
    }

    let openai = OpenAIService::new(&config.base_url, config.request_timeout)?;
    let service: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(openai)));
    tracing::info!(
        base_url = %config.base_url,
        default_model = %config.default_model,
        "LLM client initialized"
    );

    let controller = SessionController::new(
        MessageStore::load(kv),
        credentials,
        RequestClient::new(service),
        Arc::new(WordListFilter::with_extra_words(&config.blocked_words)),
    );
    let state = AppState::new(controller, config.default_model);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Solace server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
