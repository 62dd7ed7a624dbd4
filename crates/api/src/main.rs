use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use capmatch_api::{build_router, state::AppState};
use capmatch_config::Settings;
use capmatch_services::{
    dao::{PresenceDao, PresenceStore},
    event::SessionEventProcessor,
    summarizer::{GeminiSummarizer, Summarizer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;

    let db = capmatch_db::connect(&settings.database)
        .await
        .context("failed to connect to MongoDB")?;
    capmatch_db::indexes::ensure_indexes(&db)
        .await
        .context("failed to ensure indexes")?;

    if settings.twilio.auth_token.is_none() {
        tracing::warn!("No Twilio auth token configured, webhook signature checking is disabled");
    }
    if settings.gemini.api_key.is_none() {
        tracing::warn!("No Gemini API key configured, transcripts will not be summarized");
    }

    let store: Arc<dyn PresenceStore> = Arc::new(PresenceDao::new(&db));
    let summarizer: Arc<dyn Summarizer> = Arc::new(GeminiSummarizer::new(settings.gemini.clone()));
    let processor = Arc::new(SessionEventProcessor::new(store, summarizer));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState {
        settings: Arc::new(settings),
        processor,
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Webhook service listening");

    axum::serve(listener, build_router(state))
        .await
        .context("server error")?;

    Ok(())
}
