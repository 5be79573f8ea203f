//! Storyloom API server entry point.

use std::sync::Arc;

use storyloom_adapters::{OpenAiChatModel, RenderServiceDispatcher};
use storyloom_api::config::AppConfig;
use storyloom_api::error::AppError;
use storyloom_api::state::AppState;
use storyloom_core::determinism::{RandomIds, SystemClock};
use storyloom_narrative::application::completion::CompletionChannel;
use storyloom_narrative::application::orchestrator::{Collaborators, StorySettings};
use storyloom_narrative::application::sessions::StorySessions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Storyloom API server");

    let config = AppConfig::from_env()?;

    let model = OpenAiChatModel::new(
        config.llm_api_url.as_str(),
        config.llm_api_key.as_str(),
        config.llm_model.as_str(),
    )
    .map_err(|e| AppError::Config(format!("cannot build language model client: {e}")))?;
    let images =
        RenderServiceDispatcher::new(config.render_service_url.as_str(), config.callback_url())
            .map_err(|e| AppError::Config(format!("cannot build render service client: {e}")))?;
    info!(
        model = model.model_name(),
        callback_url = images.callback_url(),
        "Collaborators configured"
    );

    let collaborators = Collaborators {
        model: Arc::new(model),
        images: Arc::new(images),
        ids: Arc::new(RandomIds),
        clock: Arc::new(SystemClock),
    };
    let settings = StorySettings {
        persona: config.persona()?,
        output_dir: config.output_dir.clone(),
    };
    let sessions = StorySessions::new(collaborators, settings, CompletionChannel::default());

    // TODO: Replace CorsLayer::permissive() with the UI's origin once it is deployed separately.
    let app = storyloom_api::app(AppState::new(Arc::new(sessions)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
