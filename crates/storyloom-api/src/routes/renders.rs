//! Webhook the render service calls when an image job finishes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use storyloom_core::token::JobToken;
use tracing::instrument;
use uuid::Uuid;

use storyloom_narrative::application::command_handlers;
use storyloom_narrative::domain::commands;

use crate::state::AppState;

/// Request body for POST /completed.
#[derive(Debug, Deserialize)]
pub struct RenderCompletedRequest {
    /// Token the job was submitted with, `<session>:<job>`.
    pub output_token: JobToken,
    /// Where the rendered image was written.
    pub result: String,
}

/// Response body for POST /completed.
#[derive(Debug, Serialize)]
pub struct RenderCompletedResponse {
    /// 1 if the story owning the token is live and received it, 0 otherwise.
    pub delivered: usize,
}

/// POST /completed
///
/// Always accepted: a token no story is waiting for is absorbed.
#[instrument(skip(state, request), fields(token = %request.output_token))]
async fn render_completed(
    State(state): State<AppState>,
    Json(request): Json<RenderCompletedRequest>,
) -> (StatusCode, Json<RenderCompletedResponse>) {
    let command = commands::CompleteImage {
        correlation_id: Uuid::new_v4(),
        token: request.output_token,
        rendered_ref: request.result,
    };

    let delivered = command_handlers::handle_complete_image(&command, &state.sessions);

    (
        StatusCode::ACCEPTED,
        Json(RenderCompletedResponse { delivered }),
    )
}

/// Returns the router for render-service callbacks.
pub fn router() -> Router<AppState> {
    Router::new().route("/completed", post(render_completed))
}
