//! Routes for story sessions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use storyloom_narrative::application::orchestrator::SettledTurn;
use storyloom_narrative::application::query_handlers::{self, StoryView};
use storyloom_narrative::application::command_handlers;
use storyloom_narrative::domain::character::CharacterSeed;
use storyloom_narrative::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct StartStoryRequest {
    /// Description of the base character.
    pub description: String,
    /// Path of the base character image.
    pub image_path: String,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct StartStoryResponse {
    /// Identifier of the new story.
    pub session_id: Uuid,
}

/// Request body for POST /{id}/turns.
#[derive(Debug, Deserialize)]
pub struct SubmitTurnRequest {
    /// What the user wants to happen next.
    pub text: String,
}

/// POST /
#[instrument(skip(state, request))]
async fn start_story(
    State(state): State<AppState>,
    Json(request): Json<StartStoryRequest>,
) -> Result<(StatusCode, Json<StartStoryResponse>), ApiError> {
    let command = commands::StartStory {
        correlation_id: Uuid::new_v4(),
        seed: CharacterSeed::new(request.description, request.image_path),
    };

    let session_id = command_handlers::handle_start_story(&command, &state.sessions)?;

    Ok((StatusCode::CREATED, Json(StartStoryResponse { session_id })))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_story(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let view = query_handlers::get_story_by_id(session_id, &state.sessions)?;
    Ok(Json(view))
}

/// POST /{id}/turns
#[instrument(skip(state, request))]
async fn submit_turn(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitTurnRequest>,
) -> Result<Json<SettledTurn>, ApiError> {
    let command = commands::SubmitTurn {
        correlation_id: Uuid::new_v4(),
        session_id,
        text: request.text,
    };

    let settled = command_handlers::handle_submit_turn(&command, &state.sessions).await?;

    Ok(Json(settled))
}

/// POST /{id}/turns/retry
#[instrument(skip(state))]
async fn retry_turn(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SettledTurn>, ApiError> {
    let command = commands::RetryTurn {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    let settled = command_handlers::handle_retry_turn(&command, &state.sessions).await?;

    Ok(Json(settled))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn end_story(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::EndStory {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    command_handlers::handle_end_story(&command, &state.sessions)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for story sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_story))
        .route("/{id}", get(get_story).delete(end_story))
        .route("/{id}/turns", post(submit_turn))
        .route("/{id}/turns/retry", post(retry_turn))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use serde_json::Value;
    use storyloom_core::model::{ModelError, StoryContinuation};
    use storyloom_narrative::application::completion::CompletionChannel;
    use storyloom_narrative::application::orchestrator::{Collaborators, StorySettings};
    use storyloom_narrative::application::sessions::StorySessions;
    use storyloom_test_support::{
        FailingDispatcher, FixedClock, RecordingDispatcher, ScriptedModel, SequentialIds,
    };
    use tower::ServiceExt;

    fn app_state_with(
        model: ScriptedModel,
        images: Arc<dyn storyloom_core::imaging::ImageJobDispatcher>,
    ) -> AppState {
        let collaborators = Collaborators {
            model: Arc::new(model),
            images,
            ids: Arc::new(SequentialIds::new()),
            clock: Arc::new(FixedClock(Utc::now())),
        };
        let settings = StorySettings {
            persona: "persona".into(),
            output_dir: PathBuf::from("/out"),
        };
        AppState::new(Arc::new(StorySessions::new(
            collaborators,
            settings,
            CompletionChannel::default(),
        )))
    }

    fn test_app_state(model: ScriptedModel) -> AppState {
        app_state_with(model, Arc::new(RecordingDispatcher::new()))
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn open_story(state: &AppState) -> Uuid {
        state
            .sessions
            .start(&CharacterSeed::new("a fox", "/seed.png"))
            .unwrap()
            .session_id()
    }

    #[tokio::test]
    async fn test_start_story_returns_201_with_session_id() {
        // Arrange
        let app = router().with_state(test_app_state(ScriptedModel::default()));
        let body = serde_json::json!({ "description": "a fox", "image_path": "/seed.png" });

        // Act
        let response = app.oneshot(json_request("POST", "/", &body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        Uuid::parse_str(json["session_id"].as_str().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_start_story_with_blank_image_returns_400() {
        let app = router().with_state(test_app_state(ScriptedModel::default()));
        let body = serde_json::json!({ "description": "a fox", "image_path": "" });

        let response = app.oneshot(json_request("POST", "/", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_start_story_returns_422_for_missing_fields() {
        let app = router().with_state(test_app_state(ScriptedModel::default()));

        let response = app
            .oneshot(json_request("POST", "/", &serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_submit_turn_returns_settled_turn() {
        // Arrange
        let state = test_app_state(ScriptedModel::replying(
            "The fox found a river.",
            "add a river background",
        ));
        let session_id = open_story(&state);
        let app = router().with_state(state);
        let body = serde_json::json!({ "text": "it finds a river" });

        // Act
        let response = app
            .oneshot(json_request("POST", &format!("/{session_id}/turns"), &body))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["narration"], "The fox found a river.");
        assert_eq!(json["image_prompt"], "add a river background");
        assert!(
            json["job_token"]
                .as_str()
                .unwrap()
                .starts_with(&session_id.to_string())
        );
    }

    #[tokio::test]
    async fn test_submit_empty_turn_returns_400() {
        let state = test_app_state(ScriptedModel::default());
        let session_id = open_story(&state);
        let app = router().with_state(state);

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/{session_id}/turns"),
                &serde_json::json!({ "text": "   " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_turn_with_malformed_reply_returns_502_contract_violation() {
        let state = test_app_state(ScriptedModel::new(vec![Err(
            ModelError::ContractViolation("no image_prompt".into()),
        )]));
        let session_id = open_story(&state);
        let app = router().with_state(state);

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/{session_id}/turns"),
                &serde_json::json!({ "text": "go on" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "model_contract_violation");
    }

    #[tokio::test]
    async fn test_submit_turn_with_failing_dispatch_returns_502_image_job_error() {
        let state = app_state_with(
            ScriptedModel::replying("The fox ran.", "make it run"),
            Arc::new(FailingDispatcher),
        );
        let session_id = open_story(&state);
        let app = router().with_state(state);

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/{session_id}/turns"),
                &serde_json::json!({ "text": "run" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await["error"],
            "image_job_submission_error"
        );
    }

    #[tokio::test]
    async fn test_submit_turn_to_unknown_story_returns_404() {
        let app = router().with_state(test_app_state(ScriptedModel::default()));

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/{}/turns", Uuid::new_v4()),
                &serde_json::json!({ "text": "hello" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "session_not_found");
    }

    #[tokio::test]
    async fn test_retry_turn_after_transport_failure_settles() {
        // Arrange
        let model = ScriptedModel::new(vec![
            Err(ModelError::Transport("timeout".into())),
            Ok(StoryContinuation::new("The fox swam.", "add water")),
        ]);
        let state = test_app_state(model);
        let session_id = open_story(&state);
        let first = router()
            .with_state(state.clone())
            .oneshot(json_request(
                "POST",
                &format!("/{session_id}/turns"),
                &serde_json::json!({ "text": "swim" }),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::BAD_GATEWAY);

        // Act
        let response = router()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/{session_id}/turns/retry"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["narration"], "The fox swam.");
    }

    #[tokio::test]
    async fn test_retry_without_unanswered_turn_returns_400() {
        let state = test_app_state(ScriptedModel::default());
        let session_id = open_story(&state);
        let app = router().with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/{session_id}/turns/retry"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_story_returns_view() {
        let state = test_app_state(ScriptedModel::default());
        let session_id = open_story(&state);
        let app = router().with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/{session_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["session_id"], session_id.to_string());
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["reference_image"], "/seed.png");
        assert_eq!(json["segments"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_end_story_returns_204_then_404() {
        // Arrange
        let state = test_app_state(ScriptedModel::default());
        let session_id = open_story(&state);
        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri(format!("/{session_id}"))
                .body(Body::empty())
                .unwrap()
        };

        // Act
        let first = router()
            .with_state(state.clone())
            .oneshot(delete())
            .await
            .unwrap();
        let second = router().with_state(state).oneshot(delete()).await.unwrap();

        // Assert
        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }
}
