//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use storyloom_narrative::application::completion::CompletionChannel;
use storyloom_narrative::application::orchestrator::{Collaborators, StorySettings};
use storyloom_narrative::application::sessions::StorySessions;
use storyloom_test_support::{FixedClock, RecordingDispatcher, ScriptedModel, SequentialIds};
use tower::ServiceExt;

use storyloom_api::state::AppState;

/// A full app plus handles on its fakes.
pub struct TestApp {
    pub router: Router,
    pub model: Arc<ScriptedModel>,
    pub images: Arc<RecordingDispatcher>,
}

/// Build the full app router over scripted collaborators and a deterministic
/// clock and id generator. Uses the same route structure as `main.rs`.
pub fn build_test_app(model: ScriptedModel) -> TestApp {
    let model = Arc::new(model);
    let images = Arc::new(RecordingDispatcher::new());
    let collaborators = Collaborators {
        model: model.clone(),
        images: images.clone(),
        ids: Arc::new(SequentialIds::new()),
        clock: Arc::new(FixedClock(
            chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
        )),
    };
    let settings = StorySettings {
        persona: "You narrate illustrated stories.".to_string(),
        output_dir: PathBuf::from("generated"),
    };
    let sessions = StorySessions::new(collaborators, settings, CompletionChannel::default());

    TestApp {
        router: storyloom_api::app(AppState::new(Arc::new(sessions))),
        model,
        images,
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a DELETE request and return the response. The body is `Null` when empty.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Poll GET `uri` until `condition` holds on the JSON body, or panic after 2s.
pub async fn get_json_until(
    app: &Router,
    uri: &str,
    condition: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            let (_, json) = get_json(app.clone(), uri).await;
            if condition(&json) {
                return json;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}
