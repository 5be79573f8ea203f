//! `ImageJobDispatcher` posting jobs to an HTTP render service.
//!
//! The service accepts the job, renders it out of band, and later posts the
//! result to `callback_url`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use storyloom_core::imaging::{DispatchError, ImageJobDispatcher, ImageJobRequest};
use tracing::{info, instrument, warn};

/// Upper bound on handing a job to the render service.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Render-service client.
#[derive(Debug, Clone)]
pub struct RenderServiceDispatcher {
    client: Client,
    endpoint: String,
    callback_url: String,
}

#[derive(Debug, Serialize)]
struct RenderJob<'a> {
    #[serde(flatten)]
    request: &'a ImageJobRequest,
    callback_url: &'a str,
}

impl RenderServiceDispatcher {
    /// Creates a dispatcher posting to `endpoint`. Completions are requested
    /// at `callback_url`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the HTTP client cannot be
    /// built.
    pub fn new(
        endpoint: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(SUBMIT_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            callback_url: callback_url.into(),
        })
    }

    /// Where the render service is asked to report completions.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

#[async_trait]
impl ImageJobDispatcher for RenderServiceDispatcher {
    #[instrument(skip(self, request), fields(token = %request.output_token))]
    async fn submit(&self, request: ImageJobRequest) -> Result<(), DispatchError> {
        let job = RenderJob {
            request: &request,
            callback_url: &self.callback_url,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&job)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "render service unreachable");
                DispatchError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "render service refused job");
            return Err(DispatchError(format!("render service answered {status}: {body}")));
        }

        info!(output_path = %request.output_path, "image job accepted");
        Ok(())
    }
}
