//! Image-generation collaborator port.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::token::JobToken;

/// A request to edit reference images into a new illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageJobRequest {
    /// The edit instruction.
    pub prompt: String,
    /// Images the edit starts from, most relevant first.
    pub reference_images: Vec<String>,
    /// Token the completion notification must carry.
    pub output_token: JobToken,
    /// Where the rendered image should be written.
    pub output_path: String,
}

/// The image service refused or never received the job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DispatchError(pub String);

/// Port for handing image jobs to the rendering service.
///
/// Submission is fire-and-forget: `Ok` only means the job was accepted. The
/// rendered result arrives later as an
/// [`ImageCompleted`](crate::event::ImageCompleted) notification.
#[async_trait]
pub trait ImageJobDispatcher: Send + Sync {
    /// Hands the job to the image service.
    async fn submit(&self, request: ImageJobRequest) -> Result<(), DispatchError>;
}
