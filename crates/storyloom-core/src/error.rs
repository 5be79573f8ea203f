//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::token::JobToken;

/// Errors surfaced to callers of the story core.
///
/// Every variant is returned synchronously from the operation that caused it.
/// None of them is retried automatically.
#[derive(Debug, Error)]
pub enum StoryError {
    /// Input was rejected before any state was touched.
    #[error("validation error: {0}")]
    Validation(String),

    /// A turn is already between submission and image-job dispatch.
    #[error("a turn is already in flight for this story")]
    ReentrantSubmission,

    /// The language model answered, but not with a usable continuation.
    #[error("model contract violation: {0}")]
    ModelContractViolation(String),

    /// The language model could not be reached or did not answer in time.
    #[error("model transport error: {0}")]
    ModelTransport(String),

    /// The image job could not be handed to the image service.
    #[error("image job submission failed for {token}: {reason}")]
    ImageJobSubmission {
        /// The token of the job whose dispatch failed.
        token: JobToken,
        /// Why the dispatch failed.
        reason: String,
    },

    /// No live story session has this identifier.
    #[error("story session not found: {0}")]
    SessionNotFound(Uuid),
}
