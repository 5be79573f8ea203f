//! Out-of-band notifications consumed by the story core.

use serde::{Deserialize, Serialize};

use crate::token::JobToken;

/// Emitted by the image service when a job finished rendering.
///
/// Delivery is at-least-once and unordered across tokens: the same
/// notification may arrive twice, and a later job may finish first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCompleted {
    /// Token of the job that finished.
    pub token: JobToken,
    /// Path-like identifier of the rendered image.
    pub rendered_ref: String,
}

impl ImageCompleted {
    /// Creates a completion notification.
    #[must_use]
    pub fn new(token: JobToken, rendered_ref: impl Into<String>) -> Self {
        Self {
            token,
            rendered_ref: rendered_ref.into(),
        }
    }
}
