//! Shared application state.

use std::sync::Arc;

use storyloom_narrative::application::sessions::StorySessions;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every live story and the completion channel they listen on.
    pub sessions: Arc<StorySessions>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(sessions: Arc<StorySessions>) -> Self {
        Self { sessions }
    }
}
