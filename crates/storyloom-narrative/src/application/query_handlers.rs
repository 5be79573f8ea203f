//! Query handlers for the narrative context.
//!
//! These return read-only views of a story for display.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyloom_core::error::StoryError;
use uuid::Uuid;

use super::orchestrator::TurnPhase;
use super::sessions::StorySessions;
use crate::domain::segments::StorySegment;

/// Read-only view of a story.
#[derive(Debug, Serialize)]
pub struct StoryView {
    /// The story identifier.
    pub session_id: Uuid,
    /// When the story was opened.
    pub started_at: DateTime<Utc>,
    /// Where the story is in its turn cycle.
    pub phase: TurnPhase,
    /// The image the next illustration will be edited from.
    pub reference_image: String,
    /// Instruction of a turn whose model call failed, if any.
    pub pending_user_turn: Option<String>,
    /// Number of illustrations still rendering.
    pub pending_images: usize,
    /// Number of conversation entries, system persona included.
    pub conversation_entries: usize,
    /// Number of turns the model has answered.
    pub completed_turns: usize,
    /// The timeline in narrative order.
    pub segments: Vec<StorySegment>,
}

/// Retrieves a story by its id.
///
/// # Errors
///
/// Returns `StoryError::SessionNotFound` if no live story has this id.
pub fn get_story_by_id(
    session_id: Uuid,
    sessions: &StorySessions,
) -> Result<StoryView, StoryError> {
    Ok(sessions.get(session_id)?.view())
}
