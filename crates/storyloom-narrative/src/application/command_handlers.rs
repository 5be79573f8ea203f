//! Command handlers for the narrative context.
//!
//! Each handler looks up the story the command targets in the session
//! registry and hands the command to it.

use storyloom_core::command::Command;
use storyloom_core::error::StoryError;
use storyloom_core::event::ImageCompleted;
use tracing::info;
use uuid::Uuid;

use super::orchestrator::SettledTurn;
use super::sessions::StorySessions;
use crate::domain::commands::{CompleteImage, EndStory, RetryTurn, StartStory, SubmitTurn};

fn log_command(command: &dyn Command) {
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        session_id = ?command.session_id(),
        "handling command"
    );
}

/// Handles the `StartStory` command: opens a story and returns its id.
///
/// The registry generates the session id.
///
/// # Errors
///
/// Returns `StoryError::Validation` if the seed is blank.
pub fn handle_start_story(
    command: &StartStory,
    sessions: &StorySessions,
) -> Result<Uuid, StoryError> {
    log_command(command);
    let story = sessions.start(&command.seed)?;
    Ok(story.session_id())
}

/// Handles the `SubmitTurn` command.
///
/// # Errors
///
/// Returns `StoryError::SessionNotFound` for an unknown story, and otherwise
/// whatever the turn itself fails with.
pub async fn handle_submit_turn(
    command: &SubmitTurn,
    sessions: &StorySessions,
) -> Result<SettledTurn, StoryError> {
    log_command(command);
    let story = sessions.get(command.session_id)?;
    story.submit_turn(&command.text).await
}

/// Handles the `RetryTurn` command.
///
/// # Errors
///
/// Returns `StoryError::SessionNotFound` for an unknown story, and otherwise
/// whatever the retried turn fails with.
pub async fn handle_retry_turn(
    command: &RetryTurn,
    sessions: &StorySessions,
) -> Result<SettledTurn, StoryError> {
    log_command(command);
    let story = sessions.get(command.session_id)?;
    story.retry_pending_turn().await
}

/// Handles the `CompleteImage` command by publishing it on the completion
/// channel. Returns 1 when the owning story received it, 0 otherwise.
///
/// Never fails: stale and unknown tokens are absorbed downstream.
pub fn handle_complete_image(command: &CompleteImage, sessions: &StorySessions) -> usize {
    log_command(command);
    sessions.completions().publish(ImageCompleted::new(
        command.token,
        command.rendered_ref.clone(),
    ))
}

/// Handles the `EndStory` command.
///
/// # Errors
///
/// Returns `StoryError::SessionNotFound` for an unknown story.
pub fn handle_end_story(command: &EndStory, sessions: &StorySessions) -> Result<(), StoryError> {
    log_command(command);
    sessions.end(command.session_id)
}
