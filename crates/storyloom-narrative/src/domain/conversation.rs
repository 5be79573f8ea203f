//! The conversation log sent to the language model on every turn.

use storyloom_core::error::StoryError;
use storyloom_core::model::{ChatMessage, Role};

/// Role-tagged message history.
///
/// Opens with exactly one system entry. After that, user and assistant
/// entries strictly alternate: a user entry may only follow the system entry
/// or an assistant entry, and an assistant entry may only answer a user entry.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    entries: Vec<ChatMessage>,
}

impl ConversationLog {
    /// Creates a log holding only the system persona.
    #[must_use]
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            entries: vec![ChatMessage::system(persona)],
        }
    }

    /// Appends a user entry.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if the previous user entry has not
    /// been answered yet.
    pub fn record_user(&mut self, content: impl Into<String>) -> Result<(), StoryError> {
        if self.awaiting_reply() {
            return Err(StoryError::Validation(
                "the previous user turn has not been answered".to_owned(),
            ));
        }
        self.entries.push(ChatMessage::user(content));
        Ok(())
    }

    /// Appends an assistant entry answering the latest user entry.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if there is no unanswered user entry.
    pub fn record_assistant(&mut self, content: impl Into<String>) -> Result<(), StoryError> {
        if !self.awaiting_reply() {
            return Err(StoryError::Validation(
                "there is no user turn to answer".to_owned(),
            ));
        }
        self.entries.push(ChatMessage::assistant(content));
        Ok(())
    }

    /// Returns `true` if the last entry is a user turn with no reply yet.
    #[must_use]
    pub fn awaiting_reply(&self) -> bool {
        self.entries
            .last()
            .is_some_and(|entry| entry.role == Role::User)
    }

    /// All entries, system persona first.
    #[must_use]
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Number of entries, including the system persona.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the persona entry is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of answered turns.
    #[must_use]
    pub fn completed_turns(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.role == Role::Assistant)
            .count()
    }
}
