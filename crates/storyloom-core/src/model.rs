//! Language-model collaborator port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The fixed persona that opens every conversation.
    System,
    /// A user turn, carrying the rendered story context.
    User,
    /// A model reply.
    Assistant,
}

/// One role-tagged entry of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// A system entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The model's structured answer to a user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryContinuation {
    /// Narration continuing the story.
    pub text: String,
    /// Edit instruction for the next illustration.
    pub image_prompt: String,
}

impl StoryContinuation {
    /// Creates a continuation.
    pub fn new(text: impl Into<String>, image_prompt: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_prompt: image_prompt.into(),
        }
    }
}

/// Failure reported by a language-model collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The call failed or timed out before an answer arrived.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An answer arrived but did not have the expected shape.
    #[error("malformed reply: {0}")]
    ContractViolation(String),
}

/// Port for the language model that turns a conversation into the next story beat.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Asks the model to continue the story given the full conversation so far.
    async fn continue_story(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<StoryContinuation, ModelError>;
}
