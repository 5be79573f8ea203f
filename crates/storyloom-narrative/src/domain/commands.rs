//! Commands for the narrative context.

use storyloom_core::command::Command;
use storyloom_core::token::JobToken;
use uuid::Uuid;

use super::character::CharacterSeed;

/// Command to open a new story from a character seed.
#[derive(Debug, Clone)]
pub struct StartStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character the story is about.
    pub seed: CharacterSeed,
}

/// Command to drive one user turn.
#[derive(Debug, Clone)]
pub struct SubmitTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story this turn belongs to.
    pub session_id: Uuid,
    /// What the user wants to happen next.
    pub text: String,
}

/// Command to re-drive a turn whose model call failed.
#[derive(Debug, Clone)]
pub struct RetryTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story whose unanswered turn should be retried.
    pub session_id: Uuid,
}

/// Command carrying an image-service completion notification.
#[derive(Debug, Clone)]
pub struct CompleteImage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Token of the finished job.
    pub token: JobToken,
    /// Where the rendered image was written.
    pub rendered_ref: String,
}

/// Command to end a story and release its completion subscription.
#[derive(Debug, Clone)]
pub struct EndStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story to end.
    pub session_id: Uuid,
}

impl Command for StartStory {
    fn command_type(&self) -> &'static str {
        "narrative.start_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        None
    }
}

impl Command for SubmitTurn {
    fn command_type(&self) -> &'static str {
        "narrative.submit_turn"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}

impl Command for RetryTurn {
    fn command_type(&self) -> &'static str {
        "narrative.retry_turn"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}

impl Command for CompleteImage {
    fn command_type(&self) -> &'static str {
        "narrative.complete_image"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.token.session_id())
    }
}

impl Command for EndStory {
    fn command_type(&self) -> &'static str {
        "narrative.end_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}
