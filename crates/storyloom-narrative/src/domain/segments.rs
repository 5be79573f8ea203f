//! Story segments — the atomic units of a story timeline.

use serde::{Deserialize, Serialize};
use storyloom_core::token::JobToken;
use uuid::Uuid;

/// Rendering state of an illustration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    /// The image job was requested and has not reported back.
    Pending,
    /// The image job reported a rendered result.
    Completed,
}

/// An illustration in the timeline.
///
/// The only mutation an image segment ever sees is the single
/// `Pending -> Completed` transition, performed by the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSegment {
    id: Uuid,
    prompt: String,
    job_token: JobToken,
    status: ImageStatus,
    rendered_ref: Option<String>,
}

impl ImageSegment {
    /// An illustration whose job has been requested but not rendered.
    #[must_use]
    pub fn pending(id: Uuid, prompt: impl Into<String>, job_token: JobToken) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            job_token,
            status: ImageStatus::Pending,
            rendered_ref: None,
        }
    }

    /// An illustration that already exists, such as the seed character image.
    #[must_use]
    pub fn completed(
        id: Uuid,
        prompt: impl Into<String>,
        job_token: JobToken,
        rendered_ref: impl Into<String>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            job_token,
            status: ImageStatus::Completed,
            rendered_ref: Some(rendered_ref.into()),
        }
    }

    /// Segment identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The edit instruction this illustration was requested with.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Token correlating this segment with its image job.
    #[must_use]
    pub fn job_token(&self) -> JobToken {
        self.job_token
    }

    /// Current rendering state.
    #[must_use]
    pub fn status(&self) -> ImageStatus {
        self.status
    }

    /// Where the rendered image lives, once completed.
    #[must_use]
    pub fn rendered_ref(&self) -> Option<&str> {
        self.rendered_ref.as_deref()
    }

    /// Returns `true` while the image job is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ImageStatus::Pending
    }

    /// Moves a pending segment to `Completed`. Returns `false` and changes
    /// nothing if the segment was already completed.
    pub(crate) fn complete(&mut self, rendered_ref: &str) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = ImageStatus::Completed;
        self.rendered_ref = Some(rendered_ref.to_owned());
        true
    }
}

/// One entry of the story timeline. Insertion order is narrative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorySegment {
    /// Story prose, either the character description or a model continuation.
    Narration {
        /// Segment identifier.
        id: Uuid,
        /// The prose.
        text: String,
    },
    /// A line typed by the user.
    UserInstruction {
        /// Segment identifier.
        id: Uuid,
        /// What the user asked for.
        text: String,
    },
    /// An illustration, pending or rendered.
    Image(ImageSegment),
}

impl StorySegment {
    /// Segment identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::Narration { id, .. } | Self::UserInstruction { id, .. } => *id,
            Self::Image(image) => image.id(),
        }
    }

    /// The illustration, if this segment is one.
    #[must_use]
    pub fn as_image(&self) -> Option<&ImageSegment> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> JobToken {
        JobToken::new(Uuid::from_u128(1), Uuid::from_u128(2))
    }

    #[test]
    fn test_complete_transitions_pending_segment_once() {
        // Arrange
        let mut image = ImageSegment::pending(Uuid::from_u128(3), "add a river", token());

        // Act
        let first = image.complete("/out/river.png");
        let second = image.complete("/out/other.png");

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(image.status(), ImageStatus::Completed);
        assert_eq!(image.rendered_ref(), Some("/out/river.png"));
    }

    #[test]
    fn test_image_segment_serializes_with_kind_tag() {
        let segment = StorySegment::Image(ImageSegment::pending(
            Uuid::from_u128(3),
            "add a river",
            token(),
        ));

        let json = serde_json::to_value(&segment).unwrap();

        assert_eq!(json["kind"], "image");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["prompt"], "add a river");
        assert_eq!(json["job_token"], token().to_string());
        assert!(json["rendered_ref"].is_null());
    }

    #[test]
    fn test_narration_serializes_with_kind_tag() {
        let segment = StorySegment::Narration {
            id: Uuid::from_u128(4),
            text: "Once upon a time".into(),
        };

        let json = serde_json::to_value(&segment).unwrap();

        assert_eq!(json["kind"], "narration");
        assert_eq!(json["text"], "Once upon a time");
    }
}
