//! Character seeds a story starts from.

use serde::{Deserialize, Serialize};
use storyloom_core::error::StoryError;

/// The chosen base character: its description and its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSeed {
    /// Prose description, which becomes the opening narration.
    pub description: String,
    /// Path-like identifier of the character image, the first reference image.
    pub image_path: String,
}

impl CharacterSeed {
    /// Creates a seed.
    pub fn new(description: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            image_path: image_path.into(),
        }
    }

    /// Checks that both fields carry something.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if either field is blank.
    pub fn validate(&self) -> Result<(), StoryError> {
        if self.description.trim().is_empty() {
            return Err(StoryError::Validation(
                "character description must not be empty".to_owned(),
            ));
        }
        if self.image_path.trim().is_empty() {
            return Err(StoryError::Validation(
                "character image path must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
