//! Rendering the timeline into model context.

use storyloom_core::model::StoryContinuation;

use crate::domain::segments::StorySegment;

/// Prompt recorded on the seed character's image segment.
pub const SEED_IMAGE_PROMPT: &str = "Initial character image";

/// Serializes the story so far into compact text.
///
/// Narration contributes its prose and illustrations contribute their edit
/// prompt inside an `<image_prompt>` marker, never image data. User
/// instructions are left out; the model sees them as their own turns.
#[must_use]
pub fn render_story(segments: &[StorySegment]) -> String {
    segments
        .iter()
        .filter_map(|segment| match segment {
            StorySegment::Narration { text, .. } => Some(text.clone()),
            StorySegment::Image(image) => {
                Some(format!("<image_prompt>{}</image_prompt>", image.prompt()))
            }
            StorySegment::UserInstruction { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the user entry for a turn: the rendered story plus the instruction.
#[must_use]
pub fn user_turn_message(segments: &[StorySegment], instruction: &str) -> String {
    format!(
        "CURRENT STORY:\n{}\n\n---\n\nUSER'S INSTRUCTION:\n{instruction}",
        render_story(segments)
    )
}

/// Builds the assistant entry recording the model's continuation.
#[must_use]
pub fn assistant_reply(continuation: &StoryContinuation) -> String {
    serde_json::json!({
        "text": continuation.text,
        "image_prompt": continuation.image_prompt,
    })
    .to_string()
}
