//! Narrative turn orchestration.
//!
//! A [`StoryOrchestrator`] owns one story: its timeline, its conversation log
//! and the reference image the next illustration is edited from. It drives a
//! user turn from instruction to image-job dispatch, and resolves image
//! segments when their completion notifications arrive.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyloom_core::determinism::{Clock, IdGenerator};
use storyloom_core::error::StoryError;
use storyloom_core::imaging::{ImageJobDispatcher, ImageJobRequest};
use storyloom_core::model::{ChatMessage, LanguageModel, ModelError, StoryContinuation};
use storyloom_core::token::JobToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::context;
use super::query_handlers::StoryView;
use crate::domain::character::CharacterSeed;
use crate::domain::conversation::ConversationLog;
use crate::domain::segments::{ImageSegment, StorySegment};
use crate::domain::timeline::Timeline;

/// Where a story is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Ready to accept a turn.
    Idle,
    /// Waiting for the language model.
    AwaitingModel,
    /// Handing the image job to the image service.
    AwaitingImage,
}

/// What became of a completion notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// A pending image segment was completed and the reference image moved.
    Resolved,
    /// No pending segment matched; nothing changed.
    Ignored,
}

/// The collaborators a story talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Language model continuing the story.
    pub model: Arc<dyn LanguageModel>,
    /// Image service receiving edit jobs.
    pub images: Arc<dyn ImageJobDispatcher>,
    /// Source of segment ids and job ids.
    pub ids: Arc<dyn IdGenerator>,
    /// Source of timestamps.
    pub clock: Arc<dyn Clock>,
}

/// Per-deployment story settings.
#[derive(Debug, Clone)]
pub struct StorySettings {
    /// System persona opening every conversation.
    pub persona: String,
    /// Directory rendered illustrations are written under.
    pub output_dir: PathBuf,
}

/// A turn that reached image-job dispatch.
///
/// The illustration is still rendering; it shows up as a pending image
/// segment until its completion notification arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettledTurn {
    /// Narration appended for this turn.
    pub narration: String,
    /// Edit instruction sent to the image service.
    pub image_prompt: String,
    /// Token the illustration's completion will carry.
    pub job_token: JobToken,
    /// When the turn settled.
    pub settled_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StoryState {
    timeline: Timeline,
    conversation: ConversationLog,
    /// Output of the most recently completed illustration.
    reference_image: String,
    /// Instruction of a user turn the model has not answered yet.
    unanswered: Option<String>,
}

/// Drives user turns for one story and correlates image completions back to it.
pub struct StoryOrchestrator {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    collaborators: Collaborators,
    output_dir: PathBuf,
    state: Mutex<StoryState>,
    phase: Mutex<TurnPhase>,
}

impl std::fmt::Debug for StoryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryOrchestrator")
            .field("session_id", &self.session_id)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

/// Holds the turn slot; puts the story back to `Idle` when dropped.
struct TurnSlot<'a> {
    phase: &'a Mutex<TurnPhase>,
}

impl<'a> TurnSlot<'a> {
    fn claim(phase: &'a Mutex<TurnPhase>) -> Result<Self, StoryError> {
        let mut current = phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != TurnPhase::Idle {
            return Err(StoryError::ReentrantSubmission);
        }
        *current = TurnPhase::AwaitingModel;
        Ok(Self { phase })
    }

    fn advance(&self, next: TurnPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        self.advance(TurnPhase::Idle);
    }
}

impl StoryOrchestrator {
    /// Opens a story seeded with the character's description and image.
    ///
    /// The timeline starts with the description as narration followed by the
    /// character image as an already completed illustration, which is also
    /// the first reference image.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if the seed is blank.
    pub fn new(
        session_id: Uuid,
        seed: &CharacterSeed,
        collaborators: Collaborators,
        settings: StorySettings,
    ) -> Result<Self, StoryError> {
        seed.validate()?;

        let ids = &collaborators.ids;
        let mut timeline = Timeline::new();
        timeline.append(StorySegment::Narration {
            id: ids.next_id(),
            text: seed.description.clone(),
        });
        timeline.append(StorySegment::Image(ImageSegment::completed(
            ids.next_id(),
            context::SEED_IMAGE_PROMPT,
            JobToken::new(session_id, ids.next_id()),
            seed.image_path.clone(),
        )));

        let state = StoryState {
            timeline,
            conversation: ConversationLog::new(settings.persona),
            reference_image: seed.image_path.clone(),
            unanswered: None,
        };

        Ok(Self {
            session_id,
            started_at: collaborators.clock.now(),
            collaborators,
            output_dir: settings.output_dir,
            state: Mutex::new(state),
            phase: Mutex::new(TurnPhase::Idle),
        })
    }

    /// The story's identifier, also the namespace of its job tokens.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// When the story was opened.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Where the story is in its turn cycle.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the timeline in narrative order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StorySegment> {
        self.lock_state().timeline.snapshot()
    }

    /// Copy of the conversation log.
    #[must_use]
    pub fn conversation(&self) -> Vec<ChatMessage> {
        self.lock_state().conversation.entries().to_vec()
    }

    /// The image the next illustration will be edited from.
    #[must_use]
    pub fn reference_image(&self) -> String {
        self.lock_state().reference_image.clone()
    }

    /// The instruction of a turn whose model call failed, if any.
    ///
    /// While this is `Some`, the conversation log ends with a user entry that
    /// has no reply; [`retry_pending_turn`](Self::retry_pending_turn) answers
    /// it without appending the instruction again.
    #[must_use]
    pub fn pending_user_turn(&self) -> Option<String> {
        self.lock_state().unanswered.clone()
    }

    /// Number of illustrations still rendering.
    #[must_use]
    pub fn pending_images(&self) -> usize {
        self.lock_state().timeline.pending_images()
    }

    /// Read-only view of the whole story, taken under one lock so a
    /// completion cannot land halfway through.
    #[must_use]
    pub fn view(&self) -> StoryView {
        let state = self.lock_state();
        StoryView {
            session_id: self.session_id,
            started_at: self.started_at,
            phase: self.phase(),
            reference_image: state.reference_image.clone(),
            pending_user_turn: state.unanswered.clone(),
            pending_images: state.timeline.pending_images(),
            conversation_entries: state.conversation.len(),
            completed_turns: state.conversation.completed_turns(),
            segments: state.timeline.snapshot(),
        }
    }

    /// Drives one user turn up to image-job dispatch.
    ///
    /// Records the instruction in the timeline and the conversation, asks the
    /// model for the next beat, records the reply and the narration, appends
    /// a pending illustration and hands its job to the image service, edited
    /// from the current reference image.
    ///
    /// Resubmitting the instruction of an unanswered turn retries that turn
    /// instead of recording it twice.
    ///
    /// # Errors
    ///
    /// - `StoryError::Validation` if the text is blank, or if a different
    ///   turn is still unanswered. Nothing is recorded.
    /// - `StoryError::ReentrantSubmission` if another turn has not reached
    ///   dispatch yet. Nothing is recorded.
    /// - `StoryError::ModelContractViolation` / `StoryError::ModelTransport`
    ///   if the model call fails. The instruction stays recorded and
    ///   unanswered.
    /// - `StoryError::ImageJobSubmission` if dispatch fails. The reply and
    ///   the pending illustration stay recorded.
    #[instrument(skip(self, text), fields(session_id = %self.session_id))]
    pub async fn submit_turn(&self, text: &str) -> Result<SettledTurn, StoryError> {
        let instruction = text.trim();
        if instruction.is_empty() {
            return Err(StoryError::Validation(
                "turn text must not be empty".to_owned(),
            ));
        }

        let slot = TurnSlot::claim(&self.phase)?;
        {
            let mut state = self.lock_state();
            match state.unanswered.as_deref() {
                Some(pending) if pending == instruction => {
                    debug!("resubmitted instruction matches the unanswered turn; retrying");
                }
                Some(_) => {
                    return Err(StoryError::Validation(
                        "an earlier turn is still unanswered; retry it first".to_owned(),
                    ));
                }
                None => {
                    state.timeline.append(StorySegment::UserInstruction {
                        id: self.collaborators.ids.next_id(),
                        text: instruction.to_owned(),
                    });
                    let message =
                        context::user_turn_message(state.timeline.segments(), instruction);
                    state.conversation.record_user(message)?;
                    state.unanswered = Some(instruction.to_owned());
                }
            }
        }

        self.drive_turn(&slot).await
    }

    /// Re-drives the model call of the unanswered turn.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if no turn is unanswered, and
    /// otherwise the same errors as [`submit_turn`](Self::submit_turn).
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn retry_pending_turn(&self) -> Result<SettledTurn, StoryError> {
        let slot = TurnSlot::claim(&self.phase)?;
        if self.lock_state().unanswered.is_none() {
            return Err(StoryError::Validation(
                "there is no unanswered turn to retry".to_owned(),
            ));
        }
        self.drive_turn(&slot).await
    }

    /// Resolves the illustration requested with `token`.
    ///
    /// On success the reference image moves to `rendered_ref`, so the last
    /// illustration to complete is the one the next edit starts from. Tokens
    /// from other stories, unknown tokens and repeated notifications are
    /// ignored.
    #[instrument(skip(self, token, rendered_ref), fields(session_id = %self.session_id, token = %token))]
    pub fn on_image_complete(&self, token: &JobToken, rendered_ref: &str) -> CompletionOutcome {
        if !token.belongs_to(self.session_id) {
            debug!("completion belongs to another story; ignoring");
            return CompletionOutcome::Ignored;
        }

        let mut state = self.lock_state();
        if state.timeline.resolve(token, rendered_ref) {
            rendered_ref.clone_into(&mut state.reference_image);
            info!(rendered_ref, "illustration completed");
            CompletionOutcome::Resolved
        } else {
            debug!("no pending illustration for token; ignoring");
            CompletionOutcome::Ignored
        }
    }

    async fn drive_turn(&self, slot: &TurnSlot<'_>) -> Result<SettledTurn, StoryError> {
        let conversation = self.conversation();

        let continuation = self
            .collaborators
            .model
            .continue_story(&conversation)
            .await
            .map_err(|e| {
                warn!(error = %e, "language model call failed");
                match e {
                    ModelError::Transport(reason) => StoryError::ModelTransport(reason),
                    ModelError::ContractViolation(reason) => {
                        StoryError::ModelContractViolation(reason)
                    }
                }
            })
            .and_then(checked_continuation)?;

        slot.advance(TurnPhase::AwaitingImage);

        let request = {
            let mut state = self.lock_state();
            state
                .conversation
                .record_assistant(context::assistant_reply(&continuation))?;
            state.unanswered = None;

            let ids = &self.collaborators.ids;
            state.timeline.append(StorySegment::Narration {
                id: ids.next_id(),
                text: continuation.text.clone(),
            });
            let token = JobToken::new(self.session_id, ids.next_id());
            state.timeline.append(StorySegment::Image(ImageSegment::pending(
                ids.next_id(),
                continuation.image_prompt.clone(),
                token,
            )));

            ImageJobRequest {
                prompt: continuation.image_prompt.clone(),
                reference_images: vec![state.reference_image.clone()],
                output_token: token,
                output_path: self.output_path(&token),
            }
        };
        let token = request.output_token;

        self.collaborators
            .images
            .submit(request)
            .await
            .map_err(|e| {
                warn!(%token, error = %e, "image job dispatch failed");
                StoryError::ImageJobSubmission {
                    token,
                    reason: e.to_string(),
                }
            })?;

        info!(%token, "turn settled; illustration rendering");
        Ok(SettledTurn {
            narration: continuation.text,
            image_prompt: continuation.image_prompt,
            job_token: token,
            settled_at: self.collaborators.clock.now(),
        })
    }

    fn output_path(&self, token: &JobToken) -> String {
        self.output_dir
            .join(self.session_id.to_string())
            .join(format!("{}.png", token.job_id()))
            .to_string_lossy()
            .into_owned()
    }

    fn lock_state(&self) -> MutexGuard<'_, StoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn checked_continuation(continuation: StoryContinuation) -> Result<StoryContinuation, StoryError> {
    if continuation.text.trim().is_empty() {
        return Err(StoryError::ModelContractViolation(
            "reply has an empty `text` field".to_owned(),
        ));
    }
    if continuation.image_prompt.trim().is_empty() {
        return Err(StoryError::ModelContractViolation(
            "reply has an empty `image_prompt` field".to_owned(),
        ));
    }
    Ok(continuation)
}
