//! Registry of live stories.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use storyloom_core::error::StoryError;
use tracing::info;
use uuid::Uuid;

use super::completion::{CompletionChannel, CompletionSubscription};
use super::orchestrator::{Collaborators, StoryOrchestrator, StorySettings};
use crate::domain::character::CharacterSeed;

struct LiveStory {
    story: Arc<StoryOrchestrator>,
    _subscription: CompletionSubscription,
}

/// All stories currently open in this process.
///
/// Every story is subscribed to the shared completion channel from the moment
/// it starts until it ends. Story state is kept in memory only.
pub struct StorySessions {
    stories: RwLock<HashMap<Uuid, LiveStory>>,
    completions: CompletionChannel,
    collaborators: Collaborators,
    settings: StorySettings,
}

impl std::fmt::Debug for StorySessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorySessions")
            .field("live", &self.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StorySessions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        settings: StorySettings,
        completions: CompletionChannel,
    ) -> Self {
        Self {
            stories: RwLock::new(HashMap::new()),
            completions,
            collaborators,
            settings,
        }
    }

    /// Opens a story for `seed` and subscribes it to completions.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if the seed is blank.
    pub fn start(&self, seed: &CharacterSeed) -> Result<Arc<StoryOrchestrator>, StoryError> {
        let session_id = self.collaborators.ids.next_id();
        let story = Arc::new(StoryOrchestrator::new(
            session_id,
            seed,
            self.collaborators.clone(),
            self.settings.clone(),
        )?);
        let subscription = self.completions.subscribe(Arc::clone(&story));

        self.stories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                session_id,
                LiveStory {
                    story: Arc::clone(&story),
                    _subscription: subscription,
                },
            );
        info!(%session_id, "story started");
        Ok(story)
    }

    /// Looks up a live story.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::SessionNotFound` if no live story has this id.
    pub fn get(&self, session_id: Uuid) -> Result<Arc<StoryOrchestrator>, StoryError> {
        self.stories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session_id)
            .map(|live| Arc::clone(&live.story))
            .ok_or(StoryError::SessionNotFound(session_id))
    }

    /// Ends a story and releases its completion subscription.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::SessionNotFound` if no live story has this id.
    pub fn end(&self, session_id: Uuid) -> Result<(), StoryError> {
        let removed = self
            .stories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session_id);
        match removed {
            Some(_) => {
                info!(%session_id, "story ended");
                Ok(())
            }
            None => Err(StoryError::SessionNotFound(session_id)),
        }
    }

    /// The channel completions are published on.
    #[must_use]
    pub fn completions(&self) -> &CompletionChannel {
        &self.completions
    }

    /// Number of live stories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no story is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use chrono::Utc;
    use storyloom_core::event::ImageCompleted;
    use storyloom_test_support::{FixedClock, RecordingDispatcher, ScriptedModel, SequentialIds};

    use super::*;

    fn sessions() -> StorySessions {
        let collaborators = Collaborators {
            model: Arc::new(ScriptedModel::replying("The fox found a river.", "add a river")),
            images: Arc::new(RecordingDispatcher::new()),
            ids: Arc::new(SequentialIds::new()),
            clock: Arc::new(FixedClock(Utc::now())),
        };
        let settings = StorySettings {
            persona: "persona".into(),
            output_dir: PathBuf::from("/out"),
        };
        StorySessions::new(collaborators, settings, CompletionChannel::default())
    }

    #[tokio::test]
    async fn test_start_registers_and_subscribes_story() {
        let sessions = sessions();

        let story = sessions.start(&CharacterSeed::new("a fox", "/seed.png")).unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.completions().subscribers(), 1);
        let found = sessions.get(story.session_id()).unwrap();
        assert!(Arc::ptr_eq(&found, &story));
    }

    #[tokio::test]
    async fn test_start_rejects_blank_seed() {
        let sessions = sessions();

        let result = sessions.start(&CharacterSeed::new("a fox", ""));

        assert!(matches!(result, Err(StoryError::Validation(_))));
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_story_is_not_found() {
        let sessions = sessions();
        let id = Uuid::from_u128(42);

        match sessions.get(id) {
            Err(StoryError::SessionNotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected SessionNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_end_releases_subscription() {
        // Arrange
        let sessions = sessions();
        let story = sessions.start(&CharacterSeed::new("a fox", "/seed.png")).unwrap();
        let token = story.submit_turn("it finds a river").await.unwrap().job_token;

        // Act
        sessions.end(story.session_id()).unwrap();

        // Assert
        tokio::time::timeout(Duration::from_secs(2), async {
            while sessions.completions().subscribers() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscription not released");
        let delivered = sessions
            .completions()
            .publish(ImageCompleted::new(token, "/out/late.png"));
        assert_eq!(delivered, 0);
        assert!(matches!(
            sessions.end(story.session_id()),
            Err(StoryError::SessionNotFound(_))
        ));
    }
}
