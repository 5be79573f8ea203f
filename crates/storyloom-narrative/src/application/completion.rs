//! Correlating image completions with the stories that requested them.
//!
//! The image service reports every finished job through one process-wide
//! channel. Each story registers a route for its own namespace for as long as
//! it lives; a completion is handed only to the story that minted its token,
//! so one story's traffic can never crowd out another's.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use storyloom_core::event::ImageCompleted;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::orchestrator::StoryOrchestrator;

type Routes = Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<ImageCompleted>>>>;

/// Routes image completion notifications to the story owning each token.
#[derive(Debug, Clone, Default)]
pub struct CompletionChannel {
    routes: Routes,
}

impl CompletionChannel {
    /// Creates a channel with no subscribed stories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a notification to the story whose namespace the token is in.
    ///
    /// Returns how many stories received it, 0 or 1. Zero is not an error:
    /// the story may already have ended.
    pub fn publish(&self, event: ImageCompleted) -> usize {
        let session_id = event.token.session_id();
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        match routes.get(&session_id).map(|route| route.send(event)) {
            Some(Ok(())) => 1,
            Some(Err(mpsc::error::SendError(event))) => {
                debug!(token = %event.token, "story stopped listening; completion dropped");
                0
            }
            None => {
                debug!(%session_id, "no story subscribed; completion dropped");
                0
            }
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscribers(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Subscribes a story for as long as the returned handle lives.
    ///
    /// Subscribing the same story again replaces the earlier route.
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn subscribe(&self, story: Arc<StoryOrchestrator>) -> CompletionSubscription {
        let session_id = story.session_id();
        let (sender, mut receiver) = mpsc::unbounded_channel::<ImageCompleted>();
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, sender.clone());

        let task = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                story.on_image_complete(&event.token, &event.rendered_ref);
            }
        });
        CompletionSubscription {
            session_id,
            route: sender,
            routes: Arc::clone(&self.routes),
            task,
        }
    }
}

/// A story's live subscription to the completion channel.
///
/// Dropping it, or calling [`release`](Self::release), removes the story's
/// route and stops delivery.
#[derive(Debug)]
pub struct CompletionSubscription {
    session_id: Uuid,
    route: mpsc::UnboundedSender<ImageCompleted>,
    routes: Routes,
    task: JoinHandle<()>,
}

impl CompletionSubscription {
    /// Stops delivering completions to the story.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CompletionSubscription {
    fn drop(&mut self) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        // A newer subscription for the same story owns the route now.
        if routes
            .get(&self.session_id)
            .is_some_and(|route| route.same_channel(&self.route))
        {
            routes.remove(&self.session_id);
        }
        drop(routes);
        self.task.abort();
    }
}
