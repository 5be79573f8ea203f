//! Scripted `LanguageModel` implementation for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storyloom_core::model::{ChatMessage, LanguageModel, ModelError, StoryContinuation};
use tokio::sync::Semaphore;

/// A language model that answers from a queue of scripted results and
/// records every conversation it was sent.
///
/// When the script runs dry every further call fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<StoryContinuation, ModelError>>>,
    received: Mutex<Vec<Vec<ChatMessage>>>,
    gate: Option<Arc<Semaphore>>,
}

/// Releases calls held open by a gated [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct ModelGate(Arc<Semaphore>);

impl ModelGate {
    /// Lets one pending (or future) model call answer.
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

impl ScriptedModel {
    /// Creates a model that answers with the given results, in order.
    #[must_use]
    pub fn new(script: Vec<Result<StoryContinuation, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            received: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Creates a model scripted with a single successful reply. Any later
    /// call fails with a "script exhausted" transport error.
    #[must_use]
    pub fn replying(text: &str, image_prompt: &str) -> Self {
        Self::new(vec![Ok(StoryContinuation::new(text, image_prompt))])
    }

    /// Creates a model whose calls block until the returned gate is released.
    #[must_use]
    pub fn gated(script: Vec<Result<StoryContinuation, ModelError>>) -> (Self, ModelGate) {
        let semaphore = Arc::new(Semaphore::new(0));
        let model = Self {
            gate: Some(Arc::clone(&semaphore)),
            ..Self::new(script)
        };
        (model, ModelGate(semaphore))
    }

    /// Queues one more result.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push(&self, result: Result<StoryContinuation, ModelError>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Returns every conversation the model was called with.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn received(&self) -> Vec<Vec<ChatMessage>> {
        self.received.lock().unwrap().clone()
    }

    /// Number of calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn continue_story(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<StoryContinuation, ModelError> {
        self.received.lock().unwrap().push(conversation.to_vec());
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ModelError::Transport(e.to_string()))?
                .forget();
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("script exhausted".into())))
    }
}
