//! Test dispatchers — mock `ImageJobDispatcher` implementations for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storyloom_core::imaging::{DispatchError, ImageJobDispatcher, ImageJobRequest};
use tokio::sync::Semaphore;

/// A dispatcher that accepts every job and records it.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    submitted: Mutex<Vec<ImageJobRequest>>,
    gate: Option<Arc<Semaphore>>,
}

/// Releases submissions held open by a gated [`RecordingDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchGate(Arc<Semaphore>);

impl DispatchGate {
    /// Lets one pending (or future) submission through.
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

impl RecordingDispatcher {
    /// Creates an empty recording dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher whose submissions block until the returned gate
    /// is released. A job is recorded once it gets through.
    #[must_use]
    pub fn gated() -> (Self, DispatchGate) {
        let semaphore = Arc::new(Semaphore::new(0));
        let dispatcher = Self {
            gate: Some(Arc::clone(&semaphore)),
            ..Self::default()
        };
        (dispatcher, DispatchGate(semaphore))
    }

    /// Returns a snapshot of all submitted jobs, in submission order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn submitted(&self) -> Vec<ImageJobRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageJobDispatcher for RecordingDispatcher {
    async fn submit(&self, request: ImageJobRequest) -> Result<(), DispatchError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| DispatchError(e.to_string()))?
                .forget();
        }
        self.submitted.lock().unwrap().push(request);
        Ok(())
    }
}

/// A dispatcher that refuses every job. Useful for testing dispatch failures.
#[derive(Debug)]
pub struct FailingDispatcher;

#[async_trait]
impl ImageJobDispatcher for FailingDispatcher {
    async fn submit(&self, _request: ImageJobRequest) -> Result<(), DispatchError> {
        Err(DispatchError("render service unavailable".into()))
    }
}
