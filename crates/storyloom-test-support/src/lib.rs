//! Shared test fakes and utilities for the Storyloom story engine.

mod determinism;
mod imaging;
mod model;

pub use determinism::{FixedClock, SequentialIds};
pub use imaging::{DispatchGate, FailingDispatcher, RecordingDispatcher};
pub use model::{ModelGate, ScriptedModel};
