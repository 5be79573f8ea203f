//! Application layer: turn orchestration, completion correlation, sessions.

pub mod command_handlers;
pub mod completion;
pub mod context;
pub mod orchestrator;
pub mod prompts;
pub mod query_handlers;
pub mod sessions;
