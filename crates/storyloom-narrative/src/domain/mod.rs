//! Domain model: segments, the timeline, the conversation log and commands.

pub mod character;
pub mod commands;
pub mod conversation;
pub mod segments;
pub mod timeline;
