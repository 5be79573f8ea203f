//! Storyloom Adapters — HTTP implementations of the collaborator ports.
//!
//! Each adapter owns a `reqwest::Client` and maps transport and protocol
//! problems onto the port's own error type.

pub mod openai_chat;
pub mod render_service;

pub use openai_chat::OpenAiChatModel;
pub use render_service::RenderServiceDispatcher;
