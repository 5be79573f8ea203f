//! Storyloom — narrative orchestration.
//!
//! Owns the story timeline and the conversation log, drives each user turn
//! through the language model and the image service, and correlates
//! out-of-band image completions back to the segments that requested them.

pub mod application;
pub mod domain;
