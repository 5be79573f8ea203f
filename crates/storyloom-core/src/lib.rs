//! Storyloom Core — shared domain abstractions.
//!
//! This crate defines the error taxonomy, identifiers, and the collaborator
//! ports (language model, image job dispatch) that the narrative core depends
//! on. It contains no infrastructure code.

pub mod command;
pub mod determinism;
pub mod error;
pub mod event;
pub mod imaging;
pub mod model;
pub mod token;
