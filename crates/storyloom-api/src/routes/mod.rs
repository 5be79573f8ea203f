//! Route modules.

pub mod health;
pub mod renders;
pub mod stories;
