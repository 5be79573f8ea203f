//! Seams for time and identifier generation.
//!
//! Production code reads the system clock and mints UUIDv7 identifiers. Tests
//! inject fixed or sequential implementations so segment ids, job tokens and
//! timestamps are predictable.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Abstraction over system time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Abstraction over identifier generation.
pub trait IdGenerator: Send + Sync {
    /// Returns an identifier never returned before by this generator.
    fn next_id(&self) -> Uuid;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Production generator backed by time-ordered UUIDv7.
#[derive(Debug, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_distinct() {
        let ids = RandomIds;
        let first = ids.next_id();
        let second = ids.next_id();
        assert_ne!(first, second);
    }
}
