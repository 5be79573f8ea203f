//! Job tokens correlating image completions with the segments that requested them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier minted for every image-generation request.
///
/// Tokens are namespaced by story session so one completion channel can serve
/// many sessions. The textual form is `<session_id>:<job_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobToken {
    session_id: Uuid,
    job_id: Uuid,
}

impl JobToken {
    /// Creates a token for `job_id` inside the namespace of `session_id`.
    #[must_use]
    pub fn new(session_id: Uuid, job_id: Uuid) -> Self {
        Self { session_id, job_id }
    }

    /// The session namespace this token belongs to.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The job identifier, unique within its session.
    #[must_use]
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Returns `true` if this token was minted by the given session.
    #[must_use]
    pub fn belongs_to(&self, session_id: Uuid) -> bool {
        self.session_id == session_id
    }
}

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session_id, self.job_id)
    }
}

/// A string could not be read as a `JobToken`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed job token: {0:?}")]
pub struct TokenParseError(pub String);

impl FromStr for JobToken {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (session, job) = s
            .split_once(':')
            .ok_or_else(|| TokenParseError(s.to_owned()))?;
        let session_id = Uuid::parse_str(session).map_err(|_| TokenParseError(s.to_owned()))?;
        let job_id = Uuid::parse_str(job).map_err(|_| TokenParseError(s.to_owned()))?;
        Ok(Self { session_id, job_id })
    }
}

impl TryFrom<String> for JobToken {
    type Error = TokenParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobToken> for String {
    fn from(token: JobToken) -> Self {
        token.to_string()
    }
}
