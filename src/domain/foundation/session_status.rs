//! SessionStatus enum for tracking the lifecycle of live sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Lifecycle status of a live session.
///
/// `Stopped` is terminal: a stopped session is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Started,
    Stopped,
}

impl SessionStatus {
    /// Returns true while the session is live.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Started)
    }

    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Started => "started",
            SessionStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(SessionStatus::Started),
            "stopped" => Ok(SessionStatus::Stopped),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("expected 'started' or 'stopped', got '{}'", other),
            )),
        }
    }
}
