//! HTTP DTOs for session endpoints.
//!
//! Responses serialize the `Session` aggregate directly; it is the same
//! shape clients receive in `session-started` and `session-updated`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::CreateSessionCommand;
use crate::domain::foundation::{RoomId, SessionStatus, Timestamp, ValidationError};
use crate::domain::session::{Owner, SessionPatch};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to start a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(alias = "videoTitle")]
    pub title: String,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl CreateSessionRequest {
    pub fn into_command(self) -> Result<CreateSessionCommand, ValidationError> {
        Ok(CreateSessionCommand {
            owner: Owner::new(self.email, self.username)?,
            title: self.title,
            room_id: self.room_id.map(RoomId::new).transpose()?,
        })
    }
}

/// Body of `POST /live`: one endpoint for both start and stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRequest {
    pub status: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "videoTitle")]
    pub title: Option<String>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Decoded `POST /live` intent.
#[derive(Debug, Clone)]
pub enum LiveAction {
    Start(CreateSessionCommand),
    Stop {
        room_id: RoomId,
        end_time: Option<Timestamp>,
    },
}

impl LiveRequest {
    /// Only `started` and `stopped` are accepted.
    pub fn into_action(self) -> Result<LiveAction, ValidationError> {
        match self.status.parse::<SessionStatus>()? {
            SessionStatus::Started => {
                let request = CreateSessionRequest {
                    email: self.email,
                    username: self.username,
                    title: self.title.unwrap_or_default(),
                    room_id: self.room_id,
                };
                Ok(LiveAction::Start(request.into_command()?))
            }
            SessionStatus::Stopped => {
                let room_id = self
                    .room_id
                    .ok_or_else(|| ValidationError::empty_field("roomId"))?;
                Ok(LiveAction::Stop {
                    room_id: RoomId::new(room_id)?,
                    end_time: self.end_time.map(Timestamp::from_datetime),
                })
            }
        }
    }
}

/// Optional body of `POST /sessions/:room_id/stop`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionRequest {
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Administrative update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[serde(default, alias = "videoTitle")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl UpdateSessionRequest {
    pub fn into_patch(self) -> Result<SessionPatch, ValidationError> {
        Ok(SessionPatch {
            title: self.title,
            status: self.status.map(|s| s.parse()).transpose()?,
            end_time: self.end_time.map(Timestamp::from_datetime),
        })
    }
}
