//! Participant identity carried with room membership.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ConnectionId;

/// What a connection tells the room about itself when it joins.
///
/// The content is not interpreted beyond the display name; `metadata` is
/// passed to peers verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl ParticipantInfo {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            metadata: serde_json::Value::Null,
        }
    }
}

/// A connection as seen by the other members of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub connection_id: ConnectionId,
    #[serde(flatten)]
    pub info: ParticipantInfo,
}
