//! PostgreSQL implementation of SessionStore.
//!
//! Sessions live in `live_sessions`; their chat in `chat_messages`, which
//! cascades on session delete.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::chat::{ChatCursor, ChatMessage};
use crate::domain::foundation::{
    DomainError, ErrorCode, MessageId, RoomId, SessionStatus, Timestamp,
};
use crate::domain::session::{Owner, Session, SessionPatch};
use crate::ports::SessionStore;

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

const SESSION_COLUMNS: &str = "room_id, owner_email, owner_username, title, status, \
     start_time, end_time, next_sequence, last_message_at";

const MESSAGE_COLUMNS: &str = "id, room_id, sequence, author, body, sent_at, edited_at";

/// PostgreSQL implementation of SessionStore.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Creates a new PostgresSessionStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
    }

    async fn load_sessions(&self, only_live: bool) -> Result<Vec<Session>, DomainError> {
        let filter = if only_live { "WHERE status = 'started'" } else { "" };
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM live_sessions {filter} ORDER BY start_time, room_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch sessions"))?;

        let room_ids: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String, _>("room_id"))
            .collect::<Result<_, _>>()
            .map_err(db_error("read room_id"))?;

        let message_rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE room_id = ANY($1) ORDER BY room_id, sequence"
        ))
        .bind(&room_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch chat messages"))?;

        let mut chats: HashMap<String, Vec<ChatMessage>> = HashMap::new();
        for row in message_rows {
            let room_id: String = row.try_get("room_id").map_err(db_error("read room_id"))?;
            chats.entry(room_id).or_default().push(row_to_message(&row)?);
        }

        rows.iter()
            .map(|row| {
                let room_id: String = row.try_get("room_id").map_err(db_error("read room_id"))?;
                row_to_session(row, chats.remove(&room_id).unwrap_or_default())
            })
            .collect()
    }

    async fn load_chat(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE room_id = $1 ORDER BY sequence"
        ))
        .bind(room_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch chat messages"))?;

        rows.iter().map(row_to_message).collect()
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn find_all_sessions(&self) -> Result<Vec<Session>, DomainError> {
        self.load_sessions(false).await
    }

    async fn find_active_sessions(&self) -> Result<Vec<Session>, DomainError> {
        self.load_sessions(true).await
    }

    async fn save_session(&self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO live_sessions (
                room_id, owner_email, owner_username, title, status, start_time, end_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.room_id().as_str())
        .bind(session.owner().email())
        .bind(session.owner().username())
        .bind(session.title())
        .bind(session.status().as_str())
        .bind(session.start_time().as_datetime())
        .bind(session.end_time().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            if duplicate {
                DomainError::new(
                    ErrorCode::DuplicateRoom,
                    format!("Room {} already has a session", session.room_id()),
                )
                .with_detail("room_id", session.room_id().as_str())
            } else {
                DomainError::database(format!("Failed to insert session: {}", e))
            }
        })?;

        Ok(())
    }

    async fn find_session_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM live_sessions WHERE room_id = $1"
        ))
        .bind(room_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch session"))?;

        match row {
            Some(row) => {
                let chat = self.load_chat(room_id).await?;
                Ok(Some(row_to_session(&row, chat)?))
            }
            None => Ok(None),
        }
    }

    async fn update_session_by_room_id(
        &self,
        room_id: &RoomId,
        patch: &SessionPatch,
    ) -> Result<Option<Session>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE live_sessions SET
                title = COALESCE($2, title),
                status = COALESCE($3, status),
                end_time = COALESCE($4, end_time)
            WHERE room_id = $1
            "#,
        )
        .bind(room_id.as_str())
        .bind(patch.title.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.end_time.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(db_error("update session"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_session_by_room_id(room_id).await
    }

    async fn delete_session_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Session>, DomainError> {
        let Some(session) = self.find_session_by_room_id(room_id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM live_sessions WHERE room_id = $1")
            .bind(room_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete session"))?;

        Ok((result.rows_affected() > 0).then_some(session))
    }

    async fn append_chat_message(
        &self,
        room_id: &RoomId,
        message: &ChatMessage,
    ) -> Result<Option<ChatMessage>, DomainError> {
        let sequence = i64::try_from(message.sequence())
            .map_err(|_| DomainError::database("Message sequence out of range"))?;

        // The cursor moves in the same statement, so deletes never rewind it.
        let result = sqlx::query(
            r#"
            WITH advanced AS (
                UPDATE live_sessions SET
                    next_sequence = GREATEST(next_sequence, $3 + 1),
                    last_message_at = GREATEST(last_message_at, $6)
                WHERE room_id = $2
                RETURNING room_id
            )
            INSERT INTO chat_messages (id, room_id, sequence, author, body, sent_at, edited_at)
            SELECT $1, room_id, $3, $4, $5, $6, $7 FROM advanced
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(room_id.as_str())
        .bind(sequence)
        .bind(message.author())
        .bind(message.text())
        .bind(message.timestamp().as_datetime())
        .bind(message.edited_at().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(db_error("append chat message"))?;

        Ok((result.rows_affected() > 0).then(|| message.clone()))
    }

    async fn update_chat_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
        text: &str,
        edited_at: Timestamp,
    ) -> Result<Option<ChatMessage>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE chat_messages SET body = $3, edited_at = $4 \
             WHERE room_id = $1 AND id = $2 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(room_id.as_str())
        .bind(message_id.as_uuid())
        .bind(text)
        .bind(edited_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update chat message"))?;

        row.as_ref().map(row_to_message).transpose()
    }

    async fn remove_chat_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> Result<Option<ChatMessage>, DomainError> {
        let row = sqlx::query(&format!(
            "DELETE FROM chat_messages WHERE room_id = $1 AND id = $2 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(room_id.as_str())
        .bind(message_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("remove chat message"))?;

        row.as_ref().map(row_to_message).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

fn str_to_session_status(s: &str) -> Result<SessionStatus, DomainError> {
    s.parse()
        .map_err(|_| DomainError::database(format!("Invalid session status: {}", s)))
}

fn row_to_session(
    row: &sqlx::postgres::PgRow,
    chat: Vec<ChatMessage>,
) -> Result<Session, DomainError> {
    let room_id: String = row.try_get("room_id").map_err(db_error("read room_id"))?;
    let email: String = row.try_get("owner_email").map_err(db_error("read owner_email"))?;
    let username: String = row
        .try_get("owner_username")
        .map_err(db_error("read owner_username"))?;
    let title: String = row.try_get("title").map_err(db_error("read title"))?;
    let status: String = row.try_get("status").map_err(db_error("read status"))?;
    let start_time: chrono::DateTime<chrono::Utc> =
        row.try_get("start_time").map_err(db_error("read start_time"))?;
    let end_time: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("end_time").map_err(db_error("read end_time"))?;
    let next_sequence: i64 = row
        .try_get("next_sequence")
        .map_err(db_error("read next_sequence"))?;
    let last_message_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("last_message_at")
        .map_err(db_error("read last_message_at"))?;
    let next_sequence = u64::try_from(next_sequence)
        .map_err(|_| DomainError::database(format!("Invalid next_sequence: {}", next_sequence)))?;

    Ok(Session::reconstitute(
        RoomId::new(room_id)
            .map_err(|e| DomainError::database(format!("Invalid room_id: {}", e)))?,
        Owner::reconstitute(email, username),
        title,
        str_to_session_status(&status)?,
        Timestamp::from_datetime(start_time),
        end_time.map(Timestamp::from_datetime),
        chat,
        ChatCursor::new(next_sequence, last_message_at.map(Timestamp::from_datetime)),
    ))
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> Result<ChatMessage, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(db_error("read id"))?;
    let sequence: i64 = row.try_get("sequence").map_err(db_error("read sequence"))?;
    let author: String = row.try_get("author").map_err(db_error("read author"))?;
    let body: String = row.try_get("body").map_err(db_error("read body"))?;
    let sent_at: chrono::DateTime<chrono::Utc> =
        row.try_get("sent_at").map_err(db_error("read sent_at"))?;
    let edited_at: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("edited_at").map_err(db_error("read edited_at"))?;

    Ok(ChatMessage::reconstitute(
        MessageId::from_uuid(id),
        u64::try_from(sequence)
            .map_err(|_| DomainError::database(format!("Invalid sequence: {}", sequence)))?,
        author,
        body,
        Timestamp::from_datetime(sent_at),
        edited_at.map(Timestamp::from_datetime),
    ))
}
