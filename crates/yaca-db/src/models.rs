use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use yaca_types::models::{ChatMessage, User};

/// Database row types, these map directly to SQLite rows.
/// Ids and timestamps are stored as text and parsed on the way out.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
}

pub struct MessageRow {
    pub id: String,
    pub author: String,
    pub text: String,
    pub display_name: String,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row
                .id
                .parse()
                .with_context(|| format!("corrupt user id '{}'", row.id))?,
            username: row.username,
            password_hash: row.password_hash,
            display_name: row.display_name,
        })
    }
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        let timestamp = DateTime::parse_from_rfc3339(&row.created_at)
            .with_context(|| format!("corrupt created_at '{}' on message '{}'", row.created_at, row.id))?
            .with_timezone(&Utc);

        Ok(ChatMessage {
            id: row
                .id
                .parse()
                .with_context(|| format!("corrupt message id '{}'", row.id))?,
            author: row.author,
            text: row.text,
            display_name: row.display_name,
            timestamp,
        })
    }
}
