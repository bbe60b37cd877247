use anyhow::Result;
use chrono::SecondsFormat;
use rusqlite::Connection;

use yaca_types::models::{ChatMessage, User};

use crate::models::{MessageRow, UserRow};

// -- Users --

pub fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, display_name) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.display_name
        ],
    )?;
    Ok(())
}

pub fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, display_name FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                display_name: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub fn query_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password_hash, display_name FROM users ORDER BY seq")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                display_name: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn delete_user(conn: &Connection, username: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
    Ok(removed > 0)
}

// -- Messages --

pub fn insert_message(conn: &Connection, message: &ChatMessage) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, author, text, display_name, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            message.id.to_string(),
            message.author,
            message.text,
            message.display_name,
            message.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
        ],
    )?;
    Ok(())
}

pub fn query_message_by_id(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, author, text, display_name, created_at FROM messages WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                author: row.get(1)?,
                text: row.get(2)?,
                display_name: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub fn query_messages(conn: &Connection) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, author, text, display_name, created_at FROM messages ORDER BY seq",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                author: row.get(1)?,
                text: row.get(2)?,
                display_name: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
