use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            seq             INTEGER PRIMARY KEY AUTOINCREMENT,
            id              TEXT NOT NULL UNIQUE,
            username        TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            display_name    TEXT NOT NULL
        );

        -- author is a plain username, not a foreign key: messages outlive
        -- the account that posted them
        CREATE TABLE IF NOT EXISTS messages (
            seq             INTEGER PRIMARY KEY AUTOINCREMENT,
            id              TEXT NOT NULL UNIQUE,
            author          TEXT NOT NULL,
            text            TEXT NOT NULL,
            display_name    TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

/// Remove every row. Used by `Storage::init`.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DELETE FROM messages;
        DELETE FROM users;
        ",
    )?;
    Ok(())
}
