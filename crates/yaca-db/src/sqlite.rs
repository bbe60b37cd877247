use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use yaca_types::models::{ChatMessage, User};

use crate::{Storage, migrations, queries};

/// Durable backend on a single SQLite file.
///
/// The connection is opened by [`Storage::connect`] and dropped by
/// [`Storage::close`]. All statements run on the blocking pool.
pub struct SqliteStorage {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
            let conn = guard
                .as_ref()
                .ok_or_else(|| anyhow!("database is not connected"))?;
            f(conn)
        })
        .await?
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn connect(&self) -> Result<()> {
        let path = self.path.clone();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let db = Connection::open(&path)?;

            // WAL mode for concurrent reads
            db.pragma_update(None, "journal_mode", "WAL")?;

            migrations::run(&db)?;

            let mut guard = conn.lock().map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
            *guard = Some(db);
            info!("Database opened at {}", path.display());
            Ok::<_, anyhow::Error>(())
        })
        .await?
    }

    async fn init(&self) -> Result<()> {
        self.with_conn(migrations::reset).await?;
        info!("Database cleared");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.clone();
        let closed = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
            match guard.take() {
                Some(db) => {
                    db.close().map_err(|(_, e)| e)?;
                    Ok::<_, anyhow::Error>(true)
                }
                None => Ok(false),
            }
        })
        .await??;

        if closed {
            info!("Database at {} closed", self.path.display());
        }
        Ok(())
    }

    async fn save_user(&self, user: &User) -> Result<User> {
        let user = user.clone();
        self.with_conn(move |conn| {
            queries::insert_user(conn, &user)?;
            Ok(user)
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            queries::query_user_by_username(conn, &username)?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn find_all_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            queries::query_users(conn)?
                .into_iter()
                .map(User::try_from)
                .collect()
        })
        .await
    }

    async fn delete_user(&self, username: &str) -> Result<bool> {
        let username = username.to_string();
        self.with_conn(move |conn| queries::delete_user(conn, &username))
            .await
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<ChatMessage> {
        let message = message.clone();
        self.with_conn(move |conn| {
            queries::insert_message(conn, &message)?;
            Ok(message)
        })
        .await
    }

    async fn find_message_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>> {
        self.with_conn(move |conn| {
            queries::query_message_by_id(conn, &id.to_string())?
                .map(ChatMessage::try_from)
                .transpose()
        })
        .await
    }

    async fn find_all_messages(&self) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            queries::query_messages(conn)?
                .into_iter()
                .map(ChatMessage::try_from)
                .collect()
        })
        .await
    }
}
