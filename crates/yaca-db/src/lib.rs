pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod repository;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use yaca_types::models::{ChatMessage, User};

pub use memory::MemoryStorage;
pub use repository::{MessageRepository, UserRepository};
pub use sqlite::SqliteStorage;

/// Persistence contract shared by every backend.
///
/// Reads and writes hand back owned copies; nothing returned aliases the
/// backend's own state. A missing record is `Ok(None)`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn connect(&self) -> Result<()>;

    /// Drop all users and messages.
    async fn init(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;

    // -- Users --

    async fn save_user(&self, user: &User) -> Result<User>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All users in registration order.
    async fn find_all_users(&self) -> Result<Vec<User>>;

    /// Returns whether a user was removed. Messages by that user are kept.
    async fn delete_user(&self, username: &str) -> Result<bool>;

    // -- Messages --

    async fn save_message(&self, message: &ChatMessage) -> Result<ChatMessage>;

    async fn find_message_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>>;

    /// All messages in insertion order.
    async fn find_all_messages(&self) -> Result<Vec<ChatMessage>>;
}
