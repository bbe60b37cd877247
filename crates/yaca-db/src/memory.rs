use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use yaca_types::models::{ChatMessage, User};

use crate::Storage;

/// Volatile backend for development and tests. State lives for as long as
/// the value does.
#[derive(Default)]
pub struct MemoryStorage {
    users: RwLock<Vec<User>>,
    messages: RwLock<Vec<ChatMessage>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn connect(&self) -> Result<()> {
        debug!("In-memory storage ready");
        Ok(())
    }

    async fn init(&self) -> Result<()> {
        self.users.write().await.clear();
        self.messages.write().await.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn save_user(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            bail!("username '{}' is already stored", user.username);
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_all_users(&self) -> Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn delete_user(&self, username: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.username != username);
        Ok(users.len() != before)
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<ChatMessage> {
        self.messages.write().await.push(message.clone());
        Ok(message.clone())
    }

    async fn find_message_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn find_all_messages(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.messages.read().await.clone())
    }
}
