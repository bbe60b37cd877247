use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use yaca_types::models::{ChatMessage, User};

use crate::Storage;

/// User lookups and writes over an injected [`Storage`].
#[derive(Clone)]
pub struct UserRepository {
    storage: Arc<dyn Storage>,
}

impl UserRepository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn save(&self, user: &User) -> Result<User> {
        self.storage.save_user(user).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.storage.find_user_by_username(username).await
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        self.storage.find_all_users().await
    }

    pub async fn delete(&self, username: &str) -> Result<bool> {
        self.storage.delete_user(username).await
    }
}

/// Chat message lookups and writes over an injected [`Storage`].
#[derive(Clone)]
pub struct MessageRepository {
    storage: Arc<dyn Storage>,
}

impl MessageRepository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn save(&self, message: &ChatMessage) -> Result<ChatMessage> {
        self.storage.save_message(message).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>> {
        self.storage.find_message_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<ChatMessage>> {
        self.storage.find_all_messages().await
    }
}
