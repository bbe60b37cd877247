use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use yaca_db::{MessageRepository, UserRepository};
use yaca_types::api::{Claims, PostMessageRequest};
use yaca_types::events::{ChatEvent, EventBus};
use yaca_types::models::ChatMessage;

use crate::error::{ChatError, Failure};

/// Result of a history read. Both variants are successes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageListing {
    NoChatMessagesYet,
    ChatMessagesFound(Vec<ChatMessage>),
}

impl MessageListing {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoChatMessagesYet => "NoChatMessagesYet",
            Self::ChatMessagesFound(_) => "ChatMessagesFound",
        }
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            Self::NoChatMessagesYet => Vec::new(),
            Self::ChatMessagesFound(messages) => messages,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    users: UserRepository,
    messages: MessageRepository,
    events: EventBus,
}

impl ChatService {
    pub fn new(users: UserRepository, messages: MessageRepository, events: EventBus) -> Self {
        Self {
            users,
            messages,
            events,
        }
    }

    /// Create a message as `identity`.
    ///
    /// The message is persisted before `MessageCreated` is published, so a
    /// subscriber that re-reads history after a push always finds it.
    pub async fn post(
        &self,
        identity: &Claims,
        req: PostMessageRequest,
    ) -> Result<ChatMessage, ChatError> {
        let text = req
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(ChatError::MissingChatText)?
            .to_string();

        let author = req
            .author
            .filter(|author| !author.trim().is_empty())
            .ok_or(ChatError::MissingAuthor)?;

        if author != identity.username {
            warn!("{} tried to post as {}", identity.username, author);
            return Err(ChatError::UnauthorizedRequest);
        }

        // The token may outlive the account; posting needs a live one.
        let author_user = self
            .users
            .find_by_username(&author)
            .await
            .map_err(|e| ChatError::server(Failure::Post, e))?
            .ok_or(ChatError::OrphanedChatMessage)?;

        let message = ChatMessage {
            id: Uuid::new_v4(),
            author,
            text,
            display_name: author_user.display_name,
            timestamp: Utc::now(),
        };

        let saved = self
            .messages
            .save(&message)
            .await
            .map_err(|e| ChatError::server(Failure::Post, e))?;

        info!("{} posted message {}", saved.author, saved.id);
        self.events.publish(ChatEvent::MessageCreated(saved.clone()));
        Ok(saved)
    }

    pub async fn list_all(&self) -> Result<MessageListing, ChatError> {
        let messages = self
            .messages
            .find_all()
            .await
            .map_err(|e| ChatError::server(Failure::Get, e))?;

        debug!("Loaded {} chat messages", messages.len());
        if messages.is_empty() {
            Ok(MessageListing::NoChatMessagesYet)
        } else {
            Ok(MessageListing::ChatMessagesFound(messages))
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<ChatMessage, ChatError> {
        self.messages
            .find_by_id(id)
            .await
            .map_err(|e| ChatError::server(Failure::Get, e))?
            .ok_or(ChatError::ChatMessageNotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{Result, bail};
    use async_trait::async_trait;

    use yaca_db::{MemoryStorage, Storage};
    use yaca_types::models::User;

    use super::*;

    struct Fixture {
        chat: ChatService,
        users: UserRepository,
        storage: Arc<dyn Storage>,
        events: EventBus,
    }

    fn fixture_with(storage: Arc<dyn Storage>) -> Fixture {
        let events = EventBus::new(16);
        let chat = ChatService::new(
            UserRepository::new(storage.clone()),
            MessageRepository::new(storage.clone()),
            events.clone(),
        );
        Fixture {
            chat,
            users: UserRepository::new(storage.clone()),
            storage,
            events,
        }
    }

    async fn fixture() -> Fixture {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage
            .save_user(&User {
                id: Uuid::new_v4(),
                username: "ann@x.com".into(),
                password_hash: "hash".into(),
                display_name: "Ann".into(),
            })
            .await
            .unwrap();
        fixture_with(storage)
    }

    fn claims(username: &str, display_name: &str) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            username: username.into(),
            display_name: display_name.into(),
            iat: 0,
            exp: None,
        }
    }

    fn post(author: Option<&str>, text: Option<&str>) -> PostMessageRequest {
        PostMessageRequest {
            author: author.map(String::from),
            text: text.map(String::from),
        }
    }

    #[tokio::test]
    async fn post_snapshots_current_display_name() {
        let f = fixture().await;
        // Claims carry a stale display name; storage wins.
        let message = f
            .chat
            .post(&claims("ann@x.com", "Old Ann"), post(Some("ann@x.com"), Some("  hi  ")))
            .await
            .unwrap();
        assert_eq!(message.text, "hi");
        assert_eq!(message.display_name, "Ann");
        assert_eq!(message.author, "ann@x.com");

        let stored = f.storage.find_message_by_id(message.id).await.unwrap().unwrap();
        assert_eq!(stored, message);
    }

    #[tokio::test]
    async fn validation_order() {
        let f = fixture().await;
        let ann = claims("ann@x.com", "Ann");

        let err = f.chat.post(&ann, post(None, None)).await.unwrap_err();
        assert_eq!(err.name(), "MissingChatText");
        let err = f.chat.post(&ann, post(Some("ann@x.com"), Some("   "))).await.unwrap_err();
        assert_eq!(err.name(), "MissingChatText");
        let err = f.chat.post(&ann, post(Some(""), Some("hi"))).await.unwrap_err();
        assert_eq!(err.name(), "MissingAuthor");
        let err = f.chat.post(&ann, post(Some("bob@x.com"), Some("hi"))).await.unwrap_err();
        assert_eq!(err.name(), "UnauthorizedRequest");

        assert!(f.storage.find_all_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_author_cannot_post() {
        let f = fixture().await;
        assert!(f.users.delete("ann@x.com").await.unwrap());
        let err = f
            .chat
            .post(&claims("ann@x.com", "Ann"), post(Some("ann@x.com"), Some("hi")))
            .await
            .unwrap_err();
        assert_eq!(err.name(), "OrphanedChatMessage");
    }

    #[tokio::test]
    async fn listing_tags_and_idempotence() {
        let f = fixture().await;
        assert_eq!(f.chat.list_all().await.unwrap(), MessageListing::NoChatMessagesYet);

        let ann = claims("ann@x.com", "Ann");
        f.chat.post(&ann, post(Some("ann@x.com"), Some("one"))).await.unwrap();
        f.chat.post(&ann, post(Some("ann@x.com"), Some("two"))).await.unwrap();

        let first = f.chat.list_all().await.unwrap();
        let second = f.chat.list_all().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name(), "ChatMessagesFound");
        let texts: Vec<String> = first.into_messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[tokio::test]
    async fn created_message_is_published_after_persist() {
        let f = fixture().await;
        let mut rx = f.events.subscribe();
        let message = f
            .chat
            .post(&claims("ann@x.com", "Ann"), post(Some("ann@x.com"), Some("hi")))
            .await
            .unwrap();

        let ChatEvent::MessageCreated(pushed) = rx.recv().await.unwrap();
        assert_eq!(pushed, message);
        assert!(f.storage.find_message_by_id(pushed.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn find_by_id_reports_missing() {
        let f = fixture().await;
        let err = f.chat.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.name(), "ChatMessageNotFound");
    }

    /// Storage whose message writes always fail.
    struct FailingWrites(MemoryStorage);

    #[async_trait]
    impl Storage for FailingWrites {
        async fn connect(&self) -> Result<()> {
            self.0.connect().await
        }
        async fn init(&self) -> Result<()> {
            self.0.init().await
        }
        async fn close(&self) -> Result<()> {
            self.0.close().await
        }
        async fn save_user(&self, user: &User) -> Result<User> {
            self.0.save_user(user).await
        }
        async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
            self.0.find_user_by_username(username).await
        }
        async fn find_all_users(&self) -> Result<Vec<User>> {
            self.0.find_all_users().await
        }
        async fn delete_user(&self, username: &str) -> Result<bool> {
            self.0.delete_user(username).await
        }
        async fn save_message(&self, _message: &ChatMessage) -> Result<ChatMessage> {
            bail!("connection reset")
        }
        async fn find_message_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>> {
            self.0.find_message_by_id(id).await
        }
        async fn find_all_messages(&self) -> Result<Vec<ChatMessage>> {
            self.0.find_all_messages().await
        }
    }

    #[tokio::test]
    async fn failed_write_is_a_server_error_and_not_published() {
        let storage = FailingWrites(MemoryStorage::new());
        storage
            .save_user(&User {
                id: Uuid::new_v4(),
                username: "ann@x.com".into(),
                password_hash: "hash".into(),
                display_name: "Ann".into(),
            })
            .await
            .unwrap();
        let f = fixture_with(Arc::new(storage));
        let mut rx = f.events.subscribe();

        let err = f
            .chat
            .post(&claims("ann@x.com", "Ann"), post(Some("ann@x.com"), Some("hi")))
            .await
            .unwrap_err();
        assert_eq!(err.name(), "PostRequestFailure");
        assert!(!err.to_string().contains("connection reset"));
        assert!(rx.try_recv().is_err());
    }
}
