use std::sync::Arc;

use chrono::Duration;

use yaca_db::{MessageRepository, Storage, UserRepository};
use yaca_gateway::dispatcher::Dispatcher;
use yaca_types::events::EventBus;

use crate::chat::ChatService;
use crate::identity::IdentityService;
use crate::password::CredentialHasher;
use crate::token::TokenService;

/// Who may open a gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayAccess {
    /// Anyone, with or without a token
    Open,
    /// Only holders of a valid session token
    #[default]
    Authenticated,
}

/// Settings the services are built from.
#[derive(Clone)]
pub struct ServiceOptions {
    pub jwt_secret: String,
    /// `None` issues tokens that never expire
    pub token_ttl: Option<Duration>,
    pub hasher: CredentialHasher,
    pub gateway_access: GatewayAccess,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub identity: IdentityService,
    pub chat: ChatService,
    pub users: UserRepository,
    pub tokens: TokenService,
    pub dispatcher: Dispatcher,
    pub gateway_access: GatewayAccess,
}

impl AppStateInner {
    /// Wire every service to `storage` and start relaying chat events to the
    /// gateway. Must be called inside a Tokio runtime.
    pub fn build(storage: Arc<dyn Storage>, options: ServiceOptions) -> AppState {
        let users = UserRepository::new(storage.clone());
        let messages = MessageRepository::new(storage);
        let tokens = TokenService::new(&options.jwt_secret, options.token_ttl);
        let events = EventBus::default();

        let dispatcher = Dispatcher::new();
        dispatcher.listen(events.subscribe());

        Arc::new(Self {
            identity: IdentityService::new(users.clone(), options.hasher, tokens.clone()),
            chat: ChatService::new(users.clone(), messages, events),
            users,
            tokens,
            dispatcher,
            gateway_access: options.gateway_access,
        })
    }
}
