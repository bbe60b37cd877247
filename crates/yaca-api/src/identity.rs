use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use yaca_db::UserRepository;
use yaca_types::api::{LoginRequest, RegisterRequest};
use yaca_types::models::User;

use crate::error::{ChatError, Failure};
use crate::password::{CredentialHasher, validate_password};
use crate::token::TokenService;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("username pattern"));

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_PATTERN.is_match(username)
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Treats `None` and `""` alike.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

#[derive(Clone)]
pub struct IdentityService {
    users: UserRepository,
    hasher: CredentialHasher,
    tokens: TokenService,
}

impl IdentityService {
    pub fn new(users: UserRepository, hasher: CredentialHasher, tokens: TokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Validate and store a new account.
    ///
    /// The uniqueness check and the insert are separate storage calls; two
    /// concurrent registrations of one username can both pass the check; the
    /// backend's own uniqueness guard then fails the later write.
    pub async fn register(&self, req: RegisterRequest) -> Result<User, ChatError> {
        let username = present(req.username).ok_or(ChatError::MissingUsername)?;
        let password = present(req.password).ok_or(ChatError::MissingPassword)?;
        let display_name = present(req.display_name).ok_or(ChatError::MissingDisplayName)?;

        if !is_valid_username(&username) {
            return Err(ChatError::InvalidUsername);
        }
        validate_password(&password)?;

        if self
            .users
            .find_by_username(&username)
            .await
            .map_err(|e| ChatError::server(Failure::Registration, e))?
            .is_some()
        {
            debug!("Registration rejected, {} already exists", username);
            return Err(ChatError::UserExists);
        }

        let password_hash = self
            .hasher
            .hash(password)
            .await
            .map_err(|e| ChatError::server(Failure::Registration, e))?;

        let user = User {
            id: Uuid::new_v4(),
            username,
            password_hash,
            display_name,
        };
        let saved = self
            .users
            .save(&user)
            .await
            .map_err(|e| ChatError::server(Failure::Registration, e))?;

        info!("Registered {} ({})", saved.username, saved.id);
        Ok(saved)
    }

    pub async fn login(
        &self,
        username: Option<String>,
        req: LoginRequest,
    ) -> Result<Session, ChatError> {
        let username = present(username).ok_or(ChatError::MissingUsername)?;
        let password = present(req.password).ok_or(ChatError::MissingPassword)?;

        let user = self
            .users
            .find_by_username(&username)
            .await
            .map_err(|e| ChatError::server(Failure::Login, e))?
            .ok_or(ChatError::UnregisteredUser)?;

        let matches = self
            .hasher
            .verify(password, user.password_hash.clone())
            .await
            .map_err(|e| ChatError::server(Failure::Login, e))?;
        if !matches {
            debug!("Incorrect password for {}", username);
            return Err(ChatError::IncorrectPassword);
        }

        let token = self.tokens.issue(&user)?;
        info!("{} ({}) logged in", user.username, user.id);
        Ok(Session { user, token })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use yaca_db::{MemoryStorage, Storage};

    use super::*;

    fn service() -> (IdentityService, Arc<dyn Storage>, TokenService) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let tokens = TokenService::new("test-secret", None);
        let identity = IdentityService::new(
            UserRepository::new(storage.clone()),
            CredentialHasher::insecure_fast(),
            tokens.clone(),
        );
        (identity, storage, tokens)
    }

    fn request(username: Option<&str>, password: Option<&str>, display_name: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.map(String::from),
            password: password.map(String::from),
            display_name: display_name.map(String::from),
        }
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn username_shape() {
        assert!(is_valid_username("ann@x.com"));
        assert!(is_valid_username("a.b+c@mail.example.org"));
        assert!(!is_valid_username("ann"));
        assert!(!is_valid_username("ann@x"));
        assert!(!is_valid_username("ann @x.com"));
        assert!(!is_valid_username("@x.com"));
        assert!(!is_valid_username("ann@@x.com"));
    }

    #[tokio::test]
    async fn missing_fields_report_highest_priority() {
        let (identity, _, _) = service();
        let cases = [
            (request(None, None, None), "MissingUsername"),
            (request(None, Some("abc1$"), None), "MissingUsername"),
            (request(None, None, Some("Ann")), "MissingUsername"),
            (request(Some(""), Some("abc1$"), Some("Ann")), "MissingUsername"),
            (request(Some("ann@x.com"), None, None), "MissingPassword"),
            (request(Some("ann@x.com"), Some(""), Some("Ann")), "MissingPassword"),
            (request(Some("ann@x.com"), Some("abc1$"), None), "MissingDisplayName"),
            (request(Some("not-an-email"), Some("abc1$"), Some("Ann")), "InvalidUsername"),
        ];
        for (req, expected) in cases {
            let err = identity.register(req).await.unwrap_err();
            assert_eq!(err.name(), expected);
        }
    }

    #[tokio::test]
    async fn weak_password_reports_first_rule() {
        let (identity, _, _) = service();
        let err = identity
            .register(request(Some("ann@x.com"), Some("abcd"), Some("Ann")))
            .await
            .unwrap_err();
        assert_eq!(err.name(), "WeakPassword");
        assert_eq!(err.to_string(), "Password must contain at least one number.");
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let (identity, storage, _) = service();
        let user = identity
            .register(request(Some("ann@x.com"), Some("abc1$"), Some("Ann")))
            .await
            .unwrap();
        assert_eq!(user.username, "ann@x.com");
        assert_eq!(user.display_name, "Ann");
        assert_ne!(user.password_hash, "abc1$");

        let stored = storage.find_user_by_username("ann@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, user.id);
        assert_ne!(stored.password_hash, "abc1$");
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (identity, _, _) = service();
        identity
            .register(request(Some("ann@x.com"), Some("abc1$"), Some("Ann")))
            .await
            .unwrap();
        let err = identity
            .register(request(Some("ann@x.com"), Some("xyz9!"), Some("Other Ann")))
            .await
            .unwrap_err();
        assert_eq!(err.name(), "UserExists");
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let (identity, _, tokens) = service();
        let user = identity
            .register(request(Some("ann@x.com"), Some("abc1$"), Some("Ann")))
            .await
            .unwrap();

        let session = identity
            .login(Some("ann@x.com".into()), login_request("abc1$"))
            .await
            .unwrap();
        assert_eq!(session.user.id, user.id);

        let claims = tokens.verify(&session.token).unwrap();
        assert_eq!(claims.username, "ann@x.com");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.display_name, "Ann");
    }

    #[tokio::test]
    async fn login_failures() {
        let (identity, _, _) = service();
        identity
            .register(request(Some("ann@x.com"), Some("abc1$"), Some("Ann")))
            .await
            .unwrap();

        let err = identity.login(None, login_request("abc1$")).await.unwrap_err();
        assert_eq!(err.name(), "MissingUsername");

        let err = identity
            .login(Some("ann@x.com".into()), LoginRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.name(), "MissingPassword");

        let err = identity
            .login(Some("bob@x.com".into()), login_request("abc1$"))
            .await
            .unwrap_err();
        assert_eq!(err.name(), "UnregisteredUser");

        let err = identity
            .login(Some("ann@x.com".into()), login_request("abc2$"))
            .await
            .unwrap_err();
        assert_eq!(err.name(), "IncorrectPassword");
    }
}
