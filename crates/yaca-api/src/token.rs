use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use yaca_types::api::Claims;
use yaca_types::models::User;

use crate::error::{ChatError, Failure};

/// Issues and verifies HS256 session tokens.
///
/// Tokens are stateless: anything signed with the current secret verifies
/// until it expires. Changing the secret invalidates every token issued so far.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenService {
    /// `ttl: None` issues tokens without an `exp` claim.
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if ttl.is_none() {
            validation.validate_exp = false;
            validation.required_spec_claims.clear();
        }

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ChatError> {
        let now = Utc::now();
        let exp = match self.ttl {
            Some(ttl) => {
                let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
                    ChatError::server(
                        Failure::Login,
                        anyhow::anyhow!("token lifetime of {} overflows the clock", ttl),
                    )
                })?;
                Some(expires_at.timestamp() as usize)
            }
            None => None,
        };

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            iat: now.timestamp() as usize,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ChatError::server(Failure::Login, e))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ChatError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                ChatError::InvalidToken
            })
    }

    /// Verify the value of an `Authorization` header.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<Claims, ChatError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ChatError::MissingToken)?;
        self.verify(token)
    }
}
