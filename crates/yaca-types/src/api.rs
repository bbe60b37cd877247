use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserProfile;

// -- JWT Claims --

/// Session token claims shared by the REST gate and the gateway upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub display_name: String,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

// -- Envelopes --

/// Success body: `{ "name": "...", "payload": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub name: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(name: &str, payload: T) -> Self {
        Self {
            name: name.to_string(),
            payload,
        }
    }
}

/// Failure body: `{ "type": "ClientError", "name": "...", "message": "..." }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub message: String,
}

// -- Auth --

/// Fields are optional so that an absent field is reported by name rather
/// than as a body rejection.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(alias = "email")]
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "extra")]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

// -- Messages --

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PostMessageRequest {
    pub author: Option<String>,
    pub text: Option<String>,
}

// -- Gateway --

#[derive(Debug, Default, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}
