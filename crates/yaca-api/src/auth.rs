use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use yaca_types::api::{Envelope, LoginRequest, LoginResponse, RegisterRequest};
use yaca_types::models::UserProfile;

use crate::error::ChatError;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let user = state.identity.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new("UserRegistered", UserProfile::from(user))),
    ))
}

/// The stored hash stays on the server; the response carries only the
/// public profile and the token.
pub async fn login(
    State(state): State<AppState>,
    PathParam(username): PathParam<String>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let session = state.identity.login(Some(username), req).await?;

    Ok(Json(Envelope::new(
        "UserAuthenticated",
        LoginResponse {
            user: session.user.into(),
            token: session.token,
        },
    )))
}
