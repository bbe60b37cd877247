use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};

use yaca_types::api::{Claims, Envelope};
use yaca_types::models::UserProfile;

use crate::error::{ChatError, Failure};
use crate::extract::PathParam;
use crate::state::AppState;

pub async fn get_users(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ChatError> {
    let users = state
        .users
        .find_all()
        .await
        .map_err(|e| ChatError::server(Failure::Get, e))?;

    let profiles: Vec<UserProfile> = users.into_iter().map(UserProfile::from).collect();
    Ok(Json(Envelope::new("UsersFound", profiles)))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathParam(username): PathParam<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ChatError> {
    let user = state
        .users
        .find_by_username(&username)
        .await
        .map_err(|e| ChatError::server(Failure::Get, e))?
        .ok_or(ChatError::UserNotFound)?;

    Ok(Json(Envelope::new("UserFound", UserProfile::from(user))))
}
