use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use yaca_types::api::{Claims, Envelope, PostMessageRequest};

use crate::error::ChatError;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

pub async fn post_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<PostMessageRequest>,
) -> Result<impl IntoResponse, ChatError> {
    let message = state.chat.post(&claims, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new("ChatMessageCreated", message)),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ChatError> {
    let listing = state.chat.list_all().await?;
    let name = listing.name();

    Ok(Json(Envelope::new(name, listing.into_messages())))
}

pub async fn get_message(
    State(state): State<AppState>,
    PathParam(message_id): PathParam<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ChatError> {
    // No message carries an id that is not a UUID.
    let message_id = Uuid::parse_str(&message_id).map_err(|_| ChatError::ChatMessageNotFound)?;
    let message = state.chat.find_by_id(message_id).await?;

    Ok(Json(Envelope::new("ChatMessageFound", message)))
}
