use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::ChatError;
use crate::state::AppState;

/// Extract and validate the bearer token, then attach its [`Claims`] to the
/// request for downstream handlers. Storage is not consulted.
///
/// [`Claims`]: yaca_types::api::Claims
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ChatError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = state.tokens.verify_bearer(auth_header)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
