use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use tracing::debug;

use yaca_gateway::connection;
use yaca_types::api::GatewayQuery;

use crate::error::ChatError;
use crate::state::{AppState, GatewayAccess};

/// Upgrade to the push gateway.
///
/// A token may come from the `token` query parameter (browsers cannot set
/// headers on a WebSocket handshake) or the `Authorization` header. Whether a
/// token is required depends on [`GatewayAccess`]; when it is optional a bad
/// token still rejects the upgrade.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<GatewayQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ChatError> {
    let bearer = match query.token {
        Some(token) => Some(format!("Bearer {}", token)),
        None => headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let username = match (bearer, state.gateway_access) {
        (None, GatewayAccess::Open) => None,
        (bearer, _) => Some(state.tokens.verify_bearer(bearer.as_deref())?.username),
    };

    debug!(
        "Gateway upgrade for {}",
        username.as_deref().unwrap_or("anonymous")
    );

    let dispatcher = state.dispatcher.clone();
    Ok(ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, username)))
}
