pub mod auth;
pub mod chat;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod identity;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod state;
pub mod token;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ChatError;
pub use state::{AppState, AppStateInner, GatewayAccess, ServiceOptions};

/// Every route of the server.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/users", post(auth::register))
        .route("/auth/tokens/{username}", post(auth::login))
        .route("/gateway", get(gateway::ws_upgrade))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/chat/messages",
            get(messages::get_messages).post(messages::post_message),
        )
        .route("/chat/messages/{message_id}", get(messages::get_message))
        .route("/chat/users", get(users::get_users))
        .route("/chat/users/{username}", get(users::get_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
