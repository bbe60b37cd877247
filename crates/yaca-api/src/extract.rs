use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ChatError;

/// JSON request body that fails with a [`ChatError`] instead of axum's
/// plain-text rejection.
///
/// An empty body reads as `T::default()`, so absent fields surface as the
/// handler's own `Missing*` errors. The `Content-Type` header is not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            debug!("Unreadable request body: {}", e.body_text());
            ChatError::MalformedRequest
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes).map(Self).map_err(|e| {
            debug!("Rejected request body: {}", e);
            ChatError::MalformedRequest
        })
    }
}

/// Path parameters with the same error shape as [`JsonBody`].
#[derive(Debug, Clone, Copy)]
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await.map_err(|e| {
            debug!("Rejected path parameters: {}", e.body_text());
            ChatError::MalformedRequest
        })?;
        Ok(Self(value))
    }
}
