use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use yaca_types::api::ErrorBody;

use crate::password::PasswordRule;

/// Which operation a server-side failure interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Registration,
    Login,
    Post,
    Get,
}

impl Failure {
    pub fn name(self) -> &'static str {
        match self {
            Self::Registration => "FailedRegistration",
            Self::Login => "FailedLogin",
            Self::Post => "PostRequestFailure",
            Self::Get => "GetRequestFailure",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Registration => "Registration failed.",
            Self::Login => "Login failed.",
            Self::Post => "Failed to post chat message.",
            Self::Get => "Failed to retrieve data.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientError,
    ServerError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientError => "ClientError",
            Self::ServerError => "ServerError",
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    // -- Registration / login --
    #[error("Email is required.")]
    MissingUsername,
    #[error("Password is required.")]
    MissingPassword,
    #[error("Display name is required.")]
    MissingDisplayName,
    #[error("Invalid username.")]
    InvalidUsername,
    #[error("{0}")]
    WeakPassword(#[from] PasswordRule),
    #[error("User already exists.")]
    UserExists,
    #[error("No such user was found.")]
    UnregisteredUser,
    /// Same message as [`ChatError::UnregisteredUser`].
    #[error("No such user was found.")]
    IncorrectPassword,

    // -- Authorization gate --
    #[error("Authorization token is required.")]
    MissingToken,
    #[error("Invalid or expired token.")]
    InvalidToken,

    // -- Chat --
    #[error("Chat message text is required.")]
    MissingChatText,
    #[error("Author information is missing.")]
    MissingAuthor,
    #[error("You can only post messages on your own behalf.")]
    UnauthorizedRequest,
    #[error("Cannot post a message for a non-existent user.")]
    OrphanedChatMessage,
    #[error("Chat message not found.")]
    ChatMessageNotFound,
    #[error("User not found.")]
    UserNotFound,

    // -- Request shape --
    #[error("Request body or path could not be read.")]
    MalformedRequest,

    #[error("{}", .failure.message())]
    Server {
        failure: Failure,
        #[source]
        source: anyhow::Error,
    },
}

impl ChatError {
    /// Wrap an internal error as a server failure of `failure`.
    pub fn server(failure: Failure, source: impl Into<anyhow::Error>) -> Self {
        Self::Server {
            failure,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Server { .. } => ErrorKind::ServerError,
            _ => ErrorKind::ClientError,
        }
    }

    /// Stable symbolic name clients branch on.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MissingUsername => "MissingUsername",
            Self::MissingPassword => "MissingPassword",
            Self::MissingDisplayName => "MissingDisplayName",
            Self::InvalidUsername => "InvalidUsername",
            Self::WeakPassword(_) => "WeakPassword",
            Self::UserExists => "UserExists",
            Self::UnregisteredUser => "UnregisteredUser",
            Self::IncorrectPassword => "IncorrectPassword",
            Self::MissingToken => "MissingToken",
            Self::InvalidToken => "InvalidToken",
            Self::MissingChatText => "MissingChatText",
            Self::MissingAuthor => "MissingAuthor",
            Self::UnauthorizedRequest => "UnauthorizedRequest",
            Self::OrphanedChatMessage => "OrphanedChatMessage",
            Self::ChatMessageNotFound => "ChatMessageNotFound",
            Self::UserNotFound => "UserNotFound",
            Self::MalformedRequest => "MalformedRequest",
            Self::Server { failure, .. } => failure.name(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::InvalidToken
            | Self::UnauthorizedRequest
            | Self::OrphanedChatMessage => StatusCode::UNAUTHORIZED,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        if let Self::Server { failure, source } = &self {
            error!("{}: {:#}", failure.name(), source);
        }

        let body = ErrorBody {
            kind: self.kind().as_str().to_string(),
            name: self.name().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
