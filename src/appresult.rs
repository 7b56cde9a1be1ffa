use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, ChatError>;

/// Every failure an operation can report. Nothing is retried on the caller's
/// behalf; the message is what the client sees.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Auth(String),

    #[error("no profile has PIN {pin}")]
    ContactNotFound { pin: String },

    #[error("profile {id} not found")]
    ProfileNotFound { id: Uuid },

    #[error("message {id} not found")]
    MessageNotFound { id: Uuid },

    #[error("you cannot add yourself as a contact")]
    SelfReference,

    #[error("this contact is already in your list")]
    DuplicateConnection,

    #[error("could not allocate a free PIN after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Transport(#[from] sqlx::Error),

    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ChatError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        use ChatError::*;
        match self {
            Auth(_) => StatusCode::UNAUTHORIZED,
            ContactNotFound { .. } | ProfileNotFound { .. } | MessageNotFound { .. } => StatusCode::NOT_FOUND,
            SelfReference => StatusCode::BAD_REQUEST,
            DuplicateConnection => StatusCode::CONFLICT,
            AllocationExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Forbidden(_) => StatusCode::FORBIDDEN,
            Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Transport(_) | Session(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text a client is shown. Server-side failures are logged here and
    /// reported without detail.
    pub fn client_message(&self) -> String {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal error".to_owned()
        } else {
            self.to_string()
        }
    }
}

impl From<bcrypt::BcryptError> for ChatError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Internal(anyhow::Error::from(err))
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.client_message() }))).into_response()
    }
}
