use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{realtime::Notifier, ChatError};

pub const USER_ID: &str = "user_id";

/// The signed-in identity of the request's own session.
///
/// Rejects with [`ChatError::Auth`] when the session carries no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, reason)| ChatError::Internal(anyhow::anyhow!(reason)))?;

        current_user(&session)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| ChatError::auth("not signed in"))
    }
}

pub async fn current_user(session: &Session) -> Result<Option<Uuid>, ChatError> {
    Ok(session.get::<Uuid>(USER_ID).await?)
}

/// Binds `user_id` to the session under a fresh session id. Live
/// subscriptions of whoever held the session before are ended.
pub async fn begin(session: &Session, notifier: &Notifier, user_id: Uuid) -> Result<(), ChatError> {
    if let Some(id) = session.id() {
        notifier.end_session(id);
    }
    session.cycle_id().await?;
    session.insert(USER_ID, user_id).await?;
    Ok(())
}

/// Clears the session and closes its realtime subscriptions.
pub async fn end(session: &Session, notifier: &Notifier) -> Result<(), ChatError> {
    if let Some(id) = session.id() {
        notifier.end_session(id);
    }
    session.flush().await?;
    Ok(())
}
