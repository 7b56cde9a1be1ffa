use axum::{debug_handler, extract::State, http::StatusCode};
use tower_sessions::Session;

use crate::{realtime::Notifier, session, AppResult};

/// Signing out twice, or without a session, still succeeds.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn logout(
    State(notifier): State<Notifier>,
    session: Session
) -> AppResult<StatusCode> {
    session::end(&session, &notifier).await?;
    Ok(StatusCode::NO_CONTENT)
}
