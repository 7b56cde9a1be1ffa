use axum::{debug_handler, extract::State, http::StatusCode};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db::Message, extract::{AppJson, AppPath}, realtime::Notifier, session::CurrentUser, AppResult};

use super::msg::{self, SendMessageRequest};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn conversation(
    AppPath(peer_id): AppPath<Uuid>,
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Vec<Message>>> {
    Ok(AppJson(msg::fetch_conversation(&db_pool, user_id, user_id, peer_id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send(
    AppPath(peer_id): AppPath<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    CurrentUser(user_id): CurrentUser,

    AppJson(SendMessageRequest { message }): AppJson<SendMessageRequest>,
) -> AppResult<(StatusCode, AppJson<Message>)> {
    let msg = msg::send_message(&db_pool, &notifier, user_id, peer_id, &message).await?;
    Ok((StatusCode::CREATED, AppJson(msg)))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn mark_read(
    AppPath(message_id): AppPath<Uuid>,
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Message>> {
    Ok(AppJson(msg::mark_read(&db_pool, user_id, message_id).await?))
}
