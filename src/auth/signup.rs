use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{config::Config, db::Profile, extract::AppJson, realtime::Notifier, session, AppResult};

use super::NewAccount;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    State(notifier): State<Notifier>,
    session: Session,

    AppJson(account): AppJson<NewAccount>,
) -> AppResult<(StatusCode, AppJson<Profile>)> {
    let profile = super::sign_up(&db_pool, &config, account).await?;
    session::begin(&session, &notifier, profile.id).await?;

    Ok((StatusCode::CREATED, AppJson(profile)))
}
