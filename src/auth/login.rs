use axum::{debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db::Profile, extract::AppJson, profiles, realtime::Notifier, session::{self, CurrentUser}, AppResult};

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    session: Session,

    AppJson(LoginRequest { email, password }): AppJson<LoginRequest>,
) -> AppResult<AppJson<Profile>> {
    let user_id = super::sign_in(&db_pool, &email, &password).await?;
    session::begin(&session, &notifier, user_id).await?;

    Ok(AppJson(profiles::get_profile(&db_pool, user_id, user_id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn me(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Profile>> {
    Ok(AppJson(profiles::get_profile(&db_pool, user_id, user_id).await?))
}
