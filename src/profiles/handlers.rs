use axum::{debug_handler, extract::State};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db::Profile, extract::{AppJson, AppPath}, session::CurrentUser, AppResult};

use super::ProfilePatch;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn my_profile(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Profile>> {
    Ok(AppJson(super::get_profile(&db_pool, user_id, user_id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_my_profile(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,

    AppJson(patch): AppJson<ProfilePatch>,
) -> AppResult<AppJson<Profile>> {
    Ok(AppJson(super::update_profile(&db_pool, user_id, user_id, patch).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    AppPath(profile_id): AppPath<Uuid>,
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Profile>> {
    Ok(AppJson(super::get_profile(&db_pool, user_id, profile_id).await?))
}
