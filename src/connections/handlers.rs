use axum::{debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{db::{Connection, Profile}, extract::AppJson, session::CurrentUser, AppResult};

#[derive(Debug, Deserialize)]
pub(crate) struct AddConnectionRequest {
    pin: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn add(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,

    AppJson(AddConnectionRequest { pin }): AppJson<AddConnectionRequest>,
) -> AppResult<(StatusCode, AppJson<Connection>)> {
    let connection = super::add_connection(&db_pool, user_id, &pin).await?;
    Ok((StatusCode::CREATED, AppJson(connection)))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn connections(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Vec<Connection>>> {
    Ok(AppJson(super::list_connections(&db_pool, user_id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn contacts(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<AppJson<Vec<Profile>>> {
    Ok(AppJson(super::list_contacts(&db_pool, user_id).await?))
}
