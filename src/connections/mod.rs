//! The contact graph.
//!
//! Edges are directed: adding someone's PIN creates `me -> them` only. They
//! see the edge (either party may read it) but get no contact entry back
//! until they add a PIN themselves.

mod handlers;

use axum::{routing::get, Router};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{authz, db::{self, Connection, Profile}, pin, profiles, AppResult, AppState, ChatError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connections", get(handlers::connections).post(handlers::add))
        .route("/contacts", get(handlers::contacts))
}

#[instrument(skip_all, fields(requester = %requester))]
pub async fn add_connection(db_pool: &SqlitePool, requester: Uuid, target_pin: &str) -> AppResult<Connection> {
    let target_pin = target_pin.trim();
    if !pin::is_valid_pin(target_pin) {
        return Err(ChatError::validation("pin", "must be exactly 6 digits"));
    }

    let target = profiles::find_by_pin(db_pool, target_pin)
        .await?
        .ok_or_else(|| ChatError::ContactNotFound { pin: target_pin.to_owned() })?;

    if target.id == requester {
        return Err(ChatError::SelfReference);
    }

    insert_connection(db_pool, requester, requester, target.id).await
}

/// Stores the edge `user_id -> connected_user_id` on behalf of `caller`.
pub async fn insert_connection(
    db_pool: &SqlitePool,
    caller: Uuid,
    user_id: Uuid,
    connected_user_id: Uuid,
) -> AppResult<Connection> {
    authz::ensure_connection_insert(caller, user_id)?;
    if user_id == connected_user_id {
        return Err(ChatError::SelfReference);
    }

    let connection = Connection {
        id: Uuid::now_v7(),
        user_id,
        connected_user_id,
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO connections (id,user_id,connected_user_id,created_at) VALUES (?,?,?,?)")
        .bind(connection.id)
        .bind(connection.user_id)
        .bind(connection.connected_user_id)
        .bind(connection.created_at)
        .execute(db_pool)
        .await
        .map_err(|e| {
            if db::violates_unique(&e, "connections.user_id") {
                ChatError::DuplicateConnection
            } else {
                e.into()
            }
        })?;

    info!(connection_id = %connection.id, target = %connected_user_id, "added connection");
    Ok(connection)
}

/// Every edge `caller` is a party to, oldest first.
pub async fn list_connections(db_pool: &SqlitePool, caller: Uuid) -> AppResult<Vec<Connection>> {
    let rows = sqlx::query_as::<_, Connection>(
        "SELECT * FROM connections WHERE user_id=? OR connected_user_id=? ORDER BY created_at, id",
    )
    .bind(caller)
    .bind(caller)
    .fetch_all(db_pool)
    .await?;

    Ok(rows.into_iter().filter(|c| authz::can_read_connection(caller, c)).collect())
}

/// Profiles `owner` has added, by display name.
pub async fn list_contacts(db_pool: &SqlitePool, owner: Uuid) -> AppResult<Vec<Profile>> {
    Ok(sqlx::query_as::<_, Profile>(
        "SELECT p.* FROM connections c JOIN profiles p ON p.id=c.connected_user_id \
         WHERE c.user_id=? ORDER BY p.display_name COLLATE NOCASE, p.id",
    )
    .bind(owner)
    .fetch_all(db_pool)
    .await?)
}
