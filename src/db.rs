use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    #[sqlx(rename = "private_pin")]
    pub pin: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // unique: id
    // unique: private_pin
}

/// Directed edge: `user_id` added `connected_user_id` to their contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Connection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub connected_user_id: Uuid,
    pub created_at: DateTime<Utc>,

    // unique: user_id, connected_user_id
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[sqlx(rename = "message")]
    #[serde(rename = "message")]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(db_pool).await
}

/// True when `err` is a UNIQUE violation on `table.column`.
///
/// SQLite does not report constraint names, only `UNIQUE constraint failed:
/// table.column[, table.column]`, so the column list is matched textually.
pub fn violates_unique(err: &sqlx::Error, column: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation() && db_err.message().contains(column),
        _ => false,
    }
}
