use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{authz, db::Message, profiles, realtime::Notifier, AppResult, ChatError};

pub const MAX_MESSAGE_LEN: usize = 4000;

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageRequest {
    pub(crate) message: String,
}

/// Stores a message from `sender_id` to `receiver_id` and pushes it to live
/// subscribers once it is committed.
#[instrument(skip_all, fields(sender = %sender_id, receiver = %receiver_id))]
pub async fn send_message(
    db_pool: &SqlitePool,
    notifier: &Notifier,

    sender_id: Uuid,
    receiver_id: Uuid,
    body: &str,
) -> AppResult<Message> {
    if body.trim().is_empty() {
        return Err(ChatError::validation("message", "must not be empty"));
    }
    if body.chars().count() > MAX_MESSAGE_LEN {
        return Err(ChatError::validation("message", format!("must be at most {MAX_MESSAGE_LEN} characters")));
    }
    if profiles::find_profile(db_pool, receiver_id).await?.is_none() {
        return Err(ChatError::ProfileNotFound { id: receiver_id });
    }

    let msg = Message {
        id: Uuid::now_v7(),
        sender_id,
        receiver_id,
        body: body.to_owned(),
        created_at: Utc::now(),
        read: false,
    };
    insert_message(db_pool, sender_id, &msg).await?;

    notifier.publish(&msg);
    info!(message_id = %msg.id, "sent message");
    Ok(msg)
}

/// Persists a fully formed message on behalf of `caller`, who must be its
/// sender. Does not notify subscribers.
pub async fn insert_message(db_pool: &SqlitePool, caller: Uuid, msg: &Message) -> AppResult<()> {
    authz::ensure_chat_insert(caller, msg.sender_id)?;

    sqlx::query("INSERT INTO chats (id,sender_id,receiver_id,message,created_at,read) VALUES (?,?,?,?,?,?)")
        .bind(msg.id)
        .bind(msg.sender_id)
        .bind(msg.receiver_id)
        .bind(&msg.body)
        .bind(msg.created_at)
        .bind(msg.read)
        .execute(db_pool)
        .await?;

    Ok(())
}

/// All messages between `user_a` and `user_b`, oldest first; equal
/// timestamps fall back to id order.
#[instrument(skip_all, fields(caller = %caller, user_a = %user_a, user_b = %user_b))]
pub async fn fetch_conversation(
    db_pool: &SqlitePool,
    caller: Uuid,
    user_a: Uuid,
    user_b: Uuid,
) -> AppResult<Vec<Message>> {
    authz::ensure_conversation_party(caller, user_a, user_b)?;

    let msgs = sqlx::query_as::<_, Message>(
        "SELECT * FROM chats \
         WHERE (sender_id=? AND receiver_id=?) OR (sender_id=? AND receiver_id=?) \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_all(db_pool)
    .await?;

    debug!(count = msgs.len(), "fetched conversation");
    Ok(msgs.into_iter().filter(|msg| authz::can_read_chat(caller, msg)).collect())
}

pub async fn get_message(db_pool: &SqlitePool, caller: Uuid, id: Uuid) -> AppResult<Message> {
    sqlx::query_as::<_, Message>("SELECT * FROM chats WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .filter(|msg| authz::can_read_chat(caller, msg))
        .ok_or(ChatError::MessageNotFound { id })
}

/// Sets the read flag. Only the receiver may, and repeating it is harmless.
#[instrument(skip_all, fields(caller = %caller, message_id = %id))]
pub async fn mark_read(db_pool: &SqlitePool, caller: Uuid, id: Uuid) -> AppResult<Message> {
    let mut msg = get_message(db_pool, caller, id).await?;
    authz::ensure_chat_receiver(caller, &msg)?;

    if !msg.read {
        sqlx::query("UPDATE chats SET read=TRUE WHERE id=?")
            .bind(id)
            .execute(db_pool)
            .await?;
        msg.read = true;
        debug!("marked message read");
    }

    Ok(msg)
}
