use axum::{
    debug_handler,
    extract::{ws::{Message as Frame, WebSocket}, State, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    db::Message,
    realtime::{Event, Notifier, Subscription},
    session::CurrentUser,
    AppResult, ChatError,
};

use super::msg;

/// Inbound frame: send `message` to `receiver_id`.
#[derive(Debug, Deserialize)]
pub(crate) struct OutgoingFrame {
    receiver_id: Uuid,
    message: String,
}

/// Everything the server writes to the socket, tagged by `type`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerFrame {
    Message(Message),
    /// Messages were dropped; refetch conversations.
    Resync { skipped: u64 },
    Error { error: String },
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    CurrentUser(user_id): CurrentUser,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let session_id = session.id().ok_or_else(|| ChatError::auth("not signed in"))?;
    let subscription = notifier.subscribe_in_session(session_id, user_id);

    Ok(ws.on_upgrade(move |stream| run_socket(stream, db_pool, notifier, subscription)))
}

async fn run_socket(stream: WebSocket, db_pool: SqlitePool, notifier: Notifier, mut subscription: Subscription) {
    let user_id = subscription.user_id();
    let (mut sender, mut receiver) = stream.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerFrame>(16);

    let mut forward_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                event = subscription.next() => match event {
                    Some(Event::Message(msg)) => ServerFrame::Message(msg),
                    Some(Event::Lagged { skipped }) => ServerFrame::Resync { skipped },
                    None => break,
                },
                Some(reply) = reply_rx.recv() => reply,
            };

            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode websocket frame");
                    continue;
                }
            };
            if sender.send(Frame::Text(text.into())).await.is_err() {
                break;
            }
        }
        subscription.unsubscribe();
        let _ = sender.send(Frame::Close(None)).await;
    });

    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            let text = match frame {
                Frame::Text(text) => text,
                Frame::Close(_) => break,
                _ => continue,
            };

            let result = match serde_json::from_str::<OutgoingFrame>(text.as_str()) {
                Ok(OutgoingFrame { receiver_id, message }) => {
                    msg::send_message(&db_pool, &notifier, user_id, receiver_id, &message).await
                }
                Err(e) => Err(ChatError::validation("frame", e.to_string())),
            };

            if let Err(e) = result {
                warn!(error = %e, "send over websocket failed");
                let reply = ServerFrame::Error { error: e.client_message() };
                if reply_tx.send(reply).await.is_err() {
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    };
    debug!(%user_id, "websocket closed");
}
