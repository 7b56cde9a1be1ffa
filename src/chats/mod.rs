mod conversation;
pub mod msg;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use msg::{fetch_conversation, insert_message, mark_read, send_message};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::chat_ws))
        .route("/messages/{id}/read", post(conversation::mark_read))
        .route("/{peer}", get(conversation::conversation).post(conversation::send))
}
