pub mod appresult;
pub mod auth;
pub mod authz;
pub mod chats;
pub mod config;
pub mod connections;
pub mod db;
pub mod extract;
pub mod pin;
pub mod profiles;
pub mod realtime;
pub mod session;

use std::sync::Arc;

use axum::{extract::FromRef, http::{header, HeaderValue, Method}, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppResult, ChatError};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub notifier: realtime::Notifier,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            db_pool,
            notifier: realtime::Notifier::new(config.realtime_capacity),
            config: Arc::new(config),
        }
    }
}

/// The complete HTTP surface, sessions included.
pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.session_secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(state.config.session_inactivity_minutes)));

    let mut app = Router::new()
        .nest("/auth", auth::router())
        .nest("/profiles", profiles::router())
        .merge(connections::router())
        .nest("/chats", chats::router())
        .with_state(state.clone())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = state.config.cors_origin.as_deref() {
        match HeaderValue::from_str(origin) {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_credentials(true)
                        .allow_methods([Method::GET, Method::POST, Method::PATCH])
                        .allow_headers([header::CONTENT_TYPE]),
                );
            }
            Err(e) => tracing::warn!(%origin, error = %e, "ignoring invalid CORS_ORIGIN"),
        }
    }

    app
}
