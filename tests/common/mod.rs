#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use pinchat::{db::{self, Profile}, profiles, Config};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

pub async fn test_pool() -> SqlitePool {
    let db_pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&db_pool)
        .await
        .expect("Failed to run migrations");
    db_pool
}

pub fn test_config() -> Config {
    Config {
        bcrypt_cost: pinchat::config::BCRYPT_MIN_COST,
        pin_max_attempts: 8,
        realtime_capacity: 64,
        ..Config::default()
    }
}

/// Creates an account and profile holding exactly `pin`.
pub async fn seed_profile(db_pool: &SqlitePool, pin: &str, display_name: &str) -> Profile {
    let id = Uuid::now_v7();
    let mut tx = db_pool.begin().await.unwrap();

    sqlx::query("INSERT INTO accounts (id,email,password_hash,created_at) VALUES (?,?,?,?)")
        .bind(id)
        .bind(format!("{}@example.com", id.simple()))
        .bind("not-a-real-hash")
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .unwrap();

    let pin = pin.to_owned();
    let profile = profiles::create_profile(&mut tx, id, display_name, 1, move || pin.clone())
        .await
        .unwrap();

    tx.commit().await.unwrap();
    profile
}

/// One browser: keeps the session cookie between requests.
pub struct Client {
    app: Router,
    pub cookie: Option<String>,
}

impl Client {
    pub fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.dispatch(method, uri, body.map(|body| body.to_string())).await
    }

    /// Sends `body` as-is with a JSON content type.
    pub async fn send_raw(&mut self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        self.dispatch(method, uri, Some(body.to_owned())).await
    }

    async fn dispatch(&mut self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(req).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_owned();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn signup(&mut self, email: &str, display_name: &str) -> Value {
        let (status, profile) = self
            .send(
                Method::POST,
                "/auth/signup",
                Some(json!({ "email": email, "password": "hunter2hunter2", "display_name": display_name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{profile}");
        profile
    }
}
