//! Password accounts. Each account owns exactly one profile, created in the
//! same transaction as the account row.

use axum::{routing::{get, post}, Router};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{config::Config, db::{self, Profile}, pin, profiles, AppResult, AppState, ChatError};

mod login;
mod logout;
mod signup;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/me", get(login::me))
}

#[derive(Debug, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ChatError::validation("email", "must look like name@example.com")),
    }
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(ChatError::from)
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(ChatError::from)
}

/// Creates the account and its profile, returning the profile with its
/// freshly allocated PIN.
#[instrument(skip_all, fields(email = %account.email))]
pub async fn sign_up(db_pool: &SqlitePool, config: &Config, account: NewAccount) -> AppResult<Profile> {
    let email = normalize_email(&account.email)?;
    if account.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ChatError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    profiles::validate_display_name(&account.display_name)?;

    let password_hash = hash_password(account.password, config.bcrypt_cost).await?;
    let id = Uuid::now_v7();

    let mut tx = db_pool.begin().await?;

    sqlx::query("INSERT INTO accounts (id,email,password_hash,created_at) VALUES (?,?,?,?)")
        .bind(id)
        .bind(&email)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if db::violates_unique(&e, "accounts.email") {
                ChatError::auth("email already registered")
            } else {
                e.into()
            }
        })?;

    let profile = profiles::create_profile(
        &mut tx,
        id,
        &account.display_name,
        config.pin_max_attempts,
        pin::random_pin,
    )
    .await?;

    tx.commit().await?;

    info!(user_id = %id, "signed up");
    Ok(profile)
}

/// Checks credentials and returns the account's identity.
#[instrument(skip_all)]
pub async fn sign_in(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<Uuid> {
    let invalid = || ChatError::auth("invalid email or password");
    let email = normalize_email(email).map_err(|_| invalid())?;

    let Some((id, password_hash)): Option<(Uuid, String)> =
        sqlx::query_as("SELECT id,password_hash FROM accounts WHERE email=?")
            .bind(&email)
            .fetch_optional(db_pool)
            .await?
    else {
        warn!("sign in for unknown email");
        return Err(invalid());
    };

    if !verify_password(password.to_owned(), password_hash).await? {
        warn!(user_id = %id, "sign in with wrong password");
        return Err(invalid());
    }

    info!(user_id = %id, "signed in");
    Ok(id)
}
