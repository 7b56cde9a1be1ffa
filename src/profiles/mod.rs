mod handlers;

use axum::{routing::get, Router};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{authz, db::{self, Profile}, pin, AppResult, AppState, ChatError};

pub const MAX_DISPLAY_NAME_LEN: usize = 64;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::my_profile).patch(handlers::update_my_profile))
        .route("/{id}", get(handlers::profile))
}

/// Changes to a profile. An empty `avatar_url` clears the avatar.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub fn validate_display_name(display_name: &str) -> AppResult<String> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(ChatError::validation("display_name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ChatError::validation(
            "display_name",
            format!("must be at most {MAX_DISPLAY_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Inserts the profile for a fresh account under a newly allocated PIN.
///
/// Runs on the caller's connection so it can share the account's transaction.
pub async fn create_profile(
    conn: &mut SqliteConnection,
    id: Uuid,
    display_name: &str,
    max_attempts: u32,
    mut next_candidate: impl FnMut() -> String,
) -> AppResult<Profile> {
    let display_name = validate_display_name(display_name)?;

    let mut remaining = max_attempts;
    while remaining > 0 {
        let (pin, drawn) = pin::allocate_pin(conn, remaining, &mut next_candidate)
            .await
            .map_err(|e| match e {
                ChatError::AllocationExhausted { .. } => ChatError::AllocationExhausted { attempts: max_attempts },
                e => e,
            })?;
        remaining -= drawn;

        let now = Utc::now();
        let profile = Profile {
            id,
            pin,
            display_name: display_name.clone(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        let inserted = sqlx::query("INSERT INTO profiles (id,private_pin,display_name,avatar_url,created_at,updated_at) VALUES (?,?,?,?,?,?)")
            .bind(profile.id)
            .bind(&profile.pin)
            .bind(&profile.display_name)
            .bind(&profile.avatar_url)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .execute(&mut *conn)
            .await;

        match inserted {
            Ok(_) => {
                info!(profile_id = %profile.id, "created profile");
                return Ok(profile);
            }
            Err(e) if db::violates_unique(&e, "profiles.private_pin") => {
                debug!(remaining, "pin claimed concurrently, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ChatError::AllocationExhausted { attempts: max_attempts })
}

pub async fn find_profile(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Profile>> {
    Ok(sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?)
}

/// Profiles are readable by any signed-in caller; `caller` only proves that.
#[instrument(skip_all, fields(caller = %caller, profile_id = %id))]
pub async fn get_profile(db_pool: &SqlitePool, caller: Uuid, id: Uuid) -> AppResult<Profile> {
    find_profile(db_pool, id)
        .await?
        .ok_or(ChatError::ProfileNotFound { id })
}

pub async fn find_by_pin(db_pool: &SqlitePool, pin: &str) -> AppResult<Option<Profile>> {
    Ok(sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE private_pin=?")
        .bind(pin)
        .fetch_optional(db_pool)
        .await?)
}

#[instrument(skip_all, fields(caller = %caller, profile_id = %id))]
pub async fn update_profile(db_pool: &SqlitePool, caller: Uuid, id: Uuid, patch: ProfilePatch) -> AppResult<Profile> {
    authz::ensure_profile_owner(caller, id)?;

    let mut profile = find_profile(db_pool, id)
        .await?
        .ok_or(ChatError::ProfileNotFound { id })?;

    if let Some(display_name) = patch.display_name {
        profile.display_name = validate_display_name(&display_name)?;
    }
    if let Some(avatar_url) = patch.avatar_url {
        let avatar_url = avatar_url.trim();
        profile.avatar_url = (!avatar_url.is_empty()).then(|| avatar_url.to_owned());
    }
    profile.updated_at = Utc::now();

    sqlx::query("UPDATE profiles SET display_name=?, avatar_url=?, updated_at=? WHERE id=?")
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(profile.updated_at)
        .bind(profile.id)
        .execute(db_pool)
        .await?;

    info!("updated profile");
    Ok(profile)
}
