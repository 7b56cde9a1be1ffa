//! Six-digit contact PINs.
//!
//! A PIN is checked against existing profiles before use, but the check and
//! the profile insert are separate statements. The `UNIQUE(private_pin)`
//! constraint decides the race; `profiles::create_profile` treats a violation
//! as a collision and draws again. Every candidate drawn counts against the
//! same attempt budget.

use rand::Rng;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::{AppResult, ChatError};

pub const PIN_LEN: usize = 6;
const PIN_SPACE: u32 = 1_000_000;

pub fn random_pin() -> String {
    format!("{:06}", rand::rng().random_range(0..PIN_SPACE))
}

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LEN && pin.bytes().all(|b| b.is_ascii_digit())
}

pub async fn pin_taken(conn: &mut SqliteConnection, pin: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("SELECT 1 FROM profiles WHERE private_pin=?")
        .bind(pin)
        .fetch_optional(conn)
        .await?
        .is_some())
}

/// Returns the first candidate not held by any profile, together with the
/// number of candidates drawn to find it.
pub async fn allocate_pin(
    conn: &mut SqliteConnection,
    max_attempts: u32,
    mut next_candidate: impl FnMut() -> String,
) -> AppResult<(String, u32)> {
    for attempt in 1..=max_attempts {
        let candidate = next_candidate();
        if !pin_taken(conn, &candidate).await? {
            debug!(attempt, "allocated pin");
            return Ok((candidate, attempt));
        }
        debug!(attempt, "pin collision");
    }

    warn!(max_attempts, "pin space exhausted");
    Err(ChatError::AllocationExhausted { attempts: max_attempts })
}
