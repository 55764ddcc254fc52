//! Session lifecycle bookkeeping.
//!
//! Every batch submission gets a session row, whether or not it finds
//! anything: created `running`, counters patched as the run progresses, and
//! finished exactly once as `completed` or `error`.

use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use postwatch_db::NewSession;

use crate::SyncError;

/// What triggered a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    Manual,
    Scheduled,
    Test,
}

impl RunType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunType::Manual => "manual",
            RunType::Scheduled => "scheduled",
            RunType::Test => "test",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates a session in `running` status with zero counters and returns its
/// id.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the insert fails.
pub async fn start_session(
    pool: &SqlitePool,
    run_type: RunType,
    activation_cutoff: DateTime<Utc>,
    interval_minutes: u32,
    now: DateTime<Utc>,
) -> Result<String, SyncError> {
    let session_id = generate_session_id(now);
    postwatch_db::create_session(
        pool,
        &NewSession {
            session_id: &session_id,
            run_type: run_type.as_str(),
            created_at: now,
            activation_cutoff,
            interval_minutes: i64::from(interval_minutes),
        },
    )
    .await?;

    tracing::info!(session = %session_id, run_type = %run_type, "session started");
    Ok(session_id)
}

/// Patches the session's counters; `None` leaves a counter untouched.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the update fails or the session is missing.
pub async fn record_counts(
    pool: &SqlitePool,
    session_id: &str,
    posts_found: Option<usize>,
    posts_new: Option<usize>,
) -> Result<(), SyncError> {
    postwatch_db::record_session_counts(
        pool,
        session_id,
        posts_found.map(to_count),
        posts_new.map(to_count),
    )
    .await?;
    Ok(())
}

/// Terminal happy-path update: `running` → `completed`.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the session is not `running` or the update
/// fails.
pub async fn finish_completed(
    pool: &SqlitePool,
    session_id: &str,
    duration_ms: i64,
) -> Result<(), SyncError> {
    postwatch_db::complete_session(pool, session_id, duration_ms).await?;
    tracing::info!(session = %session_id, duration_ms, "session completed");
    Ok(())
}

/// Terminal error update: `running` → `error` with a message.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the session is not `running` or the update
/// fails.
pub async fn finish_error(
    pool: &SqlitePool,
    session_id: &str,
    message: &str,
    duration_ms: i64,
) -> Result<(), SyncError> {
    postwatch_db::fail_session(pool, session_id, message, duration_ms).await?;
    tracing::warn!(session = %session_id, error = %message, "session failed");
    Ok(())
}

/// Time-ordered unique id: creation millis for ordering, a uuid fragment so
/// two sessions started in the same millisecond still differ.
fn generate_session_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", now.timestamp_millis(), &suffix[..8])
}

fn to_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_type_round_trips_display() {
        assert_eq!(RunType::Manual.to_string(), "manual");
        assert_eq!(RunType::Scheduled.to_string(), "scheduled");
        assert_eq!(RunType::Test.to_string(), "test");
    }

    #[test]
    fn session_ids_are_time_ordered_and_unique() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::seconds(2);

        let a = generate_session_id(earlier);
        let b = generate_session_id(later);
        assert!(a < b, "{a} should sort before {b}");
        assert_ne!(generate_session_id(earlier), generate_session_id(earlier));
    }
}
