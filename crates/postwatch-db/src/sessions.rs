//! Database operations for the `sessions` table.
//!
//! A session's `status` only ever moves forward (`running` → `completed` or
//! `running` → `error`). The terminal updates enforce this with a conditional
//! `WHERE status = 'running'` so a late writer cannot resurrect a finished
//! run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::DbError;

pub const SESSION_STATUS_RUNNING: &str = "running";
pub const SESSION_STATUS_COMPLETED: &str = "completed";
pub const SESSION_STATUS_ERROR: &str = "error";

/// Message written by [`reap_stale_sessions`] onto runs it closes.
const REAPED_MESSAGE: &str = "reaped: run never reported completion";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sessions` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SessionRow {
    pub session_id: String,
    /// `manual` | `scheduled` | `test`.
    pub run_type: String,
    pub created_at: DateTime<Utc>,
    /// Posts published before this instant are ignored regardless of novelty.
    pub activation_cutoff: DateTime<Utc>,
    /// Scheduling interval in effect when the run happened. Informational.
    pub interval_minutes: i64,
    pub posts_found: i64,
    pub posts_new: i64,
    pub status: String,
    pub error_message: Option<String>,
    pub duration_ms: i64,
}

/// Creation parameters for a session; counters start at zero and `status`
/// starts as `running`.
pub struct NewSession<'a> {
    pub session_id: &'a str,
    pub run_type: &'a str,
    pub created_at: DateTime<Utc>,
    pub activation_cutoff: DateTime<Utc>,
    pub interval_minutes: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a new session in `running` status with zero counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// `session_id`).
pub async fn create_session(pool: &SqlitePool, session: &NewSession<'_>) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO sessions \
             (session_id, run_type, created_at, activation_cutoff, interval_minutes, \
              posts_found, posts_new, status, error_message, duration_ms) \
         VALUES (?, ?, ?, ?, ?, 0, 0, 'running', NULL, 0)",
    )
    .bind(session.session_id)
    .bind(session.run_type)
    .bind(session.created_at)
    .bind(session.activation_cutoff)
    .bind(session.interval_minutes)
    .execute(pool)
    .await?;

    Ok(())
}

/// Partially updates a session's counters; `None` fields are left untouched
/// (merge semantics).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no session has the given id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn record_session_counts(
    pool: &SqlitePool,
    session_id: &str,
    posts_found: Option<i64>,
    posts_new: Option<i64>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sessions \
         SET posts_found = COALESCE(?, posts_found), \
             posts_new   = COALESCE(?, posts_new) \
         WHERE session_id = ?",
    )
    .bind(posts_found)
    .bind(posts_new)
    .bind(session_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Marks a running session as `completed` and records its duration.
///
/// # Errors
///
/// Returns [`DbError::InvalidSessionTransition`] if the session does not
/// exist or is no longer `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_session(
    pool: &SqlitePool,
    session_id: &str,
    duration_ms: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sessions \
         SET status = 'completed', duration_ms = ? \
         WHERE session_id = ? AND status = 'running'",
    )
    .bind(duration_ms)
    .bind(session_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSessionTransition {
            session_id: session_id.to_string(),
            expected_status: SESSION_STATUS_RUNNING,
        });
    }

    Ok(())
}

/// Marks a running session as `error`, recording the message and duration.
///
/// # Errors
///
/// Returns [`DbError::InvalidSessionTransition`] if the session does not
/// exist or is no longer `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_session(
    pool: &SqlitePool,
    session_id: &str,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sessions \
         SET status = 'error', error_message = ?, duration_ms = ? \
         WHERE session_id = ? AND status = 'running'",
    )
    .bind(error_message)
    .bind(duration_ms)
    .bind(session_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSessionTransition {
            session_id: session_id.to_string(),
            expected_status: SESSION_STATUS_RUNNING,
        });
    }

    Ok(())
}

/// Fetches a single session by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_session(pool: &SqlitePool, session_id: &str) -> Result<Option<SessionRow>, DbError> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT session_id, run_type, created_at, activation_cutoff, interval_minutes, \
                posts_found, posts_new, status, error_message, duration_ms \
         FROM sessions \
         WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the total number of recorded sessions.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_sessions(pool: &SqlitePool) -> Result<i64, DbError> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions")
        .fetch_one(pool)
        .await?)
}

/// Returns the most recent `limit` sessions, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recent_sessions(pool: &SqlitePool, limit: i64) -> Result<Vec<SessionRow>, DbError> {
    let rows = sqlx::query_as::<_, SessionRow>(
        "SELECT session_id, run_type, created_at, activation_cutoff, interval_minutes, \
                posts_found, posts_new, status, error_message, duration_ms \
         FROM sessions \
         ORDER BY created_at DESC, session_id DESC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes all sessions beyond the newest `keep`. Returns the number of rows
/// deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_sessions(pool: &SqlitePool, keep: i64) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM sessions \
         WHERE session_id NOT IN ( \
             SELECT session_id FROM sessions \
             ORDER BY created_at DESC, session_id DESC \
             LIMIT ? \
         )",
    )
    .bind(keep)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Fails every session still `running` that was created before `cutoff`.
/// A crash mid-run leaves its session `running` forever; this sweep closes
/// such rows so they stop looking like live work. Returns the number of
/// sessions reaped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reap_stale_sessions(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE sessions \
         SET status = 'error', error_message = ? \
         WHERE status = 'running' AND created_at < ?",
    )
    .bind(REAPED_MESSAGE)
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
