//! Retention sweeps that bound storage growth.
//!
//! Posts are purged by extraction age; sessions are pruned to a fixed count
//! and stuck `running` rows older than a staleness window are closed as
//! errors. The last post cleanup instant is recorded in the config
//! collection so the caller can decide when the next sweep is due.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::SyncError;

/// Config key the cleanup timestamp is stored under.
pub const LAST_CLEANUP_KEY: &str = "last_cleanup";

/// Default post retention, in days of extraction age.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;

/// Default number of sessions kept by the sweep, newest first.
pub const DEFAULT_SESSION_KEEP: u32 = 100;

/// Result of a session sweep.
#[derive(Debug, Clone, Copy)]
pub struct SessionSweep {
    /// Stuck `running` sessions closed as errors.
    pub reaped: u64,
    /// Sessions deleted beyond the keep count.
    pub pruned: u64,
}

/// Deletes every post extracted strictly before `now − max_age_days` and
/// stamps [`LAST_CLEANUP_KEY`]. Returns the number of posts deleted.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the delete or the config write fails.
pub async fn cleanup(
    pool: &SqlitePool,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> Result<u64, SyncError> {
    let cutoff = now - Duration::days(i64::from(max_age_days));
    let deleted = postwatch_db::delete_posts_extracted_before(pool, cutoff).await?;
    postwatch_db::put_config_value(pool, LAST_CLEANUP_KEY, &now.to_rfc3339()).await?;

    tracing::info!(max_age_days, deleted, "post retention sweep complete");
    Ok(deleted)
}

/// Reaps stuck `running` sessions older than `stale_after_hours`, then
/// prunes everything beyond the newest `keep` sessions.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if either sweep fails.
pub async fn sweep_sessions(
    pool: &SqlitePool,
    keep: u32,
    stale_after_hours: u64,
    now: DateTime<Utc>,
) -> Result<SessionSweep, SyncError> {
    let stale_cutoff = now - Duration::hours(to_hours(stale_after_hours));
    let reaped = postwatch_db::reap_stale_sessions(pool, stale_cutoff).await?;
    let pruned = postwatch_db::prune_sessions(pool, i64::from(keep)).await?;

    tracing::info!(keep, reaped, pruned, "session retention sweep complete");
    Ok(SessionSweep { reaped, pruned })
}

fn to_hours(hours: u64) -> i64 {
    i64::try_from(hours).unwrap_or(i64::MAX)
}
