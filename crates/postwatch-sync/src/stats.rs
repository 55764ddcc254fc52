//! Aggregate store statistics for the observability surface.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use postwatch_db::{PostRow, SessionRow};

use crate::retention::LAST_CLEANUP_KEY;
use crate::SyncError;

const RECENT_POSTS_LIMIT: i64 = 10;
const RECENT_SESSIONS_LIMIT: i64 = 5;

/// Snapshot of store totals and recent activity.
#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub total_posts: i64,
    pub total_sessions: i64,
    /// Newest first, at most 10.
    pub recent_posts: Vec<PostRow>,
    /// Newest first, at most 5.
    pub recent_sessions: Vec<SessionRow>,
    pub last_cleanup: Option<DateTime<Utc>>,
}

/// Collects totals, the most recent posts and sessions, and the last cleanup
/// instant.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if any query fails.
pub async fn collect_stats(pool: &SqlitePool) -> Result<StatsSummary, SyncError> {
    let total_posts = postwatch_db::count_posts(pool).await?;
    let total_sessions = postwatch_db::count_sessions(pool).await?;
    let recent_posts = postwatch_db::recent_posts(pool, RECENT_POSTS_LIMIT).await?;
    let recent_sessions = postwatch_db::recent_sessions(pool, RECENT_SESSIONS_LIMIT).await?;

    let last_cleanup = postwatch_db::get_config_value(pool, LAST_CLEANUP_KEY)
        .await?
        .and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });

    Ok(StatsSummary {
        total_posts,
        total_sessions,
        recent_posts,
        recent_sessions,
        last_cleanup,
    })
}
