//! Bulk maintenance operations: full data wipe and full data export.
//!
//! Both are debugging/testing tools, not part of the normal sync path. The
//! wipe is the only way sessions are ever deleted outside the retention
//! sweep.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::posts::PostRow;
use crate::sessions::SessionRow;
use crate::DbError;

/// A full dump of the store's three collections.
#[derive(Debug, Serialize)]
pub struct DataExport {
    pub posts: Vec<PostRow>,
    pub sessions: Vec<SessionRow>,
    pub config: Vec<ConfigEntry>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

/// Deletes every row from all three collections. Returns the total number of
/// rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any delete fails.
pub async fn clear_all_data(pool: &SqlitePool) -> Result<u64, DbError> {
    let mut removed = 0u64;
    for table in ["posts", "sessions", "config_entries"] {
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await?;
        removed += result.rows_affected();
    }

    tracing::warn!(removed, "cleared all store data");
    Ok(removed)
}

/// Dumps the entire store, posts and sessions newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn export_data(pool: &SqlitePool, exported_at: DateTime<Utc>) -> Result<DataExport, DbError> {
    let posts = sqlx::query_as::<_, PostRow>(
        "SELECT id, channel, author, content, published_time_text, published_at, \
                likes, images, extracted_at, source_url, session_id, \
                delivered_to_sink, delivered_at \
         FROM posts \
         ORDER BY extracted_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    let sessions = sqlx::query_as::<_, SessionRow>(
        "SELECT session_id, run_type, created_at, activation_cutoff, interval_minutes, \
                posts_found, posts_new, status, error_message, duration_ms \
         FROM sessions \
         ORDER BY created_at DESC, session_id DESC",
    )
    .fetch_all(pool)
    .await?;

    let config = sqlx::query_as::<_, ConfigEntry>(
        "SELECT key, value FROM config_entries ORDER BY key",
    )
    .fetch_all(pool)
    .await?;

    Ok(DataExport {
        posts,
        sessions,
        config,
        exported_at,
    })
}
