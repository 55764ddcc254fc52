//! Database operations for the `posts` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `posts` table.
///
/// Rows are immutable after insert except for the delivery-status pair
/// (`delivered_to_sink`, `delivered_at`), which is flipped exactly once by
/// [`mark_posts_delivered`].
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PostRow {
    /// Content-derived fingerprint; unique across everything ever stored.
    pub id: String,
    pub channel: String,
    pub author: String,
    pub content: String,
    /// Raw relative-time string as scraped (e.g. `"hace 2 días"`).
    pub published_time_text: String,
    /// Absolute instant derived once at reconciliation; persisted so the raw
    /// text never needs re-parsing.
    pub published_at: DateTime<Utc>,
    /// Informational counter, kept as scraped text (`"1,2 K"` and friends).
    pub likes: String,
    pub images: Json<Vec<String>>,
    pub extracted_at: DateTime<Utc>,
    pub source_url: String,
    /// Weak back-reference to the session that first persisted this post.
    pub session_id: String,
    pub delivered_to_sink: bool,
    pub delivered_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Atomically claims a post id: inserts the row if and only if no row with
/// the same `id` exists. Returns `true` when this call won the claim.
///
/// This is the reservation write that makes reconciliation safe against
/// overlapping runs — two batches carrying the same candidate race on the
/// insert, and exactly one of them observes `true`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn claim_post(pool: &SqlitePool, post: &PostRow) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO posts \
             (id, channel, author, content, published_time_text, published_at, \
              likes, images, extracted_at, source_url, session_id, \
              delivered_to_sink, delivered_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.id)
    .bind(&post.channel)
    .bind(&post.author)
    .bind(&post.content)
    .bind(&post.published_time_text)
    .bind(post.published_at)
    .bind(&post.likes)
    .bind(&post.images)
    .bind(post.extracted_at)
    .bind(&post.source_url)
    .bind(&post.session_id)
    .bind(post.delivered_to_sink)
    .bind(post.delivered_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Upserts a batch of posts; an existing row with the same `id` is
/// overwritten wholesale. Used for applying delivery-status mutations and by
/// import-style tooling — new posts should go through [`claim_post`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn upsert_posts(pool: &SqlitePool, posts: &[PostRow]) -> Result<(), DbError> {
    for post in posts {
        sqlx::query(
            "INSERT INTO posts \
                 (id, channel, author, content, published_time_text, published_at, \
                  likes, images, extracted_at, source_url, session_id, \
                  delivered_to_sink, delivered_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET \
                 channel             = excluded.channel, \
                 author              = excluded.author, \
                 content             = excluded.content, \
                 published_time_text = excluded.published_time_text, \
                 published_at        = excluded.published_at, \
                 likes               = excluded.likes, \
                 images              = excluded.images, \
                 extracted_at        = excluded.extracted_at, \
                 source_url          = excluded.source_url, \
                 session_id          = excluded.session_id, \
                 delivered_to_sink   = excluded.delivered_to_sink, \
                 delivered_at        = excluded.delivered_at",
        )
        .bind(&post.id)
        .bind(&post.channel)
        .bind(&post.author)
        .bind(&post.content)
        .bind(&post.published_time_text)
        .bind(post.published_at)
        .bind(&post.likes)
        .bind(&post.images)
        .bind(post.extracted_at)
        .bind(&post.source_url)
        .bind(&post.session_id)
        .bind(post.delivered_to_sink)
        .bind(post.delivered_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Returns a single post by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post(pool: &SqlitePool, id: &str) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, channel, author, content, published_time_text, published_at, \
                likes, images, extracted_at, source_url, session_id, \
                delivered_to_sink, delivered_at \
         FROM posts \
         WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the total number of stored posts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64, DbError> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?)
}

/// Returns the most recent `limit` posts, ordered by extraction date,
/// newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, channel, author, content, published_time_text, published_at, \
                likes, images, extracted_at, source_url, session_id, \
                delivered_to_sink, delivered_at \
         FROM posts \
         ORDER BY extracted_at DESC, id DESC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes every post whose `extracted_at` is strictly before `cutoff`.
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_posts_extracted_before(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM posts WHERE extracted_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Marks the listed posts as delivered to the sink, stamping `delivered_at`.
/// Ids with no matching row are skipped. Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any update fails.
pub async fn mark_posts_delivered(
    pool: &SqlitePool,
    ids: &[String],
    delivered_at: DateTime<Utc>,
) -> Result<u64, DbError> {
    let mut updated = 0u64;
    for id in ids {
        let result = sqlx::query(
            "UPDATE posts SET delivered_to_sink = 1, delivered_at = ? WHERE id = ?",
        )
        .bind(delivered_at)
        .bind(id)
        .execute(pool)
        .await?;
        updated += result.rows_affected();
    }
    Ok(updated)
}

/// Returns up to `limit` posts not yet delivered to the sink, oldest
/// extraction first so a resend replays them in arrival order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_undelivered_posts(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, channel, author, content, published_time_text, published_at, \
                likes, images, extracted_at, source_url, session_id, \
                delivered_to_sink, delivered_at \
         FROM posts \
         WHERE delivered_to_sink = 0 \
         ORDER BY extracted_at ASC, id ASC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
