//! The dedup / incremental-sync decision.
//!
//! For each candidate, in input order: derive the fingerprint, resolve the
//! publish instant, drop anything older than the activation cutoff, then
//! atomically claim the id in the store. The claim (`INSERT OR IGNORE`) is
//! both the dedup check and the persistence step, so two overlapping runs
//! racing on the same candidate cannot both treat it as new — exactly one
//! insert wins.

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use postwatch_db::PostRow;

use crate::fingerprint::post_fingerprint;
use crate::timeparse::parse_relative_time;
use crate::types::CandidatePost;
use crate::SyncError;

/// Classifies `candidates` against the persisted history and claims the new
/// ones, tagging them with `session_id`.
///
/// Returns the newly claimed posts in input order, `delivered_to_sink`
/// false. Candidates published before `activation_cutoff` are skipped
/// without being stored, so a cutoff reset keeps historical posts out of the
/// store entirely.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if any store operation fails; candidates
/// claimed before the failure stay claimed.
pub async fn reconcile_candidates(
    pool: &SqlitePool,
    candidates: &[CandidatePost],
    activation_cutoff: DateTime<Utc>,
    session_id: &str,
    now_local: DateTime<FixedOffset>,
) -> Result<Vec<PostRow>, SyncError> {
    let mut new_posts = Vec::new();

    for candidate in candidates {
        let id = candidate
            .id
            .clone()
            .unwrap_or_else(|| post_fingerprint(&candidate.author, &candidate.content));

        let published_at =
            parse_relative_time(&candidate.published_time, now_local).with_timezone(&Utc);

        if published_at < activation_cutoff {
            tracing::debug!(
                id = %id,
                published_time = %candidate.published_time,
                "candidate predates activation cutoff"
            );
            continue;
        }

        let post = PostRow {
            id,
            channel: candidate.channel.clone(),
            author: candidate.author.clone(),
            content: candidate.content.clone(),
            published_time_text: candidate.published_time.clone(),
            published_at,
            likes: candidate.likes.clone(),
            images: Json(candidate.images.clone()),
            extracted_at: candidate.extracted_at,
            source_url: candidate.source_url.clone(),
            session_id: session_id.to_string(),
            delivered_to_sink: false,
            delivered_at: None,
        };

        if postwatch_db::claim_post(pool, &post).await? {
            tracing::debug!(id = %post.id, "claimed new post");
            new_posts.push(post);
        } else {
            tracing::debug!(id = %post.id, "post already processed");
        }
    }

    tracing::info!(
        found = candidates.len(),
        new = new_posts.len(),
        "reconciliation complete"
    );
    Ok(new_posts)
}
