//! Orchestration skeleton for one batch submission: start session →
//! reconcile/claim → deliver → mark delivered → finish session.
//!
//! Delivery is a caller-supplied boxed-future closure so the engine stays
//! independent of the sink transport. A delivery failure is an outcome, not
//! an error: the claimed posts stay persisted undelivered and the session
//! still completes, so a later resend can pick them up.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use postwatch_db::PostRow;

use crate::reconcile::reconcile_candidates;
use crate::timeparse::local_now;
use crate::tracker::{self, RunType};
use crate::types::CandidatePost;
use crate::SyncError;

/// Config key the last successful delivery instant is stored under.
pub const LAST_DELIVERY_KEY: &str = "last_delivery";

/// Config key the persisted activation cutoff is stored under. Reset by the
/// caller whenever watching is (re)enabled, so historical posts never count
/// as new.
pub const ACTIVATION_CUTOFF_KEY: &str = "activation_cutoff";

/// Per-batch parameters.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub run_type: RunType,
    /// Posts published before this instant are ignored regardless of novelty.
    pub activation_cutoff: DateTime<Utc>,
    /// Recorded on the session; informational.
    pub interval_minutes: u32,
    /// Offset of the local clock the relative timestamps are parsed against.
    pub utc_offset_hours: i32,
}

/// How the delivery step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// No new posts, nothing to send.
    Skipped,
    /// Sink confirmed the batch; posts are marked delivered.
    Succeeded,
    /// Sink rejected or was unreachable; posts stay persisted, undelivered.
    Failed,
}

/// Result of one batch submission.
#[derive(Debug)]
pub struct BatchOutcome {
    pub session_id: String,
    pub posts_found: usize,
    pub posts_new: usize,
    pub delivery: DeliveryStatus,
}

/// Runs one full batch: session bookkeeping around reconciliation and
/// delivery. `deliver` receives the newly claimed posts and reports plain
/// success; it is only invoked when there is something to send.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if any store operation fails. The session is
/// closed as `error` (best effort) before the error propagates.
pub async fn run_batch<F>(
    pool: &SqlitePool,
    candidates: &[CandidatePost],
    options: &BatchOptions,
    deliver: F,
) -> Result<BatchOutcome, SyncError>
where
    F: for<'a> FnOnce(&'a [PostRow]) -> Pin<Box<dyn Future<Output = bool> + 'a>>,
{
    let started = Instant::now();
    let session_id = tracker::start_session(
        pool,
        options.run_type,
        options.activation_cutoff,
        options.interval_minutes,
        Utc::now(),
    )
    .await?;

    match run_batch_inner(pool, candidates, options, &session_id, deliver).await {
        Ok((posts_new, delivery)) => {
            tracker::finish_completed(pool, &session_id, elapsed_ms(started)).await?;
            Ok(BatchOutcome {
                session_id,
                posts_found: candidates.len(),
                posts_new,
                delivery,
            })
        }
        Err(e) => {
            fail_session_best_effort(pool, &session_id, &e.to_string(), elapsed_ms(started)).await;
            Err(e)
        }
    }
}

async fn run_batch_inner<F>(
    pool: &SqlitePool,
    candidates: &[CandidatePost],
    options: &BatchOptions,
    session_id: &str,
    deliver: F,
) -> Result<(usize, DeliveryStatus), SyncError>
where
    F: for<'a> FnOnce(&'a [PostRow]) -> Pin<Box<dyn Future<Output = bool> + 'a>>,
{
    let now_local = local_now(options.utc_offset_hours);
    let new_posts = reconcile_candidates(
        pool,
        candidates,
        options.activation_cutoff,
        session_id,
        now_local,
    )
    .await?;

    tracker::record_counts(
        pool,
        session_id,
        Some(candidates.len()),
        Some(new_posts.len()),
    )
    .await?;

    let delivery = if new_posts.is_empty() {
        tracing::info!(session = %session_id, "no new posts, skipping delivery");
        DeliveryStatus::Skipped
    } else if deliver(&new_posts).await {
        let ids: Vec<String> = new_posts.iter().map(|p| p.id.clone()).collect();
        let delivered_at = Utc::now();
        postwatch_db::mark_posts_delivered(pool, &ids, delivered_at).await?;
        postwatch_db::put_config_value(pool, LAST_DELIVERY_KEY, &delivered_at.to_rfc3339())
            .await?;
        tracing::info!(session = %session_id, delivered = ids.len(), "batch delivered");
        DeliveryStatus::Succeeded
    } else {
        tracing::warn!(
            session = %session_id,
            undelivered = new_posts.len(),
            "delivery failed, posts kept for a later resend"
        );
        DeliveryStatus::Failed
    };

    Ok((new_posts.len(), delivery))
}

/// Closes the session as errored, logging instead of propagating a secondary
/// failure so the primary error stays visible.
async fn fail_session_best_effort(
    pool: &SqlitePool,
    session_id: &str,
    message: &str,
    duration_ms: i64,
) {
    if let Err(e) = tracker::finish_error(pool, session_id, message, duration_ms).await {
        tracing::error!(
            session = %session_id,
            error = %e,
            "failed to record session error"
        );
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
