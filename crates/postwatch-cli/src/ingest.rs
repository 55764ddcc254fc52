//! The `ingest` command: feed a scraped candidate batch through the
//! reconcile → deliver pipeline.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use postwatch_core::AppConfig;
use postwatch_db::PostRow;
use postwatch_sync::{
    run_batch, BatchOptions, BatchOutcome, CandidatePost, DeliveryStatus, RunType,
    ACTIVATION_CUTOFF_KEY,
};
use postwatch_webhook::WebhookClient;

/// Reads a candidate batch and runs it through the pipeline.
///
/// Candidates come from `input` as a JSON array, or stdin when no path is
/// given. The activation cutoff resolves in priority order: the `--cutoff`
/// flag, the stored `activation_cutoff` config value, then "now" — a store
/// that was never activated treats nothing historical as new.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, the cutoff is
/// malformed, or a store operation fails. A delivery failure is not an
/// error — the claimed posts stay persisted for `resend`.
pub(crate) async fn run_ingest(
    pool: &SqlitePool,
    config: &AppConfig,
    input: Option<&Path>,
    cutoff_arg: Option<&str>,
    run_type: RunType,
) -> anyhow::Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let candidates: Vec<CandidatePost> =
        serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("invalid candidate batch: {e}"))?;

    let activation_cutoff = resolve_cutoff(pool, cutoff_arg).await?;
    tracing::info!(
        candidates = candidates.len(),
        cutoff = %activation_cutoff,
        run_type = %run_type,
        "ingesting batch"
    );

    let options = BatchOptions {
        run_type,
        activation_cutoff,
        interval_minutes: config.interval_minutes,
        utc_offset_hours: config.utc_offset_hours,
    };

    let client = match config.webhook_url.as_deref() {
        Some(url) => Some(WebhookClient::new(url, config.webhook_timeout_secs)?),
        None => None,
    };
    let channel = config.channel.clone();
    let source_url = config.source_url.clone();

    let outcome = run_batch(pool, &candidates, &options, move |posts: &[PostRow]| {
        Box::pin(async move {
            let Some(client) = client else {
                tracing::warn!("POSTWATCH_WEBHOOK_URL is not set; keeping posts undelivered");
                return false;
            };
            match client
                .send_batch(&channel, &source_url, posts, Utc::now())
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "webhook delivery failed");
                    false
                }
            }
        })
    })
    .await?;

    print_outcome(&outcome);
    Ok(())
}

/// Picks the activation cutoff for this batch: explicit flag, then the
/// stored value, then "now". An unreadable stored value degrades to "now"
/// with a warning — the safe direction, since "now" admits nothing old.
async fn resolve_cutoff(
    pool: &SqlitePool,
    cutoff_arg: Option<&str>,
) -> anyhow::Result<DateTime<Utc>> {
    if let Some(raw) = cutoff_arg {
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| anyhow::anyhow!("invalid --cutoff {raw:?}: {e}"))?;
        return Ok(parsed.with_timezone(&Utc));
    }

    match postwatch_db::get_config_value(pool, ACTIVATION_CUTOFF_KEY).await? {
        Some(stored) => match DateTime::parse_from_rfc3339(&stored) {
            Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(stored, error = %e, "stored cutoff unreadable, using now");
                Ok(Utc::now())
            }
        },
        None => Ok(Utc::now()),
    }
}

fn print_outcome(outcome: &BatchOutcome) {
    let delivery = match outcome.delivery {
        DeliveryStatus::Skipped => "nothing to deliver",
        DeliveryStatus::Succeeded => "delivered",
        DeliveryStatus::Failed => "delivery FAILED, posts kept for `resend`",
    };
    println!(
        "session {}: {} candidates, {} new, {}",
        outcome.session_id, outcome.posts_found, outcome.posts_new, delivery
    );
}
