//! Delivery-side commands: replaying undelivered posts and pinging the sink.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;

use postwatch_core::AppConfig;
use postwatch_db::PostRow;
use postwatch_sync::LAST_DELIVERY_KEY;
use postwatch_webhook::WebhookClient;

/// Replays posts the sink never confirmed, oldest extraction first.
///
/// There is no automatic redelivery anywhere in the pipeline; this command is
/// the explicit retry path. Posts are grouped per channel so every request
/// matches the envelope the sink expects, and each group is marked delivered
/// independently — a failure in one group leaves the others' bookkeeping
/// intact.
///
/// # Errors
///
/// Returns an error if the webhook URL is unconfigured, a store operation
/// fails, or every group fails to deliver.
pub(crate) async fn run_resend(
    pool: &SqlitePool,
    config: &AppConfig,
    limit: i64,
) -> anyhow::Result<()> {
    let undelivered = postwatch_db::list_undelivered_posts(pool, limit).await?;
    if undelivered.is_empty() {
        println!("no undelivered posts");
        return Ok(());
    }

    let webhook_url = config
        .webhook_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("POSTWATCH_WEBHOOK_URL is not set; cannot resend"))?;
    let client = WebhookClient::new(webhook_url, config.webhook_timeout_secs)?;

    let mut by_channel: BTreeMap<String, Vec<PostRow>> = BTreeMap::new();
    for post in undelivered {
        by_channel.entry(post.channel.clone()).or_default().push(post);
    }

    let group_count = by_channel.len();
    let mut delivered: usize = 0;
    let mut failed_groups: usize = 0;

    for (channel, posts) in &by_channel {
        let source_url = posts[0].source_url.as_str();
        match client.send_batch(channel, source_url, posts, Utc::now()).await {
            Ok(()) => {
                let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
                postwatch_db::mark_posts_delivered(pool, &ids, Utc::now()).await?;
                delivered += ids.len();
            }
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "resend failed for channel");
                failed_groups += 1;
            }
        }
    }

    if delivered > 0 {
        postwatch_db::put_config_value(pool, LAST_DELIVERY_KEY, &Utc::now().to_rfc3339()).await?;
    }
    if failed_groups == group_count {
        anyhow::bail!("resend failed for all {group_count} channels");
    }

    if failed_groups == 0 {
        println!("resent {delivered} posts");
    } else {
        println!("resent {delivered} posts; {failed_groups} of {group_count} channels failed");
    }
    Ok(())
}

/// Sends a connectivity test ping so the configured URL can be verified
/// before any real batch exists.
///
/// # Errors
///
/// Returns an error if the webhook URL is unconfigured or the sink does not
/// answer with a success status.
pub(crate) async fn run_test_webhook(config: &AppConfig) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("POSTWATCH_WEBHOOK_URL is not set; nothing to test"))?;
    let client = WebhookClient::new(webhook_url, config.webhook_timeout_secs)?;

    client.send_test(Utc::now()).await?;
    println!("webhook accepted the test ping");
    Ok(())
}
