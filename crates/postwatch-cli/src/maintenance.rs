//! Observability and maintenance commands: cutoff reset, stats, session
//! listing, retention sweeps, wipe, export.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use postwatch_core::AppConfig;
use postwatch_db::SessionRow;
use postwatch_sync::{cleanup, collect_stats, sweep_sessions, ACTIVATION_CUTOFF_KEY};

/// Resets the activation cutoff, defaulting to now.
///
/// Posts published before the cutoff are never classified as new, so running
/// this whenever watching is (re)enabled keeps historical posts out of the
/// store even though they were never seen before.
///
/// # Errors
///
/// Returns an error if `--at` is malformed or the config write fails.
pub(crate) async fn run_activate(pool: &SqlitePool, at: Option<&str>) -> anyhow::Result<()> {
    let cutoff = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| anyhow::anyhow!("invalid --at {raw:?}: {e}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    postwatch_db::put_config_value(pool, ACTIVATION_CUTOFF_KEY, &cutoff.to_rfc3339()).await?;
    println!("activation cutoff set to {cutoff}");
    Ok(())
}

/// Prints store totals, the most recent posts, and the most recent sessions.
///
/// # Errors
///
/// Returns an error if any store query fails.
pub(crate) async fn run_stats(pool: &SqlitePool) -> anyhow::Result<()> {
    let stats = collect_stats(pool).await?;

    println!("posts:        {}", stats.total_posts);
    println!("sessions:     {}", stats.total_sessions);
    match stats.last_cleanup {
        Some(at) => println!("last cleanup: {at}"),
        None => println!("last cleanup: never"),
    }

    if !stats.recent_posts.is_empty() {
        println!();
        println!(
            "{:<46}{:<16}{:<18}DELIVERED",
            "POST", "PUBLISHED", "EXTRACTED"
        );
        for post in &stats.recent_posts {
            let delivered = if post.delivered_to_sink { "yes" } else { "no" };
            println!(
                "{:<46}{:<16}{:<18}{}",
                truncate(&post.id, 44),
                truncate(&post.published_time_text, 14),
                post.extracted_at.format("%Y-%m-%d %H:%M"),
                delivered
            );
        }
    }

    if !stats.recent_sessions.is_empty() {
        println!();
        print_session_table(&stats.recent_sessions);
    }

    Ok(())
}

/// Lists recent sessions, newest first.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub(crate) async fn run_sessions(pool: &SqlitePool, limit: i64) -> anyhow::Result<()> {
    let sessions = postwatch_db::recent_sessions(pool, limit).await?;
    if sessions.is_empty() {
        println!("no sessions recorded; run `ingest` first");
        return Ok(());
    }

    print_session_table(&sessions);
    // Error messages rarely fit a column; list them under the table.
    for session in &sessions {
        if let Some(message) = &session.error_message {
            println!("  {} error: {message}", session.session_id);
        }
    }
    Ok(())
}

/// Purges old posts and sweeps the session history.
///
/// # Errors
///
/// Returns an error if either sweep fails.
pub(crate) async fn run_cleanup(
    pool: &SqlitePool,
    config: &AppConfig,
    max_age_days: Option<u32>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let max_age_days = max_age_days.unwrap_or(config.max_age_days);

    let deleted = cleanup(pool, max_age_days, now).await?;
    let sweep = sweep_sessions(pool, config.session_keep, config.session_stale_hours, now).await?;

    println!(
        "deleted {deleted} posts older than {max_age_days} days; reaped {} stuck sessions, pruned {}",
        sweep.reaped, sweep.pruned
    );
    Ok(())
}

/// Deletes every row from every collection. Debugging only.
///
/// # Errors
///
/// Returns an error without `--yes`, or if a delete fails.
pub(crate) async fn run_wipe(pool: &SqlitePool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("wipe deletes ALL stored data; pass --yes to confirm");
    }

    let removed = postwatch_db::clear_all_data(pool).await?;
    println!("removed {removed} rows");
    Ok(())
}

/// Dumps the full store as pretty-printed JSON to stdout.
///
/// # Errors
///
/// Returns an error if a store query or the serialization fails.
pub(crate) async fn run_export(pool: &SqlitePool) -> anyhow::Result<()> {
    let export = postwatch_db::export_data(pool, Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

fn print_session_table(sessions: &[SessionRow]) {
    println!(
        "{:<36}{:<11}{:<11}{:>6}{:>5}  {:<18}DURATION",
        "SESSION", "TYPE", "STATUS", "FOUND", "NEW", "CREATED"
    );
    for session in sessions {
        println!(
            "{:<36}{:<11}{:<11}{:>6}{:>5}  {:<18}{}ms",
            truncate(&session.session_id, 34),
            session.run_type,
            session.status,
            session.posts_found,
            session.posts_new,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.duration_ms
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}
