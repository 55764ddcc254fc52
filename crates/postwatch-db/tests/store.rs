//! Store-level integration tests against a real on-disk SQLite file.
//!
//! SQLite needs no external server, so unlike a networked database these
//! tests run in any environment. Each test opens its own temporary store.

use chrono::{Duration, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use postwatch_db::{DbError, NewSession, PoolConfig, PostRow};

async fn temp_store() -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite://{}/store.db", dir.path().display());
    let pool = postwatch_db::connect_pool(&url, PoolConfig::default())
        .await
        .expect("open store");
    postwatch_db::run_migrations(&pool).await.expect("migrate");
    (dir, pool)
}

fn sample_post(id: &str) -> PostRow {
    let now = Utc::now();
    PostRow {
        id: id.to_string(),
        channel: "César Langreo".to_string(),
        author: "César Langreo".to_string(),
        content: "Nuevo directo esta tarde".to_string(),
        published_time_text: "hace 1 hora".to_string(),
        published_at: now - Duration::hours(1),
        likes: "12".to_string(),
        images: Json(vec!["https://example.com/thumb.jpg".to_string()]),
        extracted_at: now,
        source_url: "https://www.youtube.com/c/CésarLangreo/posts".to_string(),
        session_id: "session_0_test".to_string(),
        delivered_to_sink: false,
        delivered_at: None,
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (_dir, pool) = temp_store().await;
    let applied_again = postwatch_db::run_migrations(&pool).await.expect("migrate");
    assert_eq!(applied_again, 0, "second run must apply nothing");
    postwatch_db::health_check(&pool).await.expect("healthy");
}

#[tokio::test]
async fn claim_post_wins_once_per_id() {
    let (_dir, pool) = temp_store().await;
    let post = sample_post("community_post_cesar_abc123");

    assert!(postwatch_db::claim_post(&pool, &post).await.expect("claim"));
    assert!(
        !postwatch_db::claim_post(&pool, &post).await.expect("claim"),
        "second claim of the same id must lose"
    );
    assert_eq!(postwatch_db::count_posts(&pool).await.expect("count"), 1);
}

#[tokio::test]
async fn get_post_roundtrips_all_fields() {
    let (_dir, pool) = temp_store().await;
    let post = sample_post("p1");
    postwatch_db::claim_post(&pool, &post).await.expect("claim");

    let stored = postwatch_db::get_post(&pool, "p1")
        .await
        .expect("get")
        .expect("post exists");
    assert_eq!(stored.channel, post.channel);
    assert_eq!(stored.content, post.content);
    assert_eq!(stored.published_time_text, "hace 1 hora");
    assert_eq!(stored.images.0, post.images.0);
    assert_eq!(stored.session_id, post.session_id);
    assert!(!stored.delivered_to_sink);
    assert!(stored.delivered_at.is_none());

    assert!(postwatch_db::get_post(&pool, "missing")
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn recent_posts_orders_by_extraction_date_newest_first() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();
    for (id, age_minutes) in [("old", 30), ("mid", 20), ("new", 10)] {
        let mut post = sample_post(id);
        post.extracted_at = now - Duration::minutes(age_minutes);
        postwatch_db::claim_post(&pool, &post).await.expect("claim");
    }

    let recent = postwatch_db::recent_posts(&pool, 2).await.expect("recent");
    let ids: Vec<&str> = recent.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid"]);
}

#[tokio::test]
async fn delete_posts_extracted_before_is_strict() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();

    let mut old = sample_post("old");
    old.extracted_at = now - Duration::days(40);
    let mut fresh = sample_post("fresh");
    fresh.extracted_at = now - Duration::days(5);
    postwatch_db::claim_post(&pool, &old).await.expect("claim");
    postwatch_db::claim_post(&pool, &fresh).await.expect("claim");

    let deleted = postwatch_db::delete_posts_extracted_before(&pool, now - Duration::days(30))
        .await
        .expect("delete");
    assert_eq!(deleted, 1);
    assert!(postwatch_db::get_post(&pool, "old").await.expect("get").is_none());
    assert!(postwatch_db::get_post(&pool, "fresh").await.expect("get").is_some());
}

#[tokio::test]
async fn mark_posts_delivered_only_touches_listed_ids() {
    let (_dir, pool) = temp_store().await;
    for id in ["a", "b", "c"] {
        postwatch_db::claim_post(&pool, &sample_post(id)).await.expect("claim");
    }

    let delivered_at = Utc::now();
    let updated = postwatch_db::mark_posts_delivered(
        &pool,
        &["a".to_string(), "b".to_string(), "ghost".to_string()],
        delivered_at,
    )
    .await
    .expect("mark");
    assert_eq!(updated, 2, "missing ids are skipped");

    let a = postwatch_db::get_post(&pool, "a").await.expect("get").expect("a");
    assert!(a.delivered_to_sink);
    assert!(a.delivered_at.is_some());

    let c = postwatch_db::get_post(&pool, "c").await.expect("get").expect("c");
    assert!(!c.delivered_to_sink);
    assert!(c.delivered_at.is_none());

    let undelivered = postwatch_db::list_undelivered_posts(&pool, 10)
        .await
        .expect("list");
    assert_eq!(undelivered.len(), 1);
    assert_eq!(undelivered[0].id, "c");
}

#[tokio::test]
async fn upsert_posts_overwrites_existing_rows() {
    let (_dir, pool) = temp_store().await;
    let mut post = sample_post("p1");
    postwatch_db::claim_post(&pool, &post).await.expect("claim");

    post.likes = "99".to_string();
    post.delivered_to_sink = true;
    post.delivered_at = Some(Utc::now());
    postwatch_db::upsert_posts(&pool, std::slice::from_ref(&post))
        .await
        .expect("upsert");

    let stored = postwatch_db::get_post(&pool, "p1").await.expect("get").expect("p1");
    assert_eq!(stored.likes, "99");
    assert!(stored.delivered_to_sink);
    assert_eq!(postwatch_db::count_posts(&pool).await.expect("count"), 1);
}

#[tokio::test]
async fn session_lifecycle_happy_path() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();
    let session = NewSession {
        session_id: "session_1_aaaa",
        run_type: "manual",
        created_at: now,
        activation_cutoff: now - Duration::hours(2),
        interval_minutes: 60,
    };
    postwatch_db::create_session(&pool, &session).await.expect("create");

    postwatch_db::record_session_counts(&pool, "session_1_aaaa", Some(7), None)
        .await
        .expect("counts");
    postwatch_db::record_session_counts(&pool, "session_1_aaaa", None, Some(3))
        .await
        .expect("counts");
    postwatch_db::complete_session(&pool, "session_1_aaaa", 1234)
        .await
        .expect("complete");

    let stored = postwatch_db::get_session(&pool, "session_1_aaaa")
        .await
        .expect("get")
        .expect("session exists");
    assert_eq!(stored.posts_found, 7, "merge update must not clobber");
    assert_eq!(stored.posts_new, 3);
    assert_eq!(stored.status, "completed");
    assert_eq!(stored.duration_ms, 1234);
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn terminal_sessions_cannot_transition_again() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();
    let session = NewSession {
        session_id: "s1",
        run_type: "scheduled",
        created_at: now,
        activation_cutoff: now,
        interval_minutes: 5,
    };
    postwatch_db::create_session(&pool, &session).await.expect("create");
    postwatch_db::fail_session(&pool, "s1", "boom", 10).await.expect("fail");

    let result = postwatch_db::complete_session(&pool, "s1", 20).await;
    assert!(matches!(
        result,
        Err(DbError::InvalidSessionTransition { ref session_id, .. }) if session_id == "s1"
    ));

    let stored = postwatch_db::get_session(&pool, "s1").await.expect("get").expect("s1");
    assert_eq!(stored.status, "error");
    assert_eq!(stored.error_message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn prune_sessions_keeps_newest() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();
    for i in 0..5 {
        let id = format!("session_{i}");
        let session = NewSession {
            session_id: &id,
            run_type: "scheduled",
            created_at: now - Duration::minutes(10 - i),
            activation_cutoff: now,
            interval_minutes: 60,
        };
        postwatch_db::create_session(&pool, &session).await.expect("create");
    }

    let pruned = postwatch_db::prune_sessions(&pool, 2).await.expect("prune");
    assert_eq!(pruned, 3);

    let remaining = postwatch_db::recent_sessions(&pool, 10).await.expect("recent");
    let ids: Vec<&str> = remaining.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["session_4", "session_3"]);
}

#[tokio::test]
async fn reap_stale_sessions_fails_only_old_running_rows() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();

    let stale = NewSession {
        session_id: "stale",
        run_type: "scheduled",
        created_at: now - Duration::hours(48),
        activation_cutoff: now,
        interval_minutes: 60,
    };
    let live = NewSession {
        session_id: "live",
        run_type: "manual",
        created_at: now,
        activation_cutoff: now,
        interval_minutes: 60,
    };
    let done = NewSession {
        session_id: "done",
        run_type: "manual",
        created_at: now - Duration::hours(48),
        activation_cutoff: now,
        interval_minutes: 60,
    };
    for s in [&stale, &live, &done] {
        postwatch_db::create_session(&pool, s).await.expect("create");
    }
    postwatch_db::complete_session(&pool, "done", 5).await.expect("complete");

    let reaped = postwatch_db::reap_stale_sessions(&pool, now - Duration::hours(24))
        .await
        .expect("reap");
    assert_eq!(reaped, 1);

    let stale_row = postwatch_db::get_session(&pool, "stale").await.expect("get").expect("stale");
    assert_eq!(stale_row.status, "error");
    let live_row = postwatch_db::get_session(&pool, "live").await.expect("get").expect("live");
    assert_eq!(live_row.status, "running");
    let done_row = postwatch_db::get_session(&pool, "done").await.expect("get").expect("done");
    assert_eq!(done_row.status, "completed");
}

#[tokio::test]
async fn config_values_roundtrip_and_overwrite() {
    let (_dir, pool) = temp_store().await;

    assert!(postwatch_db::get_config_value(&pool, "last_cleanup")
        .await
        .expect("get")
        .is_none());

    postwatch_db::put_config_value(&pool, "last_cleanup", "2026-08-01T00:00:00+00:00")
        .await
        .expect("put");
    postwatch_db::put_config_value(&pool, "last_cleanup", "2026-08-07T00:00:00+00:00")
        .await
        .expect("put");

    let value = postwatch_db::get_config_value(&pool, "last_cleanup")
        .await
        .expect("get");
    assert_eq!(value.as_deref(), Some("2026-08-07T00:00:00+00:00"));
}

#[tokio::test]
async fn clear_all_data_empties_every_collection() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();

    postwatch_db::claim_post(&pool, &sample_post("p1")).await.expect("claim");
    let session = NewSession {
        session_id: "s1",
        run_type: "test",
        created_at: now,
        activation_cutoff: now,
        interval_minutes: 60,
    };
    postwatch_db::create_session(&pool, &session).await.expect("create");
    postwatch_db::put_config_value(&pool, "k", "v").await.expect("put");

    let removed = postwatch_db::clear_all_data(&pool).await.expect("clear");
    assert_eq!(removed, 3);
    assert_eq!(postwatch_db::count_posts(&pool).await.expect("count"), 0);
    assert_eq!(postwatch_db::count_sessions(&pool).await.expect("count"), 0);
}

#[tokio::test]
async fn export_contains_all_collections() {
    let (_dir, pool) = temp_store().await;
    let now = Utc::now();

    postwatch_db::claim_post(&pool, &sample_post("p1")).await.expect("claim");
    let session = NewSession {
        session_id: "s1",
        run_type: "manual",
        created_at: now,
        activation_cutoff: now,
        interval_minutes: 60,
    };
    postwatch_db::create_session(&pool, &session).await.expect("create");
    postwatch_db::put_config_value(&pool, "k", "v").await.expect("put");

    let export = postwatch_db::export_data(&pool, now).await.expect("export");
    assert_eq!(export.posts.len(), 1);
    assert_eq!(export.sessions.len(), 1);
    assert_eq!(export.config.len(), 1);

    let json = serde_json::to_string(&export).expect("serialize");
    assert!(json.contains("\"p1\""));
    assert!(json.contains("\"s1\""));
}
