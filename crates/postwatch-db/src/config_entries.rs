//! Database operations for the `config_entries` key/value table.
//!
//! Small settings records shared across runs — last-cleanup timestamp,
//! activation cutoff, last successful delivery. Values are opaque strings;
//! callers own the encoding (RFC 3339 for instants).

use sqlx::SqlitePool;

use crate::DbError;

/// Returns the value stored under `key`, or `None` if the key is absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_config_value(pool: &SqlitePool, key: &str) -> Result<Option<String>, DbError> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM config_entries WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

/// Stores `value` under `key`, replacing any existing value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn put_config_value(pool: &SqlitePool, key: &str, value: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO config_entries (key, value) VALUES (?, ?) \
         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}
