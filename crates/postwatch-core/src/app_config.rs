use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    /// Display name of the channel whose community posts are watched.
    pub channel: String,
    /// Page URL the candidate batches are scraped from (informational; the
    /// scraping collaborator reports the real URL per batch).
    pub source_url: String,
    /// Sink endpoint. `None` disables the delivery paths; reconciliation and
    /// stats still work without it.
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
    /// Posts older than this (by extraction date) are purged by `cleanup`.
    pub max_age_days: u32,
    /// Sessions kept by the retention sweep, newest first.
    pub session_keep: u32,
    /// `running` sessions older than this many hours are reaped as errored.
    pub session_stale_hours: u64,
    /// Scheduling interval recorded on sessions. Informational only; nothing
    /// in this workspace fires on a timer.
    pub interval_minutes: u32,
    /// Fixed offset of the "local" clock used for relative-time parsing.
    pub utc_offset_hours: i32,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("channel", &self.channel)
            .field("source_url", &self.source_url)
            .field("database_url", &"[redacted]")
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[redacted]"))
            .field("webhook_timeout_secs", &self.webhook_timeout_secs)
            .field("max_age_days", &self.max_age_days)
            .field("session_keep", &self.session_keep)
            .field("session_stale_hours", &self.session_stale_hours)
            .field("interval_minutes", &self.interval_minutes)
            .field("utc_offset_hours", &self.utc_offset_hours)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
