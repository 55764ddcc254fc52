//! The incremental-sync engine: decides which scraped posts are new relative
//! to the persisted history, tracks scrape sessions, and bounds storage
//! growth.
//!
//! The scraping collaborator hands over batches of [`CandidatePost`]s; the
//! engine reconciles them against the store (claiming each genuinely new post
//! atomically), hands the survivors to a caller-supplied delivery step, and
//! records the whole run as a session. Nothing here schedules anything —
//! every entry point is a single invocation.

pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod reconcile;
pub mod retention;
pub mod stats;
pub mod timeparse;
pub mod tracker;
pub mod types;

pub use error::SyncError;
pub use fingerprint::post_fingerprint;
pub use pipeline::{
    run_batch, BatchOptions, BatchOutcome, DeliveryStatus, ACTIVATION_CUTOFF_KEY,
    LAST_DELIVERY_KEY,
};
pub use reconcile::reconcile_candidates;
pub use retention::{
    cleanup, sweep_sessions, SessionSweep, DEFAULT_MAX_AGE_DAYS, DEFAULT_SESSION_KEEP,
    LAST_CLEANUP_KEY,
};
pub use stats::{collect_stats, StatsSummary};
pub use timeparse::{local_now, parse_relative_time};
pub use tracker::RunType;
pub use types::CandidatePost;
