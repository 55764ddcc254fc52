//! Outbound delivery to the webhook sink.
//!
//! One JSON POST per batch; any 2xx response counts as delivered, everything
//! else is a failure the caller reports. No retries live here — undelivered
//! posts stay flagged in the store and are replayed by an explicit resend.

pub mod client;
pub mod error;
pub mod payload;

pub use client::WebhookClient;
pub use error::WebhookError;
pub use payload::{BatchData, PostPayload, WebhookEnvelope, BATCH_KIND, SOURCE_TAG, TEST_KIND};
