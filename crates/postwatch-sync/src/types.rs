//! Input shape consumed from the scraping collaborator.
//!
//! ## Observed shape from the page scraper
//!
//! Batches arrive as JSON arrays of candidate posts in page order, camelCase
//! field names. `content` can legitimately be empty (image-only posts), and
//! `likes` is whatever text the vote counter showed (`"0"`, `"12"`,
//! `"1,2 K"`), so both default rather than fail. `images` is already
//! de-duplicated by the scraper — the engine does not touch it. `id` may be
//! absent when the scraper could not derive one; the engine then computes a
//! content fingerprint itself.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A scraped post not yet judged new or old.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePost {
    /// Stable content-derived fingerprint, when the scraper provides one.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name of the channel the post belongs to.
    pub channel: String,

    /// Post author as rendered on the page.
    pub author: String,

    /// Free post text; empty for image-only posts.
    #[serde(default)]
    pub content: String,

    /// Raw relative-time string as scraped (e.g. `"hace 2 días"`,
    /// `"3 hours ago"`). Parsed once during reconciliation.
    pub published_time: String,

    /// Vote-counter text, informational only.
    #[serde(default = "default_likes")]
    pub likes: String,

    /// Image URLs in page order.
    #[serde(default)]
    pub images: Vec<String>,

    /// Instant the scraper captured this candidate.
    pub extracted_at: DateTime<Utc>,

    /// Page URL the candidate was scraped from.
    pub source_url: String,
}

/// Default value for `CandidatePost::likes` when the field is absent.
fn default_likes() -> String {
    "0".to_string()
}
