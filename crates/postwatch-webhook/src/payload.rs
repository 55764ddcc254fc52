//! Wire shapes for the sink request body.
//!
//! The sink is an automation workflow keyed on `source` and `type`, so both
//! tags are fixed strings and the field names stay camelCase. The post
//! objects mirror the stored rows minus the delivery bookkeeping — the sink
//! has no use for `deliveredToSink`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use postwatch_db::PostRow;

/// `source` tag on every request.
pub const SOURCE_TAG: &str = "postwatch-scraper";

/// `type` tag for a community-post batch.
pub const BATCH_KIND: &str = "community_posts";

/// `type` tag for a connectivity test.
pub const TEST_KIND: &str = "test";

/// Top-level request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope<'a> {
    pub timestamp: DateTime<Utc>,
    pub source: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: BatchData<'a>,
}

/// One delivered batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchData<'a> {
    pub channel: &'a str,
    pub posts_count: usize,
    pub posts: Vec<PostPayload<'a>>,
    pub scraped_at: DateTime<Utc>,
    pub source_url: &'a str,
}

/// A single post as the sink sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload<'a> {
    pub id: &'a str,
    pub channel: &'a str,
    pub author: &'a str,
    pub content: &'a str,
    pub published_time: &'a str,
    pub published_at: DateTime<Utc>,
    pub likes: &'a str,
    pub images: &'a [String],
    pub extracted_at: DateTime<Utc>,
    pub source_url: &'a str,
}

impl<'a> From<&'a PostRow> for PostPayload<'a> {
    fn from(row: &'a PostRow) -> Self {
        Self {
            id: &row.id,
            channel: &row.channel,
            author: &row.author,
            content: &row.content,
            published_time: &row.published_time_text,
            published_at: row.published_at,
            likes: &row.likes,
            images: &row.images.0,
            extracted_at: row.extracted_at,
            source_url: &row.source_url,
        }
    }
}
