//! HTTP client for the webhook sink.
//!
//! Wraps `reqwest` with fixed timeouts and the envelope construction. The
//! base URL is injectable so tests can point at a mock server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Serialize;

use postwatch_db::PostRow;

use crate::error::WebhookError;
use crate::payload::{BatchData, PostPayload, WebhookEnvelope, BATCH_KIND, SOURCE_TAG, TEST_KIND};

/// Client for the webhook sink endpoint.
pub struct WebhookClient {
    client: Client,
    url: Url,
}

impl WebhookClient {
    /// Creates a client for the given sink URL.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidUrl`] if `webhook_url` does not parse,
    /// or [`WebhookError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(webhook_url: &str, timeout_secs: u64) -> Result<Self, WebhookError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postwatch/0.1 (community-post-sync)")
            .build()?;

        let url = Url::parse(webhook_url).map_err(|e| WebhookError::InvalidUrl {
            url: webhook_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, url })
    }

    /// Sends a batch of posts to the sink. Any 2xx response is success.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::Http`] on network failure.
    /// - [`WebhookError::UnexpectedStatus`] on any non-2xx response.
    pub async fn send_batch(
        &self,
        channel: &str,
        source_url: &str,
        posts: &[PostRow],
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let envelope = WebhookEnvelope {
            timestamp: now,
            source: SOURCE_TAG,
            kind: BATCH_KIND,
            data: BatchData {
                channel,
                posts_count: posts.len(),
                posts: posts.iter().map(PostPayload::from).collect(),
                scraped_at: now,
                source_url,
            },
        };

        self.post(&envelope).await?;
        tracing::info!(posts = posts.len(), "batch accepted by sink");
        Ok(())
    }

    /// Sends a connectivity test ping so a user can verify the configured
    /// URL before any real batch exists.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`WebhookClient::send_batch`].
    pub async fn send_test(&self, now: DateTime<Utc>) -> Result<(), WebhookError> {
        let envelope = WebhookEnvelope {
            timestamp: now,
            source: SOURCE_TAG,
            kind: TEST_KIND,
            data: BatchData {
                channel: "postwatch",
                posts_count: 0,
                posts: Vec::new(),
                scraped_at: now,
                source_url: "",
            },
        };

        self.post(&envelope).await?;
        tracing::info!("test ping accepted by sink");
        Ok(())
    }

    async fn post<T: Serialize>(&self, body: &T) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sample_post(id: &str) -> PostRow {
        let now = Utc::now();
        PostRow {
            id: id.to_string(),
            channel: "César Langreo".to_string(),
            author: "César Langreo".to_string(),
            content: "Nuevo directo".to_string(),
            published_time_text: "hace 1 hora".to_string(),
            published_at: now,
            likes: "8".to_string(),
            images: Json(vec!["https://example.com/a.jpg".to_string()]),
            extracted_at: now,
            source_url: "https://www.youtube.com/c/CésarLangreo/posts".to_string(),
            session_id: "session_1".to_string(),
            delivered_to_sink: false,
            delivered_at: None,
        }
    }

    #[test]
    fn rejects_unparseable_url() {
        let result = WebhookClient::new("not a url", 5);
        assert!(matches!(result, Err(WebhookError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn send_batch_posts_the_expected_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "source": "postwatch-scraper",
                "type": "community_posts",
                "data": {
                    "channel": "César Langreo",
                    "postsCount": 2,
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            WebhookClient::new(&format!("{}/hook", server.uri()), 5).expect("client");
        let posts = vec![sample_post("a"), sample_post("b")];
        client
            .send_batch(
                "César Langreo",
                "https://www.youtube.com/c/CésarLangreo/posts",
                &posts,
                Utc::now(),
            )
            .await
            .expect("send batch");
    }

    #[tokio::test]
    async fn non_success_status_is_a_delivery_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = WebhookClient::new(&server.uri(), 5).expect("client");
        let posts = vec![sample_post("a")];
        let result = client
            .send_batch("César Langreo", "https://example.com", &posts, Utc::now())
            .await;

        assert!(matches!(
            result,
            Err(WebhookError::UnexpectedStatus { status: 500 })
        ));
    }

    #[tokio::test]
    async fn send_test_marks_the_payload_as_a_test() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "source": "postwatch-scraper",
                "type": "test",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = WebhookClient::new(&server.uri(), 5).expect("client");
        client.send_test(Utc::now()).await.expect("send test");
    }

    #[tokio::test]
    async fn redirect_class_status_is_not_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let client = WebhookClient::new(&server.uri(), 5).expect("client");
        let result = client.send_test(Utc::now()).await;
        assert!(matches!(
            result,
            Err(WebhookError::UnexpectedStatus { status: 304 })
        ));
    }
}
