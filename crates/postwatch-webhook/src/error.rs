use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid webhook URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("sink rejected the batch with HTTP status {status}")]
    UnexpectedStatus { status: u16 },
}
