//! Outbound messaging platform client.
//!
//! Push messages go to the pre-configured recipient at any time; replies
//! consume the one-time token from the triggering event. Content downloads
//! fetch image bytes attached to a message.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::errors::RelayError;

const PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";
const REPLY_URL: &str = "https://api.line.me/v2/bot/message/reply";
const CONTENT_URL_BASE: &str = "https://api-data.line.me/v2/bot/message";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// The platform rejects text messages above this length.
const MAX_TEXT_LENGTH: usize = 5000;

/// Messaging platform client for delivery and content retrieval.
#[derive(Debug, Clone)]
pub struct MessagingClient {
    http: Client,
    access_token: String,
    recipient_id: String,
}

impl MessagingClient {
    pub fn new(access_token: String, recipient_id: String) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::HttpError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            access_token,
            recipient_id,
        })
    }

    /// Push a text message to the configured recipient.
    pub async fn push_text(&self, text: &str) -> Result<(), RelayError> {
        info!("Pushing message to configured recipient");
        let body = json!({
            "to": self.recipient_id,
            "messages": [{ "type": "text", "text": clamp_text(text) }]
        });
        self.deliver(PUSH_URL, body).await
    }

    /// Reply to a specific inbound event. The token is valid exactly once.
    pub async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), RelayError> {
        info!("Replying to inbound event");
        let body = json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": clamp_text(text) }]
        });
        self.deliver(REPLY_URL, body).await
    }

    async fn deliver(&self, url: &str, body: serde_json::Value) -> Result<(), RelayError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("Messaging API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(RelayError::MessagingError(format!(
                "Messaging API error (status {status}): {error_text}"
            )));
        }

        Ok(())
    }

    /// Download the binary content attached to a message (e.g. image bytes).
    ///
    /// Returns the bytes together with the reported MIME type.
    pub async fn message_content(&self, message_id: &str) -> Result<(Vec<u8>, String), RelayError> {
        let url = format!("{CONTENT_URL_BASE}/{message_id}/content");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| RelayError::HttpError(format!("Content download failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::MessagingError(format!(
                "Content download error (status {status}) for message {message_id}"
            )));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::HttpError(format!("Failed to read content body: {e}")))?;

        info!(
            "Downloaded {} bytes of {} content for message {}",
            bytes.len(),
            mime,
            message_id
        );

        Ok((bytes.to_vec(), mime))
    }
}

#[async_trait::async_trait]
impl crate::relay::Messenger for MessagingClient {
    async fn push_text(&self, text: &str) -> Result<(), RelayError> {
        MessagingClient::push_text(self, text).await
    }

    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), RelayError> {
        MessagingClient::reply_text(self, reply_token, text).await
    }

    async fn message_content(&self, message_id: &str) -> Result<(Vec<u8>, String), RelayError> {
        MessagingClient::message_content(self, message_id).await
    }
}

/// Truncate on a char boundary to fit the platform's message length cap.
fn clamp_text(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LENGTH {
        return text;
    }
    let mut end = MAX_TEXT_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
