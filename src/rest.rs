use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::MessageHandle;

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Chat REST client: send message, best-effort delete, attachment
/// download. The only I/O surface the publisher and command consumer use.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl RestClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Bot {}", cfg.bot_token),
        })
    }

    /// Post a message and return its handle for later retraction.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<MessageHandle> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Api { status: status.as_u16(), body });
        }

        let sent: SentMessage = resp.json().await?;
        Ok(MessageHandle {
            channel_id: channel_id.to_string(),
            message_id: sent.id,
        })
    }

    /// Best-effort delete. Failures are logged and reported as `false`,
    /// never propagated — a retraction that misses (message already gone,
    /// permission hiccup) must not abort publication.
    pub async fn delete_message(&self, handle: &MessageHandle) -> bool {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.base_url, handle.channel_id, handle.message_id
        );
        match self
            .http
            .delete(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!(
                    message_id = %handle.message_id,
                    status = resp.status().as_u16(),
                    "[REST] delete refused"
                );
                false
            }
            Err(e) => {
                warn!(message_id = %handle.message_id, "[REST] delete failed: {e}");
                false
            }
        }
    }

    /// Download an uploaded attachment body. Attachment URLs are
    /// pre-signed CDN links, so no auth header is attached.
    pub async fn download_attachment(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Api { status: status.as_u16(), body });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
