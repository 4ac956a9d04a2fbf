use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::Result;
use crate::rest::RestClient;
use crate::types::{Digest, MessageHandle};

pub const FOUR_PLUS_HEADER: &str = "# 🔥 4+ PLAYS 🔥";
pub const TOTALS_HEADER: &str = "# 🔥 TOTALS 🔥";
pub const NO_PLAYS_TEXT: &str = "No valid plays found.";

/// Owns the retract-then-publish sequencing and the identities of
/// previously published digest messages, per channel. The core pipeline
/// stays stateless; it hands over a fresh Digest and this publisher does
/// the rest.
pub struct SessionPublisher {
    rest: Arc<RestClient>,
    /// channel_id → handles of the currently published digest.
    published: DashMap<String, Vec<MessageHandle>>,
}

impl SessionPublisher {
    pub fn new(rest: Arc<RestClient>) -> Self {
        Self {
            rest,
            published: DashMap::new(),
        }
    }

    /// Replace the channel's digest: retract the previous messages
    /// (best-effort), then publish the new lists. An empty digest still
    /// publishes — as the "no plays" placeholder — so stale output never
    /// survives a newer input.
    pub async fn publish(&self, channel_id: &str, digest: &Digest) -> Result<()> {
        self.retract(channel_id).await;

        let mut handles = Vec::new();
        let result = self.send_digest(channel_id, digest, &mut handles).await;
        // Keep whatever was sent even if a later send failed, so the next
        // publish can retract the partial output.
        if !handles.is_empty() {
            self.published.insert(channel_id.to_string(), handles);
        }
        result?;

        info!(
            channel_id,
            four_plus = digest.four_plus_lines.len(),
            totals = digest.totals_lines.len(),
            "[PUBLISH] digest replaced"
        );
        Ok(())
    }

    async fn send_digest(
        &self,
        channel_id: &str,
        digest: &Digest,
        handles: &mut Vec<MessageHandle>,
    ) -> Result<()> {
        if !digest.four_plus_lines.is_empty() {
            handles.push(self.rest.send_message(channel_id, FOUR_PLUS_HEADER).await?);
            let body = digest.four_plus_lines.join("\n\n");
            handles.push(self.rest.send_message(channel_id, &body).await?);
        }

        if !digest.totals_lines.is_empty() {
            handles.push(self.rest.send_message(channel_id, TOTALS_HEADER).await?);
            let body = digest.totals_lines.join("\n\n");
            handles.push(self.rest.send_message(channel_id, &body).await?);
        }

        if handles.is_empty() {
            handles.push(self.rest.send_message(channel_id, NO_PLAYS_TEXT).await?);
        }

        Ok(())
    }

    async fn retract(&self, channel_id: &str) {
        let Some((_, old)) = self.published.remove(channel_id) else {
            return;
        };
        let total = old.len();
        let mut deleted = 0usize;
        for handle in &old {
            if self.rest.delete_message(handle).await {
                deleted += 1;
            }
        }
        debug!(channel_id, deleted, total, "[PUBLISH] previous digest retracted");
    }
}
