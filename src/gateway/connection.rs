use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::{Config, GATEWAY_INTENTS, HEARTBEAT_FALLBACK_SECS, RECONNECT_BACKOFF_MS};
use crate::error::Result;
use crate::gateway::events::{parse_frame, GatewayEvent};
use crate::types::InboundMessage;

/// Manages the single persistent WebSocket connection to the chat
/// gateway: identify, heartbeat, dispatch routing, reconnect with
/// bounded backoff. Inbound messages from other users are routed to the
/// command consumer; everything else is handled here.
pub struct GatewayManager {
    gateway_url: String,
    bot_token: String,
    msg_tx: mpsc::Sender<InboundMessage>,
    /// Our own user id, learned from the READY dispatch. Messages from
    /// this id (or any bot) are never routed.
    own_user_id: Option<String>,
    last_seq: Option<u64>,
}

impl GatewayManager {
    pub fn new(cfg: &Config, msg_tx: mpsc::Sender<InboundMessage>) -> Self {
        Self {
            gateway_url: cfg.gateway_url.clone(),
            bot_token: cfg.bot_token.clone(),
            msg_tx,
            own_user_id: None,
            last_seq: None,
        }
    }

    pub async fn run(mut self) {
        let mut backoff_idx = 0usize;

        loop {
            info!("[GATEWAY] connecting to {}", self.gateway_url);
            match self.connect_once().await {
                Ok(()) => {
                    info!("[GATEWAY] connection closed cleanly");
                    backoff_idx = 0;
                }
                Err(e) => {
                    error!("[GATEWAY] connection error: {e}");
                }
            }

            let delay_ms = RECONNECT_BACKOFF_MS
                .get(backoff_idx)
                .copied()
                .unwrap_or(*RECONNECT_BACKOFF_MS.last().unwrap());
            backoff_idx = (backoff_idx + 1).min(RECONNECT_BACKOFF_MS.len() - 1);

            warn!("[GATEWAY] reconnecting in {delay_ms}ms");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    async fn connect_once(&mut self) -> Result<()> {
        let (ws_stream, _) = connect_async(&self.gateway_url).await?;
        let (mut write, mut read) = ws_stream.split();

        // The connection re-identifies after every reconnect; there is no
        // session resume, so the sequence counter restarts too.
        self.last_seq = None;

        let mut heartbeat_secs = HEARTBEAT_FALLBACK_SECS;
        let mut heartbeat = interval(Duration::from_secs(heartbeat_secs));
        heartbeat.tick().await; // consume immediate first tick
        let mut identified = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let frame = parse_frame(&text);
                            if let Some(seq) = frame.seq {
                                self.last_seq = Some(seq);
                            }
                            let Some(event) = frame.event else { continue };
                            match event {
                                GatewayEvent::Hello { heartbeat_interval_ms } => {
                                    heartbeat_secs = (heartbeat_interval_ms / 1000).max(1);
                                    heartbeat = interval(Duration::from_secs(heartbeat_secs));
                                    heartbeat.tick().await;
                                    if !identified {
                                        write.send(Message::Text(self.build_identify().into())).await?;
                                        identified = true;
                                        debug!("[GATEWAY] identify sent, heartbeat every {heartbeat_secs}s");
                                    }
                                }
                                GatewayEvent::Ready { user_id } => {
                                    info!("[GATEWAY] ready as user {user_id}");
                                    self.own_user_id = Some(user_id);
                                }
                                GatewayEvent::HeartbeatAck => {
                                    debug!("[GATEWAY] heartbeat ack");
                                }
                                GatewayEvent::HeartbeatRequest => {
                                    write.send(Message::Text(self.build_heartbeat().into())).await?;
                                }
                                GatewayEvent::Reconnect | GatewayEvent::InvalidSession => {
                                    warn!("[GATEWAY] server requested reconnect");
                                    return Ok(());
                                }
                                GatewayEvent::MessageCreate(inbound) => {
                                    self.route_message(inbound);
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Ok(());
                        }
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(_)) => {}
                    }
                }

                _ = heartbeat.tick() => {
                    debug!(seq = ?self.last_seq, "[GATEWAY] heartbeat");
                    write.send(Message::Text(self.build_heartbeat().into())).await?;
                }
            }
        }
    }

    /// Drop our own and other bots' messages; everything else goes to the
    /// command consumer. Authorization (channel/role allow-lists) happens
    /// there, before the core pipeline is invoked.
    fn route_message(&self, inbound: InboundMessage) {
        if inbound.author_is_bot {
            return;
        }
        if self.own_user_id.as_deref() == Some(inbound.author_id.as_str()) {
            return;
        }
        if let Err(e) = self.msg_tx.try_send(inbound) {
            warn!("message channel full, dropping inbound message: {e}");
        }
    }

    fn build_identify(&self) -> String {
        serde_json::json!({
            "op": 2,
            "d": {
                "token": self.bot_token,
                "intents": GATEWAY_INTENTS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "slatebot",
                    "device": "slatebot"
                }
            }
        })
        .to_string()
    }

    fn build_heartbeat(&self) -> String {
        serde_json::json!({ "op": 1, "d": self.last_seq }).to_string()
    }
}
