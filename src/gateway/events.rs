use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tracing::warn;

use crate::types::InboundMessage;

static PARSE_FAILURES: AtomicU64 = AtomicU64::new(0);

// Gateway opcodes.
const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// Raw deserializable shape covering all gateway frames. `d` stays a
/// Value because different opcodes carry different payloads.
#[derive(Debug, Deserialize)]
struct RawFrame {
    op: u8,
    #[serde(default)]
    d: serde_json::Value,
    s: Option<u64>,
    t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHello {
    heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct RawReady {
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    channel_id: String,
    #[serde(default)]
    content: String,
    author: RawUser,
    member: Option<RawMember>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

/// Parsed event from a single gateway frame.
#[derive(Debug)]
pub enum GatewayEvent {
    /// First frame after connecting; carries the heartbeat period.
    Hello { heartbeat_interval_ms: u64 },
    HeartbeatAck,
    /// Server asks for an immediate heartbeat.
    HeartbeatRequest,
    /// Server asks us to drop and reconnect.
    Reconnect,
    InvalidSession,
    /// Identify accepted; carries our own user id so we can ignore our
    /// own messages.
    Ready { user_id: String },
    MessageCreate(InboundMessage),
}

/// One parsed frame: the sequence number (when present) plus the event.
/// Unknown opcodes and dispatch types parse to `event: None` — they are
/// not errors, the sequence number still advances.
#[derive(Debug)]
pub struct Frame {
    pub seq: Option<u64>,
    pub event: Option<GatewayEvent>,
}

/// Parse a raw gateway text frame. Malformed JSON is counted and dropped,
/// never fatal — the connection keeps reading.
pub fn parse_frame(raw: &str) -> Frame {
    let frame: RawFrame = match serde_json::from_str(raw) {
        Ok(f) => f,
        Err(_) => {
            let count = PARSE_FAILURES.fetch_add(1, Ordering::Relaxed) + 1;
            if count <= 10 || count % 1000 == 0 {
                let sample = &raw[..200.min(raw.len())];
                warn!(count, "[GATEWAY PARSE] unrecognized frame: {sample}");
            }
            return Frame { seq: None, event: None };
        }
    };

    let seq = frame.s;
    let event = match frame.op {
        OP_HELLO => serde_json::from_value::<RawHello>(frame.d)
            .ok()
            .map(|h| GatewayEvent::Hello { heartbeat_interval_ms: h.heartbeat_interval }),
        OP_HEARTBEAT_ACK => Some(GatewayEvent::HeartbeatAck),
        OP_HEARTBEAT => Some(GatewayEvent::HeartbeatRequest),
        OP_RECONNECT => Some(GatewayEvent::Reconnect),
        OP_INVALID_SESSION => Some(GatewayEvent::InvalidSession),
        OP_DISPATCH => parse_dispatch(frame.t.as_deref(), frame.d),
        _ => None,
    };

    Frame { seq, event }
}

fn parse_dispatch(t: Option<&str>, d: serde_json::Value) -> Option<GatewayEvent> {
    match t {
        Some("READY") => serde_json::from_value::<RawReady>(d)
            .ok()
            .map(|r| GatewayEvent::Ready { user_id: r.user.id }),
        Some("MESSAGE_CREATE") => {
            let msg: RawMessage = serde_json::from_value(d).ok()?;
            Some(GatewayEvent::MessageCreate(InboundMessage {
                id: msg.id,
                channel_id: msg.channel_id,
                author_id: msg.author.id,
                author_is_bot: msg.author.bot,
                role_ids: msg.member.map(|m| m.roles).unwrap_or_default(),
                content: msg.content,
                attachment_urls: msg.attachments.into_iter().map(|a| a.url).collect(),
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello() {
        let raw = r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
        let frame = parse_frame(raw);
        assert!(frame.seq.is_none());
        match frame.event {
            Some(GatewayEvent::Hello { heartbeat_interval_ms }) => {
                assert_eq!(heartbeat_interval_ms, 41250);
            }
            other => panic!("expected Hello, got {other:?}"),
        }
    }

    #[test]
    fn parses_ready_with_own_user_id() {
        let raw = r#"{"op":0,"t":"READY","s":1,"d":{"user":{"id":"bot123","bot":true},"session_id":"abc"}}"#;
        let frame = parse_frame(raw);
        assert_eq!(frame.seq, Some(1));
        match frame.event {
            Some(GatewayEvent::Ready { user_id }) => assert_eq!(user_id, "bot123"),
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn parses_message_create() {
        let raw = r#"{"op":0,"t":"MESSAGE_CREATE","s":42,"d":{
            "id":"m1","channel_id":"c1","content":"!slate ELITE,...",
            "author":{"id":"u1"},
            "member":{"roles":["r1","r2"]},
            "attachments":[{"url":"https://cdn.example/slate.csv","filename":"slate.csv"}]
        }}"#;
        let frame = parse_frame(raw);
        assert_eq!(frame.seq, Some(42));
        match frame.event {
            Some(GatewayEvent::MessageCreate(msg)) => {
                assert_eq!(msg.id, "m1");
                assert_eq!(msg.channel_id, "c1");
                assert_eq!(msg.author_id, "u1");
                assert!(!msg.author_is_bot);
                assert_eq!(msg.role_ids, vec!["r1", "r2"]);
                assert_eq!(msg.attachment_urls, vec!["https://cdn.example/slate.csv"]);
            }
            other => panic!("expected MessageCreate, got {other:?}"),
        }
    }

    #[test]
    fn message_without_member_has_no_roles() {
        let raw = r#"{"op":0,"t":"MESSAGE_CREATE","s":2,"d":{
            "id":"m1","channel_id":"c1","content":"hi","author":{"id":"u1","bot":true}
        }}"#;
        let frame = parse_frame(raw);
        match frame.event {
            Some(GatewayEvent::MessageCreate(msg)) => {
                assert!(msg.author_is_bot);
                assert!(msg.role_ids.is_empty());
                assert!(msg.attachment_urls.is_empty());
            }
            other => panic!("expected MessageCreate, got {other:?}"),
        }
    }

    #[test]
    fn heartbeat_ack_and_request() {
        assert!(matches!(
            parse_frame(r#"{"op":11}"#).event,
            Some(GatewayEvent::HeartbeatAck)
        ));
        assert!(matches!(
            parse_frame(r#"{"op":1,"d":41}"#).event,
            Some(GatewayEvent::HeartbeatRequest)
        ));
    }

    #[test]
    fn unknown_dispatch_type_keeps_sequence() {
        let raw = r#"{"op":0,"t":"TYPING_START","s":7,"d":{}}"#;
        let frame = parse_frame(raw);
        assert_eq!(frame.seq, Some(7));
        assert!(frame.event.is_none());
    }

    #[test]
    fn unknown_op_returns_no_event() {
        let frame = parse_frame(r#"{"op":99,"d":{}}"#);
        assert!(frame.event.is_none());
    }

    #[test]
    fn garbage_returns_empty_frame() {
        let frame = parse_frame("not json at all");
        assert!(frame.seq.is_none());
        assert!(frame.event.is_none());
    }
}
