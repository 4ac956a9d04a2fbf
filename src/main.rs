mod config;
mod engine;
mod error;
mod gateway;
mod publisher;
mod rest;
mod types;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, CHANNEL_CAPACITY};
use crate::engine::RowFormat;
use crate::error::Result;
use crate::gateway::GatewayManager;
use crate::publisher::SessionPublisher;
use crate::rest::RestClient;
use crate::types::{InboundMessage, MessageHandle};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let rest = Arc::new(RestClient::new(&cfg)?);
    let publisher = Arc::new(SessionPublisher::new(Arc::clone(&rest)));

    // --- Channels ---
    let (msg_tx, msg_rx) = mpsc::channel::<InboundMessage>(CHANNEL_CAPACITY);

    // --- Gateway connection ---
    let gateway = GatewayManager::new(&cfg, msg_tx);
    tokio::spawn(async move { gateway.run().await });

    info!(
        prefix = %cfg.command_prefix,
        channels = cfg.allowed_channels.len(),
        roles = cfg.allowed_roles.len(),
        "[SLATE] command consumer ready"
    );

    // Slate command consumer: one command at a time, so publication for a
    // channel is never interleaved.
    slate_consumer(cfg, rest, publisher, msg_rx).await;
    Ok(())
}

/// Consumes inbound messages: prefix filter, authorization gate, then the
/// core pipeline and publication.
async fn slate_consumer(
    cfg: Config,
    rest: Arc<RestClient>,
    publisher: Arc<SessionPublisher>,
    mut rx: mpsc::Receiver<InboundMessage>,
) {
    while let Some(msg) = rx.recv().await {
        if !msg.content.trim_start().starts_with(&cfg.command_prefix) {
            continue;
        }
        if !cfg.permits(&msg.channel_id, &msg.role_ids) {
            info!(
                channel_id = %msg.channel_id,
                author_id = %msg.author_id,
                "[SLATE] unauthorized command ignored"
            );
            continue;
        }
        handle_slate_command(&cfg, &rest, &publisher, msg).await;
    }
}

async fn handle_slate_command(
    cfg: &Config,
    rest: &RestClient,
    publisher: &SessionPublisher,
    msg: InboundMessage,
) {
    // Retract the triggering command message so the raw slate text never
    // lingers in the channel. Best-effort.
    rest.delete_message(&MessageHandle {
        channel_id: msg.channel_id.clone(),
        message_id: msg.id.clone(),
    })
    .await;

    let (text, format) = match resolve_input(rest, &cfg.command_prefix, &msg).await {
        Ok(input) => input,
        Err(e) => {
            // Batch-level unreadability is the only failure a user sees;
            // malformed rows are silently absent from the digest instead.
            error!(channel_id = %msg.channel_id, "[SLATE] unreadable input: {e}");
            if let Err(e) = rest
                .send_message(&msg.channel_id, "Could not read the uploaded slate.")
                .await
            {
                error!(channel_id = %msg.channel_id, "[SLATE] failure notice not sent: {e}");
            }
            return;
        }
    };

    let digest = engine::parse_and_classify(&text, format);
    info!(
        channel_id = %msg.channel_id,
        four_plus = digest.four_plus_lines.len(),
        totals = digest.totals_lines.len(),
        "[SLATE] batch processed"
    );

    if let Err(e) = publisher.publish(&msg.channel_id, &digest).await {
        error!(channel_id = %msg.channel_id, "[SLATE] publish failed: {e}");
    }
}

/// Resolve the slate body for a command. An uploaded file wins over
/// inline text and is parsed with header-mapped columns; inline text
/// after the prefix uses the positional layout.
async fn resolve_input(
    rest: &RestClient,
    prefix: &str,
    msg: &InboundMessage,
) -> Result<(String, RowFormat)> {
    if let Some(url) = msg.attachment_urls.first() {
        let bytes = rest.download_attachment(url).await?;
        let text = engine::decode_input(&bytes)?;
        return Ok((text, RowFormat::StructuredRow));
    }

    let inline = msg
        .content
        .trim_start()
        .strip_prefix(prefix)
        .unwrap_or_default()
        .trim()
        .to_string();
    Ok((inline, RowFormat::DelimitedLine))
}
