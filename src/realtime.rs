//! Realtime transport for per-conversation confirmation events

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use crate::event_adapter::EventAdapter;
use crate::models::RealtimeEvent;

const SUPERVISOR_MAX_BACKOFF_SECONDS: u64 = 30;

/// Websocket listener feeding one conversation's events into the adapter.
pub struct RealtimeListener {
    url: String,
    conversation_id: Uuid,
    adapter: Arc<EventAdapter>,
}

impl RealtimeListener {
    pub fn new(url: String, conversation_id: Uuid, adapter: Arc<EventAdapter>) -> Self {
        Self {
            url,
            conversation_id,
            adapter,
        }
    }

    /// Connect, subscribe, and pump events until the connection drops.
    pub async fn run(&self) -> Result<()> {
        let (stream, _) = connect_async(&self.url)
            .await
            .with_context(|| format!("connecting realtime channel at {}", self.url))?;
        let (mut sink, mut source) = stream.split();

        let subscribe = json!({
            "action": "subscribe",
            "conversationId": self.conversation_id,
        });
        sink.send(Message::Text(subscribe.to_string()))
            .await
            .context("subscribing to conversation channel")?;

        self.adapter.mount(self.conversation_id).await;
        tracing::info!(conversation_id = %self.conversation_id, "realtime channel subscribed");

        while let Some(message) = source.next().await {
            match message.context("reading realtime channel")? {
                Message::Text(payload) => match serde_json::from_str::<RealtimeEvent>(&payload) {
                    Ok(event) => self.adapter.apply(event).await,
                    Err(error) => {
                        // Unknown frames (typing indicators, presence) share
                        // the channel; skip anything that isn't ours.
                        tracing::debug!(%error, "skipping non-confirmation frame");
                    }
                },
                Message::Ping(payload) => {
                    sink.send(Message::Pong(payload))
                        .await
                        .context("answering ping")?;
                }
                Message::Close(frame) => {
                    tracing::warn!(?frame, "realtime channel closed by server");
                    break;
                }
                _ => {}
            }
        }

        anyhow::bail!("realtime channel disconnected")
    }
}

/// Supervise the listener, reconnecting with capped exponential backoff.
/// At-least-once delivery makes a reconnect safe: replayed events are folded
/// idempotently by the adapter's supersession rule.
pub async fn run_supervised(listener: RealtimeListener) {
    let mut restart_count: u32 = 0;
    loop {
        match listener.run().await {
            Ok(()) => {
                tracing::info!("realtime listener exited cleanly; stopping supervisor");
                break;
            }
            Err(error) => {
                tracing::error!(error = %error, "realtime listener failed; restarting");
            }
        }

        restart_count = restart_count.saturating_add(1);
        let backoff_seconds =
            (2u64.saturating_pow(restart_count.min(5))).min(SUPERVISOR_MAX_BACKOFF_SECONDS);
        tracing::warn!(restart_count, backoff_seconds, "realtime listener restart backoff");
        tokio::time::sleep(Duration::from_secs(backoff_seconds)).await;
    }
}
