//! Environment-driven configuration

use anyhow::{Context, Result};
use uuid::Uuid;

/// Settings for the coordinator and the daemon binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace REST API.
    pub api_base_url: String,
    /// Websocket URL of the realtime event feed.
    pub realtime_url: String,
    /// Bearer token for authenticated calls, if the session has one.
    pub api_token: Option<String>,
    /// Account acting through this coordinator.
    pub user_id: Uuid,
    /// Conversation the daemon subscribes to.
    pub conversation_id: Option<Uuid>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var("MARKET_API_URL")
            .unwrap_or_else(|_| "http://localhost:3001/api".to_string());
        let realtime_url = std::env::var("MARKET_REALTIME_URL")
            .unwrap_or_else(|_| "ws://localhost:3001/ws".to_string());
        let api_token = std::env::var("MARKET_API_TOKEN").ok().filter(|t| !t.is_empty());

        let user_id = std::env::var("MARKET_USER_ID")
            .context("MARKET_USER_ID must be set")?
            .parse::<Uuid>()
            .context("MARKET_USER_ID must be a UUID")?;

        let conversation_id = match std::env::var("MARKET_CONVERSATION_ID") {
            Ok(raw) => Some(
                raw.parse::<Uuid>()
                    .context("MARKET_CONVERSATION_ID must be a UUID")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            api_base_url,
            realtime_url,
            api_token,
            user_id,
            conversation_id,
        })
    }
}
