//! Headless coordinator daemon
//!
//! Subscribes to one conversation's realtime feed and logs every projected
//! state transition for the configured user. Useful for watching a
//! transaction converge from the command line while the web client is open.

use anyhow::{Context, Result};
use tracing::{info, warn};

use evmarket_coordinator::config::Config;
use evmarket_coordinator::contract_cache::CacheChange;
use evmarket_coordinator::contract_client::ContractClient;
use evmarket_coordinator::coordinator::Coordinator;
use evmarket_coordinator::realtime::{run_supervised, RealtimeListener};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let conversation_id = config
        .conversation_id
        .context("MARKET_CONVERSATION_ID must be set for the daemon")?;

    let client = ContractClient::new(config.api_base_url.clone(), config.api_token.clone());
    let coordinator = Coordinator::new(client, config.user_id);

    info!(
        user_id = %config.user_id,
        %conversation_id,
        api = %config.api_base_url,
        "coordinator daemon starting"
    );

    let listener = RealtimeListener::new(
        config.realtime_url.clone(),
        conversation_id,
        coordinator.adapter(),
    );
    tokio::spawn(run_supervised(listener));

    let mut cache_changes = coordinator.cache().subscribe();
    let mut card_changes = coordinator.adapter().subscribe_cards();

    loop {
        tokio::select! {
            change = cache_changes.recv() => match change {
                Ok(CacheChange::Updated(id)) | Ok(CacheChange::Invalidated(id)) => {
                    match coordinator.contract_view(id).await {
                        Ok((contract, view)) => info!(
                            contract_id = %id,
                            status = %contract.status.as_str(),
                            role = ?view.role,
                            can_confirm_buyer = view.can_confirm_buyer,
                            can_confirm_seller = view.can_confirm_seller,
                            awaiting_settlement = view.awaiting_settlement,
                            "contract state"
                        ),
                        Err(error) => warn!(contract_id = %id, %error, "contract view unavailable"),
                    }
                }
                Err(error) => {
                    warn!(%error, "cache change stream lagged");
                }
            },
            change = card_changes.recv() => match change {
                Ok(conversation) => {
                    if let Some(card) = coordinator.adapter().card(conversation).await {
                        info!(
                            %conversation,
                            contract_id = %card.contract_id,
                            is_final = card.is_final,
                            "confirmation card"
                        );
                    }
                }
                Err(error) => {
                    warn!(%error, "card change stream lagged");
                }
            },
        }
    }
}
