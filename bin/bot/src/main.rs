use rootcause::prelude::Report;
use std::sync::Arc;
use std::time::Duration;
use switchboard_bot::bot_api::BotApi;
use switchboard_bot::config::BotConfig;
use switchboard_bot::error::BotError;
use switchboard_bot::menu::MainMenu;
use switchboard_dialog::SessionRegistry;
use switchboard_telegram::{Adapter, Dispatcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pause after a failed poll before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Report<BotError>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,switchboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env().map_err(|e| BotError::Config {
        details: e.to_string(),
    })?;
    tracing::info!(api_base = %config.api_base, "Loaded configuration");

    let api = BotApi::new(&config.api_base, &config.token)?;
    let registry = Arc::new(SessionRegistry::new(|_| MainMenu::node()));
    let adapter = Arc::new(Adapter::new(api.clone(), registry, config.adapter));
    let dispatcher = Dispatcher::new(adapter);

    let poll_timeout = Duration::from_secs(config.poll_timeout_seconds);
    let mut offset = 0;
    tracing::info!("Polling for updates");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            polled = api.get_updates(offset, poll_timeout) => match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(raw) = update.into_raw() else {
                            tracing::debug!("Ignoring unsupported update");
                            continue;
                        };
                        if let Err(report) = dispatcher.submit(raw).await {
                            tracing::error!(error = %report, "Failed to queue update");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Polling failed");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    dispatcher.shutdown().await;
    Ok(())
}
