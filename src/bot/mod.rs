pub mod handler;

use crate::command::CommandRouter;
use crate::config::ConfigStore;
use crate::error::{AppError, AppResult};
use crate::remote::RemoteConsole;
use crate::serverlist::ServerListClient;
use serenity::gateway::ShardManager;
use serenity::prelude::{GatewayIntents, TypeMapKey};
use std::sync::Arc;
use tracing::info;

/// Shard manager handle stashed in the client data map so the message
/// handler can report gateway latency for `!ping`.
pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<ShardManager>;
}

/// Build the gateway client and run it until shutdown.
pub async fn run(
    store: Arc<ConfigStore>,
    console: Arc<dyn RemoteConsole>,
    feed: Arc<ServerListClient>,
) -> AppResult<()> {
    let token = store.snapshot().await.secret_key;
    if token.is_empty() {
        return Err(AppError::internal("Bot token is empty"));
    }

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let router = Arc::new(CommandRouter::new(store, console, feed));

    let mut client = serenity::Client::builder(&token, intents)
        .event_handler(handler::Handler::new(router))
        .await?;

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
    }

    info!("Starting gateway client...");
    client.start().await?;

    Ok(())
}
