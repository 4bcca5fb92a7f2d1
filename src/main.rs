use fleetwarden::{bot, config::ConfigStore, remote::SshConsole, serverlist};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_FILE: &str = "Config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetwarden=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fleetwarden v{}", env!("CARGO_PKG_VERSION"));

    let store = match ConfigStore::load(CONFIG_FILE) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Could not load {}: {}", CONFIG_FILE, e);
            error!("Create it next to the binary with at least a SecretKey entry.");
            return Err(anyhow::anyhow!("Configuration missing"));
        }
    };
    info!("Configuration loaded");

    if store.snapshot().await.secret_key.is_empty() {
        error!("SecretKey is empty in {}", CONFIG_FILE);
        error!("Paste the bot token into the SecretKey field and restart.");
        return Err(anyhow::anyhow!("Bot token not configured"));
    }

    let server_count = store.servers().await.len();
    info!("{} server connection(s) registered", server_count);

    let console = Arc::new(SshConsole::new());
    let feed = Arc::new(serverlist::ServerListClient::new(
        serverlist::DEFAULT_FEED_URL,
    ));

    bot::run(store, console, feed).await?;

    Ok(())
}
