use crate::error::AppResult;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Public feed listing the game's live servers.
pub const DEFAULT_FEED_URL: &str = "https://hub.fleetwarden.io/serverlist";

const FEED_TIMEOUT_SECS: u64 = 10;

/// One live server as reported by the public feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "ServerName")]
    pub server_name: String,
    #[serde(rename = "ForkName")]
    pub fork_name: String,
    #[serde(rename = "BuildVersion")]
    pub build_version: String,
    #[serde(rename = "PlayerCount")]
    pub player_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerFeed {
    pub servers: Vec<ServerInfo>,
}

/// Client for the read-only public server-list endpoint.
pub struct ServerListClient {
    http: Client,
    url: String,
}

impl std::fmt::Debug for ServerListClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerListClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ServerListClient {
    pub fn new<S: Into<String>>(url: S) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            url: url.into(),
        }
    }

    /// Fetch the current server list from the feed.
    pub async fn fetch(&self) -> AppResult<Vec<ServerInfo>> {
        debug!("Fetching server list from {}", self.url);
        let response = self.http.get(&self.url).send().await?;
        let feed: ServerFeed = response.error_for_status()?.json().await?;
        Ok(feed.servers)
    }
}

/// Render the feed the way operators expect to read it in chat.
pub fn render(servers: &[ServerInfo]) -> String {
    let mut out = String::from(">>> ");
    for info in servers {
        out.push_str(&format!(
            "{} {} Build:{} - Player Count: {}\n",
            info.server_name, info.fork_name, info.build_version, info.player_count
        ));
    }
    out
}
