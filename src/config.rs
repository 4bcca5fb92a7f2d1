use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// One bot-admin entry. The `Name` field packs the chat-platform id and the
/// display name into a single space-joined string (`"<id> <displayName>"`),
/// and membership is tested by id-prefix match against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Admin {
    #[serde(rename = "Name")]
    pub name: String,
}

impl Admin {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            name: format!("{} {}", id, display_name),
        }
    }

    /// True when the stored entry starts with the given identity.
    pub fn matches(&self, identity: &str) -> bool {
        self.name
            .get(..identity.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(identity))
    }
}

/// Connection details for one managed game server, keyed by its alias.
/// Immutable at runtime; sourced entirely from the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConnection {
    #[serde(rename = "ServerName")]
    pub name: String,
    #[serde(rename = "Ip")]
    pub ip: String,
    #[serde(rename = "Login")]
    pub login: String,
    #[serde(rename = "Password")]
    pub password: String,
}

/// Root configuration aggregate, mirroring the on-disk JSON document exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "SecretKey")]
    pub secret_key: String,
    #[serde(rename = "Admins", default)]
    pub admins: Vec<Admin>,
    #[serde(rename = "ServersConnections", default)]
    pub servers: Vec<ServerConnection>,
}

/// Owner of the process-wide `Config` instance and its file on disk.
///
/// All mutations go through [`ConfigStore::update`], which holds the write
/// lock across the save so concurrent admin commands cannot interleave their
/// read-modify-write cycles, and which only commits to memory after the new
/// document has been renamed over the old one. A successful update therefore
/// implies the file and memory agree.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    state: RwLock<Config>,
}

impl ConfigStore {
    /// Load the config file at startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(Self {
            path,
            state: RwLock::new(config),
        })
    }

    /// Create a store from an in-memory config, writing the initial file.
    pub async fn create<P: AsRef<Path>>(path: P, config: Config) -> Result<Self, ConfigError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            state: RwLock::new(config),
        };
        let snapshot = store.state.read().await.clone();
        store.persist(&snapshot).await?;
        Ok(store)
    }

    /// Clone the current aggregate.
    pub async fn snapshot(&self) -> Config {
        self.state.read().await.clone()
    }

    pub async fn admins(&self) -> Vec<Admin> {
        self.state.read().await.admins.clone()
    }

    pub async fn servers(&self) -> Vec<ServerConnection> {
        self.state.read().await.servers.clone()
    }

    /// Apply a mutation and persist it atomically.
    ///
    /// The closure runs against a clone; the clone is committed to memory
    /// only after the save succeeded, so a failed save leaves the in-memory
    /// registry exactly as it was.
    pub async fn update<F>(&self, mutate: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        mutate(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }

    /// Write the document to a temp sibling, then rename over the real file
    /// so readers never observe a partial write.
    async fn persist(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_vec_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Config persisted to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "SecretKey": "token-123",
        "Admins": [ { "Name": "123456789012345678 Alice" } ],
        "ServersConnections": [
            { "ServerName": "SD", "Ip": "10.0.0.1", "Login": "root", "Password": "hunter2" }
        ]
    }"#;

    #[test]
    fn test_config_parses_external_schema() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.secret_key, "token-123");
        assert_eq!(config.admins.len(), 1);
        assert_eq!(config.admins[0].name, "123456789012345678 Alice");
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].name, "SD");
        assert_eq!(config.servers[0].ip, "10.0.0.1");
        assert_eq!(config.servers[0].login, "root");
        assert_eq!(config.servers[0].password, "hunter2");
    }

    #[test]
    fn test_config_serializes_with_original_keys() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"SecretKey\""));
        assert!(json.contains("\"Admins\""));
        assert!(json.contains("\"ServersConnections\""));
        assert!(json.contains("\"ServerName\""));
        assert!(json.contains("\"Ip\""));
        assert!(json.contains("\"Login\""));
        assert!(json.contains("\"Password\""));
        assert!(json.contains("\"Name\""));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config: Config = serde_json::from_str(r#"{ "SecretKey": "t" }"#).unwrap();
        assert!(config.admins.is_empty());
        assert!(config.servers.is_empty());
    }

    #[test]
    fn test_admin_prefix_match_is_case_insensitive() {
        let admin = Admin::new("123456789012345678", "Alice");
        assert!(admin.matches("123456789012345678"));
        assert!(admin.matches("123456"));
        assert!(!admin.matches("999"));
        assert!(!admin.matches("1234567890123456789999999999999"));
    }

    #[tokio::test]
    async fn test_update_persists_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let store = ConfigStore::load(&path).unwrap();
        store
            .update(|cfg| cfg.admins.push(Admin::new("876543210987654321", "Bob")))
            .await
            .unwrap();

        // Re-load from disk: the mutation must already be durable.
        let reloaded = ConfigStore::load(&path).unwrap();
        let admins = reloaded.admins().await;
        assert_eq!(admins.len(), 2);
        assert_eq!(admins[1].name, "876543210987654321 Bob");
    }

    #[tokio::test]
    async fn test_update_round_trips_unrelated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let store = ConfigStore::load(&path).unwrap();
        store.update(|cfg| cfg.admins.clear()).await.unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        let snapshot = reloaded.snapshot().await;
        assert_eq!(snapshot.secret_key, "token-123");
        assert_eq!(snapshot.servers.len(), 1);
        assert!(snapshot.admins.is_empty());
    }
}
