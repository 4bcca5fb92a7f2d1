use crate::command::ReplySink;
use crate::config::ServerConnection;
use crate::error::{AppError, AppResult};
use crate::remote::RemoteConsole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Command that prints the game's ban-list artifact.
const READ_BAN_LIST: &str = "cat ./server/admin/banlist.json";

/// One game-level ban record, as stored in the remote artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BanEntry {
    pub user_name: String,
    pub user_id: String,
    #[serde(rename = "dateTimeOfBan")]
    pub banned_at: DateTime<Utc>,
    pub minutes: i64,
    pub reason: String,
}

/// The full remote artifact. Fetched fresh on every query, never cached.
#[derive(Debug, Clone, Deserialize)]
pub struct BanList {
    #[serde(rename = "banEntries")]
    pub entries: Vec<BanEntry>,
}

impl BanList {
    pub fn parse(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(AppError::BanListFormat)
    }

    pub fn user_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.user_name.clone()).collect()
    }

    pub fn find(&self, user_name: &str) -> Option<&BanEntry> {
        self.entries.iter().find(|e| e.user_name == user_name)
    }
}

/// Fetches and parses the remote ban list over a scoped shell session.
pub struct BanListService {
    console: Arc<dyn RemoteConsole>,
}

impl BanListService {
    pub fn new(console: Arc<dyn RemoteConsole>) -> Self {
        Self { console }
    }

    /// All banned usernames, in artifact order.
    pub async fn list_banned(
        &self,
        server: &ServerConnection,
        sink: &dyn ReplySink,
    ) -> AppResult<Vec<String>> {
        let list = self.fetch(server, sink, "ban list").await?;
        Ok(list.user_names())
    }

    /// One ban record by exact username; `None` when the user is not banned.
    pub async fn get_banned(
        &self,
        server: &ServerConnection,
        user_name: &str,
        sink: &dyn ReplySink,
    ) -> AppResult<Option<BanEntry>> {
        let list = self.fetch(server, sink, "ban details").await?;
        Ok(list.find(user_name).cloned())
    }

    async fn fetch(
        &self,
        server: &ServerConnection,
        sink: &dyn ReplySink,
        what: &str,
    ) -> AppResult<BanList> {
        let mut session = self.console.open(server).await?;
        sink.say("Connection to server successful.".to_string()).await;
        sink.say(format!("Getting {}.", what)).await;

        let result = session.run(READ_BAN_LIST).await;
        let output = match result {
            Ok(output) => output,
            Err(e) => return Err(e.into()),
        };

        sink.say("Ban details retrieved.".to_string()).await;
        session.close().await;

        BanList::parse(&output.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{"banEntries":[{"userName":"alice","userId":"123","dateTimeOfBan":"2023-01-01T00:00:00Z","minutes":60,"reason":"spam"}]}"#;

    #[test]
    fn test_parse_literal_artifact() {
        let list = BanList::parse(ARTIFACT).unwrap();
        assert_eq!(list.user_names(), vec!["alice"]);

        let entry = list.find("alice").unwrap();
        assert_eq!(entry.user_id, "123");
        assert_eq!(entry.minutes, 60);
        assert_eq!(entry.reason, "spam");
        assert_eq!(entry.banned_at.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_absent_user_is_none() {
        let list = BanList::parse(ARTIFACT).unwrap();
        assert!(list.find("bob").is_none());
    }

    #[test]
    fn test_malformed_artifact_is_an_error() {
        assert!(matches!(
            BanList::parse("not json at all"),
            Err(AppError::BanListFormat(_))
        ));
        // Valid JSON, wrong shape
        assert!(matches!(
            BanList::parse(r#"{"wrong": []}"#),
            Err(AppError::BanListFormat(_))
        ));
    }

    #[test]
    fn test_empty_ban_list() {
        let list = BanList::parse(r#"{"banEntries":[]}"#).unwrap();
        assert!(list.user_names().is_empty());
        assert!(list.find("anyone").is_none());
    }
}
