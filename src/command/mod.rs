pub mod parse;
pub mod router;

use crate::error::ReplyError;
use async_trait::async_trait;
use std::time::Duration;

pub use parse::{Command, Dispatch, Verb};
pub use router::CommandRouter;

/// Context of one incoming chat message: who issued it and what the
/// transport knows about itself.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub author_id: String,
    pub author_name: String,
    pub latency: Option<Duration>,
}

/// Ordered reply channel back to the chat collaborator.
///
/// Text delivery failures are the implementation's problem to log; only the
/// attachment path is fallible, because the size-limit rejection must be
/// converted into a user-visible reply by the router.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn say(&self, text: String);

    async fn send_file(&self, file_name: String, bytes: Vec<u8>) -> Result<(), ReplyError>;
}

/// Resolves a chat-platform id to a display name, for admin registry entries.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    async fn display_name(&self, id: &str) -> Option<String>;
}
