pub mod bans;
pub mod logs;
pub mod shell;

use crate::config::ServerConnection;
use crate::error::ShellError;
use async_trait::async_trait;

pub use bans::{BanEntry, BanList, BanListService};
pub use logs::{CompressedLog, LogArchiver};
pub use shell::SshConsole;

/// Output of one remote command round trip.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub output: String,
    pub exit_status: i32,
}

/// Factory for secure sessions against a single server.
#[async_trait]
pub trait RemoteConsole: Send + Sync {
    /// Connect and authenticate. The returned session is exclusively owned
    /// by the calling command task.
    async fn open(&self, server: &ServerConnection) -> Result<Box<dyn RemoteSession>, ShellError>;
}

/// One live secure session. Commands run sequentially, one blocking round
/// trip per call; dropping the session disconnects it, so release is
/// guaranteed on every exit path.
#[async_trait]
pub trait RemoteSession: Send {
    /// Execute a shell command line and capture its output.
    async fn run(&mut self, command: &str) -> Result<CommandOutput, ShellError>;

    /// Fetch an entire remote file into memory. There is no streaming
    /// backpressure; callers must bound what they forward onward.
    async fn download(&mut self, remote_path: &str) -> Result<Vec<u8>, ShellError>;

    /// Disconnect politely. Error paths may simply drop the session instead.
    async fn close(self: Box<Self>);
}
