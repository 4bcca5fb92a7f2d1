use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote shell error: {0}")]
    Shell(#[from] ShellError),

    #[error("Malformed ban list artifact: {0}")]
    BanListFormat(serde_json::Error),

    #[error("Server list feed error: {0}")]
    Feed(#[from] reqwest::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Errors loading or persisting the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Remote session failures, split by the phase they occur in.
///
/// Variants carry rendered messages rather than the underlying ssh2 error so
/// that in-process test doubles can produce them too.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("remote command failed: {0}")]
    Command(String),

    #[error("file transfer failed: {0}")]
    Transfer(String),
}

/// Admin registry management failures, each mapped to one reply string by the
/// command router.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("not a valid id")]
    InvalidId,

    #[error("already a bot admin")]
    AlreadyAdmin,

    #[error("not a bot admin")]
    NotAdmin,

    #[error("failed to persist admin registry: {0}")]
    Persist(String),
}

/// Failures delivering a reply to the chat transport
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("attachment exceeds the transport size limit")]
    AttachmentTooLarge,

    #[error("delivery failed: {0}")]
    Delivery(String),
}
