use crate::config::ServerConnection;
use crate::error::ShellError;
use crate::remote::{CommandOutput, RemoteConsole, RemoteSession};
use async_trait::async_trait;
use ssh2::Session;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use tracing::debug;

const SSH_PORT: u16 = 22;

/// ssh2-backed [`RemoteConsole`]. libssh2 is blocking, so every round trip
/// is bridged through `spawn_blocking` with the session moved in and out of
/// the closure.
#[derive(Debug, Default)]
pub struct SshConsole;

impl SshConsole {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteConsole for SshConsole {
    async fn open(&self, server: &ServerConnection) -> Result<Box<dyn RemoteSession>, ShellError> {
        let server = server.clone();
        let session = tokio::task::spawn_blocking(move || connect(&server))
            .await
            .map_err(|e| ShellError::Connect(e.to_string()))??;
        Ok(Box::new(SshSession {
            inner: Some(session),
        }))
    }
}

struct SshSession {
    // Taken out while a blocking call is in flight, put back afterwards.
    inner: Option<Session>,
}

impl SshSession {
    fn take(&mut self) -> Result<Session, ShellError> {
        self.inner
            .take()
            .ok_or_else(|| ShellError::Command("session already closed".to_string()))
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn run(&mut self, command: &str) -> Result<CommandOutput, ShellError> {
        let session = self.take()?;
        let command = command.to_string();
        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = exec(&session, &command);
            (session, result)
        })
        .await
        .map_err(|e| ShellError::Command(e.to_string()))?;
        self.inner = Some(session);
        result
    }

    async fn download(&mut self, remote_path: &str) -> Result<Vec<u8>, ShellError> {
        let session = self.take()?;
        let remote_path = remote_path.to_string();
        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = scp_download(&session, &remote_path);
            (session, result)
        })
        .await
        .map_err(|e| ShellError::Transfer(e.to_string()))?;
        self.inner = Some(session);
        result
    }

    async fn close(mut self: Box<Self>) {
        if let Some(session) = self.inner.take() {
            let _ = tokio::task::spawn_blocking(move || {
                if let Err(e) = session.disconnect(None, "closing session", None) {
                    debug!("SSH disconnect returned an error: {}", e);
                }
            })
            .await;
        }
    }
}

fn connect(server: &ServerConnection) -> Result<Session, ShellError> {
    let addr = format!("{}:{}", server.ip, SSH_PORT);
    let tcp = TcpStream::connect(&addr).map_err(|e| ShellError::Connect(e.to_string()))?;

    let mut session = Session::new().map_err(|e| ShellError::Connect(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| ShellError::Connect(e.to_string()))?;
    session
        .userauth_password(&server.login, &server.password)
        .map_err(|e| ShellError::Connect(e.to_string()))?;
    if !session.authenticated() {
        return Err(ShellError::Connect("authentication rejected".to_string()));
    }

    debug!("SSH session established with {}", server.name);
    Ok(session)
}

fn exec(session: &Session, command: &str) -> Result<CommandOutput, ShellError> {
    let mut channel = session
        .channel_session()
        .map_err(|e| ShellError::Command(e.to_string()))?;
    channel
        .exec(command)
        .map_err(|e| ShellError::Command(e.to_string()))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| ShellError::Command(e.to_string()))?;

    let _ = channel.wait_close();
    let exit_status = channel.exit_status().unwrap_or(0);

    Ok(CommandOutput {
        output,
        exit_status,
    })
}

fn scp_download(session: &Session, remote_path: &str) -> Result<Vec<u8>, ShellError> {
    let (mut channel, stat) = session
        .scp_recv(Path::new(remote_path))
        .map_err(|e| ShellError::Transfer(e.to_string()))?;

    let mut buf = Vec::with_capacity(stat.size() as usize);
    channel
        .read_to_end(&mut buf)
        .map_err(|e| ShellError::Transfer(e.to_string()))?;

    let _ = channel.send_eof();
    let _ = channel.wait_eof();
    let _ = channel.wait_close();

    Ok(buf)
}
