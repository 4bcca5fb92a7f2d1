use crate::command::ReplySink;
use crate::config::ServerConnection;
use crate::error::AppResult;
use crate::remote::RemoteConsole;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Path of the game server's log file, relative to the login user's home.
pub const REMOTE_LOG_PATH: &str = "server/serverlog.txt";

/// A gzip'd log artifact plus the length it had before compression, for
/// user-facing size reporting when the transport rejects the payload.
#[derive(Debug, Clone)]
pub struct CompressedLog {
    pub bytes: Vec<u8>,
    pub original_len: usize,
}

/// Downloads the remote server log and compresses it for transport.
pub struct LogArchiver {
    console: Arc<dyn RemoteConsole>,
}

impl LogArchiver {
    pub fn new(console: Arc<dyn RemoteConsole>) -> Self {
        Self { console }
    }

    /// Secure-copy the whole log into memory, then gzip it. The caller is
    /// responsible for bounding what it forwards to the reply sink.
    pub async fn fetch_compressed_log(
        &self,
        server: &ServerConnection,
        sink: &dyn ReplySink,
    ) -> AppResult<CompressedLog> {
        let mut session = self.console.open(server).await?;
        sink.say("Connection to server successful.".to_string()).await;

        let raw = session.download(REMOTE_LOG_PATH).await?;
        session.close().await;

        let bytes = compress(&raw)?;
        debug!(
            "Log from {} compressed: {} -> {} bytes",
            server.name,
            raw.len(),
            bytes.len()
        );

        Ok(CompressedLog {
            bytes,
            original_len: raw.len(),
        })
    }
}

/// Gzip a byte sequence in one pass.
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use proptest::prelude::*;
    use std::io::Read;

    fn decompress(data: &[u8]) -> Vec<u8> {
        let mut decoder = GzDecoder::new(data);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_compress_round_trip() {
        let input = b"2024-01-01 12:00:00 [INFO] server started\n".repeat(100);
        let compressed = compress(&input).unwrap();
        assert!(compressed.len() < input.len());
        assert_eq!(decompress(&compressed), input);
    }

    #[test]
    fn test_compress_empty_input() {
        let compressed = compress(&[]).unwrap();
        assert_eq!(decompress(&compressed), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn compression_round_trips(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let compressed = compress(&data).unwrap();
            prop_assert_eq!(decompress(&compressed), data);
        }
    }
}
