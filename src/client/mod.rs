//! Search client.
//!
//! # Responsibilities
//! - Connect over plain TCP or TLS, per the client configuration
//! - Consume the greeting line
//! - Send one query per write and read back one response line
//!
//! Used by the `search-cli` binary and by the integration tests.

pub mod tls;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::session::protocol::{Response, DEFAULT_BUFFER_SIZE};

/// Longest query the client will send; the server reads at most this much per query.
pub const MAX_QUERY_BYTES: usize = DEFAULT_BUFFER_SIZE;

/// Client-side settings, loaded from TOML.
///
/// ```toml
/// ssl_enabled = true
/// server_cert = "cert.pem"
/// server_name = "localhost"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(alias = "SSL_ENABLED")]
    pub ssl_enabled: bool,

    /// Certificate the server must present. Without it the server is not verified.
    #[serde(alias = "SERVER_CERT")]
    pub server_cert: Option<PathBuf>,

    /// SNI name; defaults to the host being connected to.
    pub server_name: Option<String>,
}

impl ClientConfig {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Client config not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ClientError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to read client config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse client config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("server certificate: {0}")]
    Certificate(String),

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("tls: {0}")]
    Tls(#[from] rustls::Error),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("query is {len} bytes, longer than the {max} byte limit")]
    QueryTooLong { len: usize, max: usize },

    #[error("server closed the connection")]
    Disconnected,

    #[error("unexpected response: {0:?}")]
    UnexpectedResponse(String),
}

/// Byte stream the client talks over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// A connected session with a search server.
pub struct SearchClient {
    stream: BufReader<Box<dyn Transport>>,
    greeting: String,
}

impl SearchClient {
    /// Connect to `host:port` and read the greeting.
    pub async fn connect(host: &str, port: u16, config: &ClientConfig) -> Result<Self, ClientError> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;

        let transport: Box<dyn Transport> = if config.ssl_enabled {
            let connector = tls::connector(config)?;
            let name = tls::server_name(config, host)?;
            Box::new(connector.connect(name, tcp).await?)
        } else {
            Box::new(tcp)
        };

        Self::handshake(transport).await
    }

    /// Wrap an already established stream and read the greeting.
    pub async fn handshake(transport: Box<dyn Transport>) -> Result<Self, ClientError> {
        let mut stream = BufReader::new(transport);
        let greeting = read_line(&mut stream).await?;
        Ok(Self { stream, greeting })
    }

    /// Greeting the server sent on connect.
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Send a query and wait for the answer.
    pub async fn query(&mut self, query: &str) -> Result<Response, ClientError> {
        if query.len() > MAX_QUERY_BYTES {
            return Err(ClientError::QueryTooLong {
                len: query.len(),
                max: MAX_QUERY_BYTES,
            });
        }
        let line = self.send_raw(query.as_bytes()).await?;
        Response::parse(&line).ok_or(ClientError::UnexpectedResponse(line))
    }

    /// Write raw bytes as one query and return the response line as sent.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<String, ClientError> {
        let writer = self.stream.get_mut();
        writer.write_all(bytes).await?;
        writer.flush().await?;
        read_line(&mut self.stream).await
    }

    /// Close the write side and drop the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }
}

async fn read_line(stream: &mut BufReader<Box<dyn Transport>>) -> Result<String, ClientError> {
    let mut line = String::new();
    if stream.read_line(&mut line).await? == 0 {
        return Err(ClientError::Disconnected);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GREETING;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn config_accepts_legacy_keys() {
        let config: ClientConfig = toml::from_str(
            r#"
            SSL_ENABLED = true
            SERVER_CERT = "server.pem"
            "#,
        )
        .unwrap();
        assert!(config.ssl_enabled);
        assert_eq!(config.server_cert, Some(PathBuf::from("server.pem")));
        assert!(config.server_name.is_none());
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let config = ClientConfig::load(Path::new("/nonexistent/client.toml")).unwrap();
        assert!(!config.ssl_enabled);
        assert!(config.server_cert.is_none());
    }

    #[tokio::test]
    async fn query_round_trip_over_stream() {
        let (client_side, mut server_side) = duplex(4096);

        let server = tokio::spawn(async move {
            server_side
                .write_all(format!("{GREETING}\n").as_bytes())
                .await
                .unwrap();
            let mut buf = [0u8; 64];
            let n = server_side.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"alpha");
            server_side.write_all(b"STRING EXISTS\n").await.unwrap();
        });

        let mut client = SearchClient::handshake(Box::new(client_side)).await.unwrap();
        assert_eq!(client.greeting(), GREETING);
        assert_eq!(client.query("alpha").await.unwrap(), Response::Exists);
        server.await.unwrap();

        assert!(client.query("beta").await.is_err());
    }

    #[tokio::test]
    async fn oversized_query_is_not_sent() {
        let (client_side, mut server_side) = duplex(4096);
        server_side
            .write_all(format!("{GREETING}\n").as_bytes())
            .await
            .unwrap();

        let mut client = SearchClient::handshake(Box::new(client_side)).await.unwrap();
        let query = "x".repeat(MAX_QUERY_BYTES + 1);
        assert!(matches!(
            client.query(&query).await,
            Err(ClientError::QueryTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_response_is_reported() {
        let (client_side, mut server_side) = duplex(4096);
        tokio::spawn(async move {
            server_side.write_all(b"hello\n").await.unwrap();
            let mut buf = [0u8; 16];
            let _ = server_side.read(&mut buf).await;
            server_side.write_all(b"MAYBE\n").await.unwrap();
            // keep the stream open until the client has read
            let _ = server_side.read(&mut buf).await;
        });

        let mut client = SearchClient::handshake(Box::new(client_side)).await.unwrap();
        assert!(matches!(
            client.query("q").await,
            Err(ClientError::UnexpectedResponse(line)) if line == "MAYBE"
        ));
    }
}
