//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use line_search::client::{ClientConfig, SearchClient};
use line_search::{SearchServer, ServerConfig, Shutdown};
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;

/// A server running on an ephemeral port over a temporary data file.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub data: NamedTempFile,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn data_path(&self) -> &Path {
        self.data.path()
    }

    pub async fn client(&self) -> SearchClient {
        SearchClient::connect("127.0.0.1", self.addr.port(), &ClientConfig::default())
            .await
            .unwrap()
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .unwrap();
    }
}

/// Write `contents` to a temp file and serve it with `configure` applied.
pub async fn start_server(contents: &str, configure: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let mut data = NamedTempFile::new().unwrap();
    data.write_all(contents.as_bytes()).unwrap();
    data.flush().unwrap();

    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.source.path = data.path().to_path_buf();
    config.lifecycle.shutdown_timeout_secs = 2;
    configure(&mut config);

    let server = SearchServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    let handle = tokio::spawn(server.run(stop));

    TestServer {
        addr,
        shutdown,
        data,
        handle,
    }
}
