//! Per-connection query loop.
//!
//! # State Machine
//! ```text
//! AwaitingQuery ──read──▶ Processing ──▶ Responding ──write──▶ AwaitingQuery
//!       │
//!       └── zero-byte read / idle timeout / shutdown / I/O error ──▶ Closed
//! ```
//!
//! A stop signal is only observed while waiting for a query, so a query that
//! has been read is always answered before the session closes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::lifecycle::shutdown;
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::search::{build_matcher, LineMatcher};
use crate::session::protocol::{decode_query, Response, GREETING};
use crate::source::DataSource;

/// Read-only state shared by every session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub source: DataSource,
    pub matcher: Arc<dyn LineMatcher>,
    pub buffer_size: usize,
    pub idle_timeout: Option<Duration>,
}

impl SessionContext {
    pub fn new(source: DataSource, matcher: Arc<dyn LineMatcher>) -> Self {
        Self {
            source,
            matcher,
            buffer_size: crate::session::protocol::DEFAULT_BUFFER_SIZE,
            idle_timeout: None,
        }
    }

    /// Context for a source that has already been opened.
    pub fn from_config(source: DataSource, config: &ServerConfig) -> Self {
        let idle = config.session.idle_timeout_secs;
        Self {
            source,
            matcher: build_matcher(&config.search),
            buffer_size: config.session.buffer_size,
            idle_timeout: (idle > 0).then(|| Duration::from_secs(idle)),
        }
    }

    /// Answer one read's worth of bytes.
    pub async fn answer(&self, bytes: &[u8]) -> (Option<String>, Response) {
        let query = match decode_query(bytes) {
            Ok(query) => query,
            Err(e) => return (None, Response::from(&e)),
        };

        let response = match self.source.current_lines().await {
            Ok(lines) => match self.matcher.find(&lines, &query) {
                Ok(result) => Response::from(result),
                Err(e) => {
                    tracing::debug!(error = %e, "Query rejected by matcher");
                    Response::from(&e)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Source unavailable");
                Response::from(&e)
            }
        };
        (Some(query), response)
    }
}

/// Where a session is in its query cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingQuery,
    Processing,
    Responding,
    Closed,
}

/// Why a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed its side (zero-byte read).
    PeerClosed,
    /// No query arrived within the idle timeout.
    IdleTimeout,
    /// The server is shutting down.
    Shutdown,
}

/// The session's stream failed. Only this session is affected.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// One accepted connection and its query loop.
pub struct Session<S> {
    stream: S,
    peer: SocketAddr,
    id: ConnectionId,
    context: Arc<SessionContext>,
    state: SessionState,
    queries: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, id: ConnectionId, context: Arc<SessionContext>) -> Self {
        Self {
            stream,
            peer,
            id,
            context,
            state: SessionState::AwaitingQuery,
            queries: 0,
        }
    }

    /// Serve queries until the peer disconnects, the stream fails or a stop
    /// signal arrives while waiting for a query.
    pub async fn run(mut self, mut stop: broadcast::Receiver<()>) -> Result<CloseReason, SessionError> {
        tracing::info!(connection_id = %self.id, peer_addr = %self.peer, "New connection");

        let result = self.serve(&mut stop).await;
        self.transition(SessionState::Closed);
        let _ = self.stream.shutdown().await;

        tracing::info!(
            connection_id = %self.id,
            peer_addr = %self.peer,
            queries = self.queries,
            "Connection closed"
        );
        result
    }

    async fn serve(&mut self, stop: &mut broadcast::Receiver<()>) -> Result<CloseReason, SessionError> {
        self.stream.write_all(GREETING.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;

        let mut buf = vec![0u8; self.context.buffer_size];
        loop {
            self.transition(SessionState::AwaitingQuery);

            let idle_timeout = self.context.idle_timeout;
            let stream = &mut self.stream;
            let read = async {
                match idle_timeout {
                    Some(limit) => tokio::time::timeout(limit, stream.read(&mut buf)).await.ok(),
                    None => Some(stream.read(&mut buf).await),
                }
            };

            let n = tokio::select! {
                read = read => match read {
                    Some(result) => result?,
                    None => return Ok(CloseReason::IdleTimeout),
                },
                _ = shutdown::wait(stop) => return Ok(CloseReason::Shutdown),
            };

            if n == 0 {
                return Ok(CloseReason::PeerClosed);
            }

            self.transition(SessionState::Processing);
            let started = Instant::now();
            let (query, response) = self.context.answer(&buf[..n]).await;
            self.queries += 1;

            self.transition(SessionState::Responding);
            self.stream.write_all(&response.to_wire()).await?;
            self.stream.flush().await?;

            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            metrics::record_query(response.as_str(), started);
            tracing::info!(
                connection_id = %self.id,
                peer_addr = %self.peer,
                query = query.as_deref().unwrap_or(""),
                elapsed_ms,
                result = %response,
                "Query answered"
            );
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!(connection_id = %self.id, from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Algorithm, MatchResult, SearchError};
    use crate::source::LineSet;
    use tokio::io::{duplex, AsyncBufReadExt, BufReader, DuplexStream};

    fn context(lines: &[&str], algorithm: Algorithm) -> Arc<SessionContext> {
        let source = DataSource::cached(LineSet::from_lines(lines.iter().copied()));
        Arc::new(SessionContext::new(source, algorithm.matcher(1024)))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn read_line(reader: &mut BufReader<DuplexStream>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn answers_queries_in_order() {
        let (client, server) = duplex(4096);
        let (_tx, rx) = broadcast::channel(1);
        let session = Session::new(
            server,
            peer(),
            ConnectionId::from(1),
            context(&["alpha", "beta", "gamma"], Algorithm::Linear),
        );
        let handle = tokio::spawn(session.run(rx));

        let mut reader = BufReader::new(client);
        assert_eq!(read_line(&mut reader).await, format!("{GREETING}\n"));

        reader.get_mut().write_all(b"beta").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "STRING EXISTS\n");

        reader.get_mut().write_all(b"delta").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "STRING NOT FOUND\n");

        drop(reader);
        assert_eq!(handle.await.unwrap().unwrap(), CloseReason::PeerClosed);
    }

    #[tokio::test]
    async fn empty_query_is_an_error_and_session_continues() {
        let (client, server) = duplex(4096);
        let (_tx, rx) = broadcast::channel(1);
        let session = Session::new(
            server,
            peer(),
            ConnectionId::from(1),
            context(&["alpha"], Algorithm::Linear),
        );
        let handle = tokio::spawn(session.run(rx));

        let mut reader = BufReader::new(client);
        read_line(&mut reader).await;

        reader.get_mut().write_all(b"   \n").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "ERROR: EMPTY QUERY\n");

        reader.get_mut().write_all(b"alpha\n").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "STRING EXISTS\n");

        drop(reader);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn invalid_pattern_is_reported() {
        let (client, server) = duplex(4096);
        let (_tx, rx) = broadcast::channel(1);
        let session = Session::new(
            server,
            peer(),
            ConnectionId::from(1),
            context(&["a"], Algorithm::Regex),
        );
        tokio::spawn(session.run(rx));

        let mut reader = BufReader::new(client);
        read_line(&mut reader).await;

        reader.get_mut().write_all(b"(unclosed").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "ERROR: INVALID PATTERN\n");
    }

    #[tokio::test]
    async fn stop_signal_closes_waiting_session() {
        let (client, server) = duplex(4096);
        let (tx, rx) = broadcast::channel(1);
        let session = Session::new(
            server,
            peer(),
            ConnectionId::from(1),
            context(&["a"], Algorithm::Linear),
        );
        let handle = tokio::spawn(session.run(rx));

        let mut reader = BufReader::new(client);
        read_line(&mut reader).await;

        tx.send(()).unwrap();
        assert_eq!(handle.await.unwrap().unwrap(), CloseReason::Shutdown);
    }

    /// Reports when a query reaches it, then takes a while to answer.
    #[derive(Debug)]
    struct SlowMatcher {
        started: std::sync::mpsc::SyncSender<()>,
    }

    impl LineMatcher for SlowMatcher {
        fn find(&self, _lines: &LineSet, _query: &str) -> Result<MatchResult, SearchError> {
            let _ = self.started.send(());
            std::thread::sleep(Duration::from_millis(200));
            Ok(MatchResult::Exists)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn query_in_progress_is_answered_before_stop() {
        let (client, server) = duplex(4096);
        let (tx, rx) = broadcast::channel(1);
        let (started_tx, started_rx) = std::sync::mpsc::sync_channel(1);
        let matcher = Arc::new(SlowMatcher { started: started_tx });
        let ctx = SessionContext::new(DataSource::cached(LineSet::parse("a")), matcher);
        let session = Session::new(server, peer(), ConnectionId::from(1), Arc::new(ctx));
        let handle = tokio::spawn(session.run(rx));

        let mut reader = BufReader::new(client);
        read_line(&mut reader).await;
        reader.get_mut().write_all(b"a").await.unwrap();

        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();
        tx.send(()).unwrap();

        assert_eq!(read_line(&mut reader).await, "STRING EXISTS\n");
        assert_eq!(handle.await.unwrap().unwrap(), CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn idle_sessions_time_out() {
        let (client, server) = duplex(4096);
        let (_tx, rx) = broadcast::channel(1);
        let mut ctx = SessionContext::new(
            DataSource::cached(LineSet::parse("a")),
            Algorithm::Linear.matcher(1024),
        );
        ctx.idle_timeout = Some(Duration::from_millis(50));
        let session = Session::new(server, peer(), ConnectionId::from(1), Arc::new(ctx));

        let _client = client;
        let reason = session.run(rx).await.unwrap();
        assert_eq!(reason, CloseReason::IdleTimeout);
    }

    #[tokio::test]
    async fn answer_reports_missing_reread_file() {
        let ctx = SessionContext::new(
            DataSource::Reread {
                path: "/nonexistent/line-search/data.txt".into(),
                sort: false,
            },
            Algorithm::Linear.matcher(1024),
        );
        let (query, response) = ctx.answer(b"foo").await;
        assert_eq!(query.as_deref(), Some("foo"));
        assert_eq!(response, Response::FileNotFound);
    }

    #[tokio::test]
    async fn answer_skips_matching_for_bad_input() {
        let ctx = context(&["a"], Algorithm::Linear);
        assert_eq!(ctx.answer(b"\0\0").await, (None, Response::EmptyQuery));
        assert_eq!(ctx.answer(&[0xc3]).await, (None, Response::InvalidEncoding));
    }
}
