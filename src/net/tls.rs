//! TLS configuration, certificate loading and server handshakes.

use std::path::Path;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// Failed to prepare the server TLS context. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("certificate file not found: {0}")]
    MissingCertificate(String),

    #[error("private key file not found: {0}")]
    MissingKey(String),

    #[error("failed to load certificate/key: {0}")]
    Load(#[source] std::io::Error),
}

/// A TLS negotiation with one client failed. Only that connection is dropped.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("tls handshake failed: {0}")]
    Failed(#[source] std::io::Error),

    #[error("tls handshake timed out after {0:?}")]
    TimedOut(Duration),
}

/// Make aws-lc-rs the process-wide rustls provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    // Err: already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    // Basic validation
    if !cert_path.exists() {
        return Err(TlsError::MissingCertificate(cert_path.display().to_string()));
    }
    if !key_path.exists() {
        return Err(TlsError::MissingKey(key_path.display().to_string()));
    }

    install_crypto_provider();
    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(TlsError::Load)
}

/// Build the acceptor used to wrap every accepted connection.
pub async fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, TlsError> {
    let config = load_tls_config(cert_path, key_path).await?;
    tracing::info!(cert = %cert_path.display(), "TLS enabled");
    Ok(TlsAcceptor::from(config.get_inner()))
}

/// Run the server side of a TLS handshake on an accepted stream.
pub async fn handshake<IO>(
    acceptor: &TlsAcceptor,
    stream: IO,
    timeout: Duration,
) -> Result<TlsStream<IO>, HandshakeError>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    match tokio::time::timeout(timeout, acceptor.accept(stream)).await {
        Ok(Ok(tls)) => Ok(tls),
        Ok(Err(e)) => Err(HandshakeError::Failed(e)),
        Err(_) => Err(HandshakeError::TimedOut(timeout)),
    }
}
