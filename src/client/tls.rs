//! Client-side TLS.
//!
//! With a server certificate configured, the server is verified against it
//! (it acts as the only trust root). Without one, any server certificate is
//! accepted so self-signed deployments work; the channel is still encrypted
//! but the server is not authenticated.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::TlsConnector;

use crate::client::{ClientConfig, ClientError};
use crate::net::tls::install_crypto_provider;

/// Build a connector according to the client configuration.
pub fn connector(config: &ClientConfig) -> Result<TlsConnector, ClientError> {
    install_crypto_provider();
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let tls = match &config.server_cert {
        Some(path) => builder
            .with_root_certificates(load_roots(path)?)
            .with_no_client_auth(),
        None => {
            tracing::warn!("No server certificate configured; server identity is not verified");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
                .with_no_client_auth()
        }
    };

    Ok(TlsConnector::from(Arc::new(tls)))
}

/// Name presented for SNI and checked against the server certificate.
pub fn server_name(config: &ClientConfig, host: &str) -> Result<ServerName<'static>, ClientError> {
    let name = config.server_name.clone().unwrap_or_else(|| host.to_string());
    ServerName::try_from(name.clone()).map_err(|_| ClientError::InvalidServerName(name))
}

fn load_roots(path: &Path) -> Result<RootCertStore, ClientError> {
    let file = File::open(path)
        .map_err(|e| ClientError::Certificate(format!("{}: {e}", path.display())))?;

    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut BufReader::new(file)) {
        let cert = cert.map_err(|e| ClientError::Certificate(format!("{}: {e}", path.display())))?;
        roots.add(cert)?;
    }

    if roots.is_empty() {
        return Err(ClientError::Certificate(format!(
            "{}: no certificates found",
            path.display()
        )));
    }
    Ok(roots)
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
