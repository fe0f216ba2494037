use crate::cert::CertificateInfo;
use anyhow::Context;
use async_trait::async_trait;
use hickory_resolver::{ResolveError, Resolver, TokioResolver};
use log::debug;
use rustls::{
  client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
  },
  crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider},
  pki_types::{CertificateDer, IpAddr as RustlsIpAddr, ServerName, UnixTime},
  ClientConfig, DigitallySignedStruct, ProtocolVersion, SignatureScheme,
};
use std::{
  io,
  net::{IpAddr, SocketAddr},
  str::FromStr,
  sync::Arc,
  time::Duration,
};
use thiserror::Error;
use tokio::{net::TcpStream, time::timeout};
use tokio_rustls::TlsConnector;

use super::CertificateSource;

const HTTPS_PORT: u16 = 443;

#[derive(Debug, Error)]
pub enum Error {
  #[error("DNS resolution failed for `{host}`")]
  Resolve {
    host: String,
    #[source]
    source: ResolveError,
  },
  #[error("DNS resolution for `{0}` timed out")]
  ResolveTimeout(String),
  #[error("`{0}` did not resolve to any address")]
  NoAddress(String),
  #[error("TCP connect to {0} timed out")]
  ConnectTimeout(SocketAddr),
  #[error("TCP connect to {addr} failed")]
  Connect {
    addr: SocketAddr,
    #[source]
    source: io::Error,
  },
  #[error("`{0}` is not a valid TLS server name")]
  ServerName(String),
  #[error("TLS handshake with `{0}` timed out")]
  HandshakeTimeout(String),
  #[error("TLS handshake with `{host}` failed")]
  Handshake {
    host: String,
    #[source]
    source: io::Error,
  },
  #[error("server returned no certificates")]
  NoCertificates,
  #[error(transparent)]
  Certificate(#[from] anyhow::Error),
}

/// Accepts whatever chain the server presents.
///
/// Trust is not evaluated here: expired and self-signed certificates must
/// still be read so their validity window can be reported. Handshake
/// signatures are verified as usual.
#[derive(Debug)]
struct AcceptAnyChain(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyChain {
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
    verify_tls12_signature(
      message,
      cert,
      dss,
      &self.0.signature_verification_algorithms,
    )
  }

  fn verify_tls13_signature(
    &self,
    message: &[u8],
    cert: &CertificateDer<'_>,
    dss: &DigitallySignedStruct,
  ) -> Result<HandshakeSignatureValid, rustls::Error> {
    verify_tls13_signature(
      message,
      cert,
      dss,
      &self.0.signature_verification_algorithms,
    )
  }

  fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
    self.0.signature_verification_algorithms.supported_schemes()
  }
}

fn tls_connector() -> Result<TlsConnector, rustls::Error> {
  let provider = Arc::new(rustls::crypto::ring::default_provider());
  let config = ClientConfig::builder_with_provider(provider.clone())
    .with_safe_default_protocol_versions()?
    .dangerous()
    .with_custom_certificate_verifier(Arc::new(AcceptAnyChain(provider)))
    .with_no_client_auth();
  Ok(TlsConnector::from(Arc::new(config)))
}

/// Fetches leaf certificates over a real TCP + TLS connection.
#[derive(Clone)]
pub struct LiveCertificates {
  resolver: TokioResolver,
  connector: TlsConnector,
  connect_timeout: Duration,
  handshake_timeout: Duration,
}

impl LiveCertificates {
  /// # Errors
  ///
  /// Fails if the system resolver configuration cannot be read or the TLS
  /// client cannot be configured.
  pub fn new(
    connect_timeout: Duration,
    handshake_timeout: Duration,
  ) -> anyhow::Result<Self> {
    let resolver = Resolver::builder_tokio()
      .context("reading system DNS configuration")?
      .build();
    let connector = tls_connector().context("configuring TLS client")?;
    Ok(Self {
      resolver,
      connector,
      connect_timeout,
      handshake_timeout,
    })
  }

  async fn resolve(&self, host: &str) -> Result<IpAddr, Error> {
    if let Ok(ip) = IpAddr::from_str(host) {
      return Ok(ip);
    }
    let answer = timeout(self.connect_timeout, self.resolver.lookup_ip(host))
      .await
      .map_err(|_| Error::ResolveTimeout(host.to_owned()))?
      .map_err(|source| Error::Resolve {
        host: host.to_owned(),
        source,
      })?;
    answer
      .iter()
      .next()
      .ok_or_else(|| Error::NoAddress(host.to_owned()))
  }

  /// Connects to `host:443` and reads the certificate it presents.
  ///
  /// # Errors
  ///
  /// Fails on DNS resolution, TCP connect, TLS handshake (each bounded by
  /// its own timeout), an empty certificate chain, or an unparseable leaf
  /// certificate.
  pub async fn fetch_certificate(
    &self,
    host: &str,
  ) -> Result<CertificateInfo, Error> {
    // 1. DNS + TCP connect
    let addr = SocketAddr::new(self.resolve(host).await?, HTTPS_PORT);
    debug!("connecting to {addr} for {host}");
    let tcp = timeout(self.connect_timeout, TcpStream::connect(addr))
      .await
      .map_err(|_| Error::ConnectTimeout(addr))?
      .map_err(|source| Error::Connect { addr, source })?;

    // 2. TLS handshake
    let server_name = match IpAddr::from_str(host) {
      Ok(ip) => ServerName::IpAddress(RustlsIpAddr::from(ip)),
      Err(_) => ServerName::try_from(host.to_string())
        .map_err(|_| Error::ServerName(host.to_owned()))?,
    };

    let tls_stream =
      timeout(self.handshake_timeout, self.connector.connect(server_name, tcp))
        .await
        .map_err(|_| Error::HandshakeTimeout(host.to_owned()))?
        .map_err(|source| Error::Handshake {
          host: host.to_owned(),
          source,
        })?;

    let session = &tls_stream.get_ref().1;

    // 3. Protocol version
    let tls_version = session
      .protocol_version()
      .map_or("unknown", |v| match v {
        ProtocolVersion::TLSv1_3 => "TLS 1.3",
        ProtocolVersion::TLSv1_2 => "TLS 1.2",
        _ => "unknown",
      });

    // 4. Leaf certificate
    let end_entity = session
      .peer_certificates()
      .and_then(|chain| chain.first())
      .ok_or(Error::NoCertificates)?;

    Ok(CertificateInfo::from_der(end_entity.as_ref(), tls_version)?)
  }
}

#[async_trait]
impl CertificateSource for LiveCertificates {
  async fn fetch(&self, host: &str) -> anyhow::Result<CertificateInfo> {
    Ok(self.fetch_certificate(host).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tls_connector_builds() {
    assert!(tls_connector().is_ok());
  }

  #[test]
  fn test_verifier_advertises_schemes() {
    let verifier =
      AcceptAnyChain(Arc::new(rustls::crypto::ring::default_provider()));
    assert!(!verifier.supported_verify_schemes().is_empty());
  }

  #[test]
  fn test_error_messages_name_the_host() {
    let err = Error::NoAddress("nowhere.invalid".into());
    assert_eq!(
      err.to_string(),
      "`nowhere.invalid` did not resolve to any address"
    );
    let err = Error::HandshakeTimeout("example.com".into());
    assert!(err.to_string().contains("example.com"));
  }
}
