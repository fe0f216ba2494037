use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use x509_parser::{extensions::GeneralName, prelude::*};

/// Validity window and identity of a server's leaf certificate, as seen at
/// fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
  pub subject: String,
  pub issuer: String,
  pub not_before: DateTime<Utc>,
  pub not_after: DateTime<Utc>,
  pub dns_names: Vec<String>,
  pub tls_version: String,
}

impl CertificateInfo {
  /// Projects a DER-encoded end-entity certificate.
  ///
  /// `tls_version` is whatever the handshake negotiated; it is carried
  /// through for display only.
  ///
  /// # Errors
  ///
  /// Fails if the DER cannot be parsed or if a validity timestamp is out of
  /// chrono's range.
  pub fn from_der(der: &[u8], tls_version: impl Into<String>) -> Result<Self> {
    let (_, cert) = X509Certificate::from_der(der)
      .context("parsing end-entity certificate")?;

    let issuer = first_common_name(cert.issuer())
      .unwrap_or_else(|| cert.issuer().to_string());
    let subject = first_common_name(cert.subject())
      .unwrap_or_else(|| cert.subject().to_string());

    let not_before =
      DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
        .ok_or_else(|| anyhow::anyhow!("invalid not_before timestamp"))?;
    let not_after =
      DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
        .ok_or_else(|| anyhow::anyhow!("invalid not_after timestamp"))?;

    let dns_names = cert
      .subject_alternative_name()
      .ok()
      .flatten()
      .map(|ext| {
        ext
          .value
          .general_names
          .iter()
          .filter_map(|gn| match gn {
            GeneralName::DNSName(n) => Some((*n).to_owned()),
            _ => None,
          })
          .collect()
      })
      .unwrap_or_default();

    Ok(Self {
      subject,
      issuer,
      not_before,
      not_after,
      dns_names,
      tls_version: tls_version.into(),
    })
  }
}

fn first_common_name(name: &X509Name<'_>) -> Option<String> {
  name
    .iter_common_name()
    .next()
    .and_then(|cn| cn.as_str().ok())
    .map(str::to_owned)
}
