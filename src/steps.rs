use crate::{
  cert::CertificateInfo,
  domain::validate_hostname,
  pipeline::AnalysisResult,
  providers::{CertificateSource, WhoisSource},
  whois::{self, WhoisRecord},
};
use log::{debug, warn};
use std::net::IpAddr;

/// Looks up and parses WHOIS for one domain.
///
/// Never fails: every error ends up as the result's failure message.
pub async fn whois_step(
  source: &dyn WhoisSource,
  domain: &str,
) -> AnalysisResult<WhoisRecord> {
  if let Err(e) = validate_hostname(domain) {
    debug!("skipping WHOIS for {domain}: {e}");
    return AnalysisResult::failed(domain, e.to_string());
  }
  match source.lookup(domain).await {
    Ok(raw) => AnalysisResult::found(domain, whois::extract(&raw)),
    Err(e) => {
      warn!("WHOIS lookup failed for {domain}: {e:#}");
      AnalysisResult::failed(domain, format!("WHOIS lookup failed: {e:#}"))
    }
  }
}

/// Fetches the certificate one host presents. IP literals are accepted.
///
/// Never fails: every error ends up as the result's failure message.
pub async fn cert_step(
  source: &dyn CertificateSource,
  host: &str,
) -> AnalysisResult<CertificateInfo> {
  if host.parse::<IpAddr>().is_err() {
    if let Err(e) = validate_hostname(host) {
      debug!("skipping certificate check for {host}: {e}");
      return AnalysisResult::failed(host, e.to_string());
    }
  }
  match source.fetch(host).await {
    Ok(info) => AnalysisResult::found(host, info),
    Err(e) => {
      warn!("certificate check failed for {host}: {e:#}");
      AnalysisResult::failed(host, format!("SSL check failed: {e:#}"))
    }
  }
}
