//! Turns the user's domain list into [`DomainEntry`] values.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// How a domain's certificate-check hosts are derived when the input line
/// does not list any explicitly.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CertHostRule {
  /// Check only the name itself.
  Apex,
  /// Check only the `www.` variant.
  Www,
  /// Check the name itself, then its `www.` variant.
  #[default]
  Both,
}

impl CertHostRule {
  /// IP literals have no `www.` variant and always yield only themselves.
  #[must_use]
  pub fn derive(self, name: &str) -> Vec<String> {
    if name.parse::<IpAddr>().is_ok() {
      return vec![name.to_owned()];
    }
    let www = || {
      if name.starts_with("www.") {
        name.to_owned()
      } else {
        format!("www.{name}")
      }
    };
    match self {
      Self::Apex => vec![name.to_owned()],
      Self::Www => vec![www()],
      Self::Both => {
        let mut hosts = vec![name.to_owned()];
        let variant = www();
        if variant != name {
          hosts.push(variant);
        }
        hosts
      }
    }
  }
}

/// One line of the input list: a domain and the hosts whose certificates
/// belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
  pub name: String,
  pub cert_hosts: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostnameError {
  #[error("hostname is empty")]
  Empty,
  #[error("hostname `{0}` is longer than 253 characters")]
  TooLong(String),
  #[error("hostname `{0}` contains an empty label")]
  EmptyLabel(String),
  #[error("hostname `{0}` has a label longer than 63 characters")]
  LabelTooLong(String),
  #[error("hostname `{0}` contains invalid character `{1}`")]
  InvalidCharacter(String, char),
  #[error("hostname `{0}` has a label starting or ending with '-'")]
  Hyphen(String),
  #[error("`{0}` is an IP address, not a domain name")]
  IpAddress(String),
}

/// Lower-cases a hostname and drops a trailing root dot.
#[must_use]
pub fn normalize(host: &str) -> String {
  host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Checks that `host` is a syntactically valid DNS name.
///
/// # Errors
///
/// Returns the first rule the name violates.
pub fn validate_hostname(host: &str) -> Result<(), HostnameError> {
  if host.is_empty() {
    return Err(HostnameError::Empty);
  }
  if IpAddr::from_str(host).is_ok() {
    return Err(HostnameError::IpAddress(host.to_owned()));
  }
  if host.len() > MAX_HOSTNAME_LEN {
    return Err(HostnameError::TooLong(host.to_owned()));
  }
  for label in host.split('.') {
    if label.is_empty() {
      return Err(HostnameError::EmptyLabel(host.to_owned()));
    }
    if label.len() > MAX_LABEL_LEN {
      return Err(HostnameError::LabelTooLong(host.to_owned()));
    }
    if let Some(c) = label
      .chars()
      .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
      return Err(HostnameError::InvalidCharacter(host.to_owned(), c));
    }
    if label.starts_with('-') || label.ends_with('-') {
      return Err(HostnameError::Hyphen(host.to_owned()));
    }
  }
  Ok(())
}

/// Splits a newline-delimited domain list into entries.
///
/// Blank lines and `#` comments are skipped. A line may name its
/// certificate hosts explicitly after the domain; otherwise `rule` derives
/// them. Names are not validated here so that a bad line still shows up in
/// the report as a failed row.
#[must_use]
pub fn parse_entries(text: &str, rule: CertHostRule) -> Vec<DomainEntry> {
  text
    .replace("\r\n", "\n")
    .split('\n')
    .filter_map(|line| {
      let line = line.split_once('#').map_or(line, |(data, _)| data);
      let mut fields = line.split_whitespace().map(normalize);
      let name = fields.next().filter(|n| !n.is_empty())?;
      let explicit: Vec<String> = fields.filter(|h| !h.is_empty()).collect();
      let cert_hosts = if explicit.is_empty() {
        rule.derive(&name)
      } else {
        explicit
      };
      Some(DomainEntry { name, cert_hosts })
    })
    .collect()
}
