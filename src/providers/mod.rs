//! Network collaborators of the analysis engine.
//!
//! The engine only sees the [`WhoisSource`] and [`CertificateSource`]
//! traits; the live implementations here talk to WHOIS servers and TLS
//! endpoints, while tests plug in fixtures.

pub mod ssl;
pub mod whois;

use crate::cert::CertificateInfo;
use anyhow::Result;
use async_trait::async_trait;

/// Produces the raw WHOIS reply for a domain.
#[async_trait]
pub trait WhoisSource: Send + Sync {
  async fn lookup(&self, domain: &str) -> Result<String>;
}

/// Produces the leaf certificate a host presents on port 443.
#[async_trait]
pub trait CertificateSource: Send + Sync {
  async fn fetch(&self, host: &str) -> Result<CertificateInfo>;
}
