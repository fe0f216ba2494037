//! In-memory WHOIS and certificate sources for unit tests.

use crate::{
  cert::CertificateInfo,
  providers::{CertificateSource, WhoisSource},
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as Days, SecondsFormat, Utc};
use std::{collections::HashMap, sync::Mutex, time::Duration};

/// WHOIS text whose registry expiry date is `expires`.
pub fn whois_text(created: DateTime<Utc>, expires: DateTime<Utc>) -> String {
  format!(
    "Domain Name: FIXTURE\nCreation Date: {}\nRegistry Expiry Date: {}\n",
    created.to_rfc3339_opts(SecondsFormat::Secs, true),
    expires.to_rfc3339_opts(SecondsFormat::Secs, true),
  )
}

/// Certificate valid from 60 days before `now` until `days` after it.
pub fn cert_expiring(host: &str, now: DateTime<Utc>, days: i64) -> CertificateInfo {
  CertificateInfo {
    subject: host.to_owned(),
    issuer: "Fixture CA".to_owned(),
    not_before: now - Days::days(60),
    not_after: now + Days::days(days),
    dns_names: vec![host.to_owned()],
    tls_version: "TLS 1.3".to_owned(),
  }
}

#[derive(Default)]
pub struct FixtureWhois {
  replies: HashMap<String, Result<String, String>>,
  delays: HashMap<String, Duration>,
  completed: Mutex<Vec<String>>,
}

impl FixtureWhois {
  pub fn reply(mut self, domain: &str, raw: impl Into<String>) -> Self {
    self.replies.insert(domain.to_owned(), Ok(raw.into()));
    self
  }

  pub fn fail(mut self, domain: &str, message: &str) -> Self {
    self.replies.insert(domain.to_owned(), Err(message.to_owned()));
    self
  }

  pub fn delay(mut self, domain: &str, delay: Duration) -> Self {
    self.delays.insert(domain.to_owned(), delay);
    self
  }

  /// Domains in the order their lookups finished.
  pub fn completed(&self) -> Vec<String> {
    self.completed.lock().unwrap().clone()
  }
}

#[async_trait]
impl WhoisSource for FixtureWhois {
  async fn lookup(&self, domain: &str) -> Result<String> {
    if let Some(delay) = self.delays.get(domain) {
      tokio::time::sleep(*delay).await;
    }
    self.completed.lock().unwrap().push(domain.to_owned());
    match self.replies.get(domain) {
      Some(Ok(raw)) => Ok(raw.clone()),
      Some(Err(message)) => Err(anyhow!(message.clone())),
      None => bail!("no whois fixture for {domain}"),
    }
  }
}

#[derive(Default)]
pub struct FixtureCerts {
  certs: HashMap<String, Result<CertificateInfo, String>>,
  delays: HashMap<String, Duration>,
}

impl FixtureCerts {
  pub fn cert(mut self, host: &str, info: CertificateInfo) -> Self {
    self.certs.insert(host.to_owned(), Ok(info));
    self
  }

  pub fn fail(mut self, host: &str, message: &str) -> Self {
    self.certs.insert(host.to_owned(), Err(message.to_owned()));
    self
  }

  pub fn delay(mut self, host: &str, delay: Duration) -> Self {
    self.delays.insert(host.to_owned(), delay);
    self
  }
}

#[async_trait]
impl CertificateSource for FixtureCerts {
  async fn fetch(&self, host: &str) -> Result<CertificateInfo> {
    if let Some(delay) = self.delays.get(host) {
      tokio::time::sleep(*delay).await;
    }
    match self.certs.get(host) {
      Some(Ok(info)) => Ok(info.clone()),
      Some(Err(message)) => Err(anyhow!(message.clone())),
      None => bail!("no certificate fixture for {host}"),
    }
  }
}
