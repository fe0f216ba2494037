use crate::whois as extractor;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use whois_rust::{WhoIs, WhoIsLookupOptions};

use super::WhoisSource;

static DEFAULT_SERVERS_JSON: &str = include_str!("../../config/servers.json");

/// Leading labels stripped at most before giving up on a sub-domain.
const MAX_FALLBACKS: usize = 10;

#[derive(Debug, Error)]
pub enum Error {
  #[error("whois operation failed: {0}")]
  WhoIs(#[from] whois_rust::WhoIsError),
  #[error("whois query for `{domain}` timed out after {}s", .after.as_secs())]
  Timeout { domain: String, after: Duration },
  #[error("whois server returned an empty response for `{0}`")]
  Empty(String),
}

/// WHOIS client backed by `whois-rust` and the bundled TLD server map.
#[derive(Clone)]
pub struct LiveWhois {
  client: WhoIs,
  timeout: Duration,
}

impl LiveWhois {
  /// # Errors
  ///
  /// Fails if the bundled server map cannot be loaded.
  pub fn new(timeout: Duration) -> Result<Self, Error> {
    Ok(Self {
      client: WhoIs::from_string(DEFAULT_SERVERS_JSON)?,
      timeout,
    })
  }

  async fn query(&self, domain: &str) -> Result<String, Error> {
    let mut opts = WhoIsLookupOptions::from_string(domain)?;
    opts.follow = 1;
    let raw = timeout(self.timeout, self.client.lookup_async(opts))
      .await
      .map_err(|_| Error::Timeout {
        domain: domain.to_owned(),
        after: self.timeout,
      })??;
    if raw.trim().is_empty() {
      return Err(Error::Empty(domain.to_owned()));
    }
    Ok(raw)
  }

  /// Fetch the WHOIS reply for `target`.
  ///
  /// When the reply for a sub-domain carries no recognisable dates, the
  /// left-most label is stripped and the parent is queried instead. The
  /// last reply obtained is returned even if it is still date-less.
  ///
  /// # Errors
  ///
  /// Returns an error if the lookup fails, times out, or comes back empty.
  pub async fn fetch_whois(&self, target: &str) -> Result<String, Error> {
    let mut domain = target.trim_end_matches('.').to_ascii_lowercase();
    let mut attempts = 0;

    loop {
      let raw = self.query(&domain).await?;
      if extractor::extract(&raw).has_dates() {
        return Ok(raw);
      }

      if attempts < MAX_FALLBACKS {
        if let Some(idx) = domain.find('.') {
          let parent = &domain[idx + 1..];
          // Never fall back to a bare TLD.
          if parent.contains('.') {
            debug!("no dates in whois for {domain}, retrying with {parent}");
            domain = parent.to_string();
            attempts += 1;
            continue;
          }
        }
      }

      return Ok(raw);
    }
  }
}

#[async_trait]
impl WhoisSource for LiveWhois {
  async fn lookup(&self, domain: &str) -> anyhow::Result<String> {
    Ok(self.fetch_whois(domain).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bundled_server_map_loads() {
    assert!(LiveWhois::new(Duration::from_secs(5)).is_ok());
  }

  #[test]
  fn test_timeout_message() {
    let err = Error::Timeout {
      domain: "example.com".into(),
      after: Duration::from_secs(15),
    };
    assert_eq!(
      err.to_string(),
      "whois query for `example.com` timed out after 15s"
    );
  }
}
