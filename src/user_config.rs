use crate::{
  classify::DEFAULT_THRESHOLD_DAYS, domain::CertHostRule,
  pipeline::DEFAULT_CONCURRENCY,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

const APP_NAME: &str = "domwatch";
const FILE_NAME: Option<&str> = None;

/// Persistent defaults; every field can be overridden from the command line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UserConfig {
  /// Days below which a still-valid resource is flagged.
  pub deadline_days: u32,
  /// Lookups in flight at once during a scan.
  pub concurrency: usize,
  pub whois_timeout_secs: u64,
  pub connect_timeout_secs: u64,
  pub handshake_timeout_secs: u64,
  /// Certificate hosts checked for a domain listed on its own.
  pub cert_hosts: CertHostRule,
}

impl Default for UserConfig {
  fn default() -> Self {
    Self {
      deadline_days: DEFAULT_THRESHOLD_DAYS,
      concurrency: DEFAULT_CONCURRENCY,
      whois_timeout_secs: 15,
      connect_timeout_secs: 10,
      handshake_timeout_secs: 10,
      cert_hosts: CertHostRule::default(),
    }
  }
}

impl UserConfig {
  #[must_use]
  pub const fn whois_timeout(&self) -> Duration {
    Duration::from_secs(self.whois_timeout_secs)
  }

  #[must_use]
  pub const fn connect_timeout(&self) -> Duration {
    Duration::from_secs(self.connect_timeout_secs)
  }

  #[must_use]
  pub const fn handshake_timeout(&self) -> Duration {
    Duration::from_secs(self.handshake_timeout_secs)
  }
}

/// Read `~/.config/domwatch/default-config.toml` (or OS equivalent), or the
/// file at `path` when given. Falls back to defaults if it cannot be read.
pub fn load(path: Option<&Path>) -> UserConfig {
  let loaded = match path {
    Some(path) => confy::load_path(path),
    None => confy::load(APP_NAME, FILE_NAME),
  };
  loaded.unwrap_or_else(|e| {
    warn!("could not load configuration, using defaults: {e}");
    UserConfig::default()
  })
}
