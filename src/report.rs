//! Classifies analyzed lookups into report rows and counts them.
//!
//! Counting happens once, here, so the table and JSON renderings always
//! agree.

use crate::{
  classify::{classify, Classification, Tier},
  pipeline::DomainAnalysis,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d";
const MISSING_EXPIRY: &str = "no expiry date found in WHOIS response";

/// One classified line of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
  /// 1-based position within its table.
  pub index: usize,
  pub name: String,
  pub created: Option<DateTime<Utc>>,
  pub expires: Option<DateTime<Utc>>,
  pub classification: Classification,
  /// Why the row could not be classified. Set exactly when the tier is
  /// [`Tier::LookupFailed`].
  pub message: Option<String>,
}

impl Row {
  fn new(
    index: usize,
    name: &str,
    dates: Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), &str>,
    now: DateTime<Utc>,
    deadline: u32,
  ) -> Self {
    let (created, expires, reason) = match dates {
      Ok((created, Some(expires))) => (created, Some(expires), None),
      Ok((created, None)) => (created, None, Some(MISSING_EXPIRY)),
      Err(reason) => (None, None, Some(reason)),
    };
    let classification = classify(expires, now, deadline, reason);
    let message = (classification.tier == Tier::LookupFailed).then(|| {
      reason.map_or_else(|| classification.message.clone(), str::to_owned)
    });
    Self {
      index,
      name: name.to_owned(),
      created,
      expires,
      classification,
      message,
    }
  }

  #[must_use]
  pub const fn tier(&self) -> Tier {
    self.classification.tier
  }

  #[must_use]
  pub fn created_text(&self) -> String {
    format_date(self.created)
  }

  #[must_use]
  pub fn expires_text(&self) -> String {
    format_date(self.expires)
  }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
  date
    .map(|d| d.format(DATE_FORMAT).to_string())
    .unwrap_or_default()
}

/// Where a row lands in the Error / Warn / Success summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
  Error,
  Warn,
  Success,
}

impl Summary {
  /// Failed rows are errors; any row with at most `deadline` days left
  /// is a warning, including rows exactly on the threshold.
  #[must_use]
  pub fn of(row: &Row, deadline: u32) -> Self {
    match (&row.message, row.classification.days_remaining) {
      (None, Some(days)) if days > i64::from(deadline) => Self::Success,
      (None, Some(_)) => Self::Warn,
      _ => Self::Error,
    }
  }
}

/// Row counts for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
  pub total: usize,
  pub error: usize,
  pub warn: usize,
  pub success: usize,
  pub lookup_failed: usize,
  pub expired: usize,
  pub expiring_soon: usize,
  pub healthy: usize,
}

impl Counts {
  fn record(&mut self, row: &Row, deadline: u32) {
    self.total += 1;
    match Summary::of(row, deadline) {
      Summary::Error => self.error += 1,
      Summary::Warn => self.warn += 1,
      Summary::Success => self.success += 1,
    }
    match row.tier() {
      Tier::LookupFailed => self.lookup_failed += 1,
      Tier::Expired => self.expired += 1,
      Tier::ExpiringSoon => self.expiring_soon += 1,
      Tier::Healthy => self.healthy += 1,
    }
  }

  fn tally(rows: &[Row], deadline: u32) -> Self {
    let mut counts = Self::default();
    for row in rows {
      counts.record(row, deadline);
    }
    counts
  }
}

/// Classified rows of one scan, all evaluated against the same `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
  pub now: DateTime<Utc>,
  pub deadline: u32,
  pub domains: Vec<Row>,
  pub certs: Vec<Row>,
  pub domain_counts: Counts,
  pub cert_counts: Counts,
}

impl Report {
  #[must_use]
  pub fn build(
    analyses: &[DomainAnalysis],
    now: DateTime<Utc>,
    deadline: u32,
  ) -> Self {
    let domains: Vec<Row> = analyses
      .iter()
      .enumerate()
      .map(|(i, analysis)| {
        let whois = &analysis.whois;
        let dates = whois.data().map_or_else(
          || Err(whois.failure_message().unwrap_or_default()),
          |record| Ok((record.creation_date, record.registry_expiry_date)),
        );
        Row::new(i + 1, &whois.name, dates, now, deadline)
      })
      .collect();

    let certs: Vec<Row> = analyses
      .iter()
      .flat_map(|analysis| &analysis.certs)
      .enumerate()
      .map(|(i, cert)| {
        let dates = cert.data().map_or_else(
          || Err(cert.failure_message().unwrap_or_default()),
          |info| Ok((Some(info.not_before), Some(info.not_after))),
        );
        Row::new(i + 1, &cert.name, dates, now, deadline)
      })
      .collect();

    Self {
      now,
      deadline,
      domain_counts: Counts::tally(&domains, deadline),
      cert_counts: Counts::tally(&certs, deadline),
      domains,
      certs,
    }
  }

  /// The flat, string-valued JSON shape consumed by dashboards.
  #[must_use]
  pub fn to_json(&self) -> JsonReport {
    JsonReport {
      ssl: self.certs.iter().map(JsonRow::from).collect(),
      domain: self.domains.iter().map(JsonRow::from).collect(),
      domain_total: self.domain_counts.total,
      domain_error: self.domain_counts.error,
      domain_warn: self.domain_counts.warn,
      domain_success: self.domain_counts.success,
      ssl_total: self.cert_counts.total,
      ssl_error: self.cert_counts.error,
      ssl_warn: self.cert_counts.warn,
      ssl_success: self.cert_counts.success,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonRow {
  pub index: String,
  pub name: String,
  pub create_time: String,
  pub expiry_time: String,
  pub available_days: String,
  pub message: String,
}

impl From<&Row> for JsonRow {
  fn from(row: &Row) -> Self {
    let (create_time, expiry_time, available_days) = match &row.message {
      Some(_) => (String::new(), String::new(), String::new()),
      None => (
        row.created_text(),
        row.expires_text(),
        row
          .classification
          .days_remaining
          .map(|d| d.to_string())
          .unwrap_or_default(),
      ),
    };
    Self {
      index: row.index.to_string(),
      name: row.name.clone(),
      create_time,
      expiry_time,
      available_days,
      message: row.message.clone().unwrap_or_default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonReport {
  #[serde(rename = "SSL")]
  pub ssl: Vec<JsonRow>,
  #[serde(rename = "Domain")]
  pub domain: Vec<JsonRow>,
  #[serde(rename = "DomainTotal")]
  pub domain_total: usize,
  #[serde(rename = "DomainError")]
  pub domain_error: usize,
  #[serde(rename = "DomainWarn")]
  pub domain_warn: usize,
  #[serde(rename = "DomainSuccess")]
  pub domain_success: usize,
  #[serde(rename = "SSLTotal")]
  pub ssl_total: usize,
  #[serde(rename = "SSLError")]
  pub ssl_error: usize,
  #[serde(rename = "SSLWarn")]
  pub ssl_warn: usize,
  #[serde(rename = "SSLSuccess")]
  pub ssl_success: usize,
}
