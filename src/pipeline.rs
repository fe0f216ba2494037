//! Runs every WHOIS and certificate lookup of a batch concurrently.
//!
//! Lookups are independent jobs. Each job knows the slot its result belongs
//! to, so results land at their input position no matter in which order
//! the jobs finish, and one failing job never disturbs another.

use crate::{
  cert::CertificateInfo,
  domain::DomainEntry,
  providers::{CertificateSource, WhoisSource},
  steps,
  whois::WhoisRecord,
};
use futures::stream::{self, StreamExt};
use log::{debug, info};
use std::{sync::Arc, time::Instant};

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Called after each finished lookup with `(completed, total, name)`.
pub type ProgressCallback<'a> = &'a (dyn Fn(usize, usize, &str) + Send + Sync);

/// Outcome of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
  Found(T),
  Failed(String),
}

/// One lookup's result: either parsed data or a human-readable cause,
/// never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult<T> {
  pub name: String,
  pub outcome: Lookup<T>,
}

impl<T> AnalysisResult<T> {
  pub fn found(name: impl Into<String>, data: T) -> Self {
    Self {
      name: name.into(),
      outcome: Lookup::Found(data),
    }
  }

  pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      outcome: Lookup::Failed(message.into()),
    }
  }

  #[must_use]
  pub const fn data(&self) -> Option<&T> {
    match &self.outcome {
      Lookup::Found(data) => Some(data),
      Lookup::Failed(_) => None,
    }
  }

  #[must_use]
  pub fn failure_message(&self) -> Option<&str> {
    match &self.outcome {
      Lookup::Found(_) => None,
      Lookup::Failed(message) => Some(message),
    }
  }
}

pub type WhoisResult = AnalysisResult<WhoisRecord>;
pub type CertResult = AnalysisResult<CertificateInfo>;

/// Everything learned about one input entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAnalysis {
  pub whois: WhoisResult,
  /// One result per certificate host, in the entry's order.
  pub certs: Vec<CertResult>,
}

enum Job<'e> {
  Whois {
    entry: usize,
    domain: &'e str,
  },
  Cert {
    entry: usize,
    child: usize,
    host: &'e str,
  },
}

enum Done {
  Whois(usize, WhoisResult),
  Cert(usize, usize, CertResult),
}

impl Done {
  fn name(&self) -> &str {
    match self {
      Self::Whois(_, r) => &r.name,
      Self::Cert(_, _, r) => &r.name,
    }
  }
}

/// Batch analyzer over pluggable WHOIS and certificate sources.
#[derive(Clone)]
pub struct Analyzer {
  whois: Arc<dyn WhoisSource>,
  certs: Arc<dyn CertificateSource>,
  concurrency: usize,
}

impl Analyzer {
  pub fn new(
    whois: Arc<dyn WhoisSource>,
    certs: Arc<dyn CertificateSource>,
  ) -> Self {
    Self {
      whois,
      certs,
      concurrency: DEFAULT_CONCURRENCY,
    }
  }

  /// Maximum number of lookups in flight at once (at least 1).
  #[must_use]
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency.max(1);
    self
  }

  async fn run(&self, job: Job<'_>) -> Done {
    match job {
      Job::Whois { entry, domain } => {
        Done::Whois(entry, steps::whois_step(self.whois.as_ref(), domain).await)
      }
      Job::Cert { entry, child, host } => Done::Cert(
        entry,
        child,
        steps::cert_step(self.certs.as_ref(), host).await,
      ),
    }
  }

  /// Analyzes every entry, returning one [`DomainAnalysis`] per entry in
  /// input order.
  ///
  /// A WHOIS failure does not skip the entry's certificate checks, and no
  /// failure affects any other entry. The batch always runs to completion.
  pub async fn analyze(
    &self,
    entries: &[DomainEntry],
    progress: Option<ProgressCallback<'_>>,
  ) -> Vec<DomainAnalysis> {
    let jobs: Vec<Job<'_>> = entries
      .iter()
      .enumerate()
      .flat_map(|(entry, e)| {
        std::iter::once(Job::Whois {
          entry,
          domain: &e.name,
        })
        .chain(e.cert_hosts.iter().enumerate().map(move |(child, host)| {
          Job::Cert { entry, child, host }
        }))
      })
      .collect();
    let total = jobs.len();
    let started = Instant::now();
    info!(
      "analyzing {} domains ({total} lookups, concurrency {})",
      entries.len(),
      self.concurrency
    );

    let mut whois_slots: Vec<Option<WhoisResult>> =
      entries.iter().map(|_| None).collect();
    let mut cert_slots: Vec<Vec<Option<CertResult>>> = entries
      .iter()
      .map(|e| e.cert_hosts.iter().map(|_| None).collect())
      .collect();

    let mut finished = stream::iter(jobs)
      .map(|job| self.run(job))
      .buffer_unordered(self.concurrency);
    let mut completed = 0;
    while let Some(done) = finished.next().await {
      completed += 1;
      debug!("lookup {completed}/{total} finished: {}", done.name());
      if let Some(progress) = progress {
        progress(completed, total, done.name());
      }
      match done {
        Done::Whois(entry, result) => whois_slots[entry] = Some(result),
        Done::Cert(entry, child, result) => {
          cert_slots[entry][child] = Some(result);
        }
      }
    }

    info!(
      "finished {total} lookups in {:.2}s",
      started.elapsed().as_secs_f64()
    );

    entries
      .iter()
      .zip(whois_slots)
      .zip(cert_slots)
      .map(|((entry, whois), certs)| DomainAnalysis {
        whois: whois.unwrap_or_else(|| {
          AnalysisResult::failed(&entry.name, "lookup did not complete")
        }),
        certs: entry
          .cert_hosts
          .iter()
          .zip(certs)
          .map(|(host, cert)| {
            cert.unwrap_or_else(|| {
              AnalysisResult::failed(host, "lookup did not complete")
            })
          })
          .collect(),
      })
      .collect()
  }
}
