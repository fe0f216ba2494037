use crate::{
  classify::classify,
  cli::{Cli, Command},
  domain::{normalize, parse_entries, validate_hostname, CertHostRule},
  logger,
  pipeline::Analyzer,
  providers::{ssl::LiveCertificates, whois::LiveWhois},
  report::Report,
  results,
  user_config::{self, UserConfig},
  whois,
};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::{path::Path, sync::Arc};

const PROGRESS_TEMPLATE: &str =
  "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}";

/// Options of one `scan` invocation after merging flags over config.
struct ScanOptions<'a> {
  file: &'a Path,
  json: bool,
  deadline: u32,
  concurrency: usize,
  cert_hosts: CertHostRule,
}

pub struct App {
  cli: Cli,
  config: UserConfig,
}

impl App {
  pub fn new() -> Self {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);
    let config = user_config::load(cli.config.as_deref());
    Self { cli, config }
  }

  pub async fn run(&self) -> Result<()> {
    match &self.cli.command {
      Command::Ssl { host } => self.run_ssl_lookup(host).await,
      Command::Whois { host, original } => {
        self.run_whois_lookup(host, *original).await
      }
      Command::Scan {
        file,
        json,
        deadline,
        concurrency,
        cert_hosts,
      } => {
        let opts = ScanOptions {
          file,
          json: *json,
          deadline: deadline.unwrap_or(self.config.deadline_days),
          concurrency: concurrency
            .map_or(self.config.concurrency, usize::from),
          cert_hosts: cert_hosts.unwrap_or(self.config.cert_hosts),
        };
        self.run_scan(&opts).await
      }
    }
  }

  fn certificate_source(&self) -> Result<LiveCertificates> {
    LiveCertificates::new(
      self.config.connect_timeout(),
      self.config.handshake_timeout(),
    )
  }

  fn whois_source(&self) -> Result<LiveWhois> {
    LiveWhois::new(self.config.whois_timeout())
      .context("loading WHOIS server list")
  }

  async fn run_ssl_lookup(&self, host: &str) -> Result<()> {
    let host = normalize(host);
    let info = self
      .certificate_source()?
      .fetch_certificate(&host)
      .await
      .with_context(|| format!("SSL check for `{host}` failed"))?;
    let status = classify(
      Some(info.not_after),
      Utc::now(),
      self.config.deadline_days,
      None,
    );
    results::print_ssl_info(&host, &info, &status);
    Ok(())
  }

  async fn run_whois_lookup(&self, host: &str, original: bool) -> Result<()> {
    let host = normalize(host);
    validate_hostname(&host)?;
    let raw = self
      .whois_source()?
      .fetch_whois(&host)
      .await
      .with_context(|| format!("WHOIS lookup for `{host}` failed"))?;
    let record = whois::extract(&raw);
    if original {
      results::print_whois_original(&record);
    } else {
      let status = classify(
        record.registry_expiry_date,
        Utc::now(),
        self.config.deadline_days,
        None,
      );
      results::print_whois_info(&host, &record, &status);
    }
    Ok(())
  }

  async fn run_scan(&self, opts: &ScanOptions<'_>) -> Result<()> {
    let text = tokio::fs::read_to_string(opts.file)
      .await
      .with_context(|| {
        format!("Failed to read domain list {}", opts.file.display())
      })?;
    let entries = parse_entries(&text, opts.cert_hosts);
    if entries.is_empty() {
      warn!("{} contains no domains", opts.file.display());
    }

    let analyzer = Analyzer::new(
      Arc::new(self.whois_source()?),
      Arc::new(self.certificate_source()?),
    )
    .with_concurrency(opts.concurrency);

    let lookups: usize = entries.iter().map(|e| 1 + e.cert_hosts.len()).sum();
    let progress = if opts.json {
      ProgressBar::hidden()
    } else {
      println!(
        "{}",
        style(format!("Scanning {} domains...", entries.len())).green()
      );
      ProgressBar::new(lookups as u64).with_style(
        ProgressStyle::with_template(PROGRESS_TEMPLATE)
          .context("Invalid progress bar template")?
          .progress_chars("=> "),
      )
    };
    let on_progress = |done: usize, _total: usize, name: &str| {
      progress.set_position(done as u64);
      progress.set_message(name.to_owned());
    };

    let now = Utc::now();
    let analyses = analyzer.analyze(&entries, Some(&on_progress)).await;
    progress.finish_and_clear();

    let report = Report::build(&analyses, now, opts.deadline);
    info!(
      "domains: {} error / {} warn / {} ok, certificates: {} error / {} warn / {} ok",
      report.domain_counts.error,
      report.domain_counts.warn,
      report.domain_counts.success,
      report.cert_counts.error,
      report.cert_counts.warn,
      report.cert_counts.success,
    );

    if opts.json {
      results::print_json(&report)
    } else {
      results::print_report_tables(&report);
      Ok(())
    }
  }
}
