use crate::{
  cert::CertificateInfo,
  classify::{Classification, Tier},
  report::{Counts, Report, Row},
  whois::WhoisRecord,
};
use anyhow::{Context, Result};
use console::{measure_text_width, pad_str, style, Alignment, Style};

const DOMAIN_HEADERS: [&str; 6] = [
  "#",
  "Domain",
  "WHOIS Created",
  "WHOIS Expires",
  "Days Left",
  "Error",
];
const SSL_HEADERS: [&str; 6] = [
  "#",
  "Host",
  "SSL Valid From",
  "SSL Expires",
  "Days Left",
  "Error",
];

/// Helper: coloured keys so the summary is easy to scan.
fn key(s: &str) -> console::StyledObject<&str> {
  style(s).bold().cyan()
}

/// Helper: print a section header ("🔒 SSL Certificates") once.
fn header(title: &str, emoji: &str) {
  println!(
    "\n{} {}",
    style(emoji).bold(),
    Style::new().bold().underlined().apply_to(title)
  );
}

fn tier_style(tier: Tier) -> Style {
  match tier {
    Tier::LookupFailed => Style::new().red().bold(),
    Tier::Expired => Style::new().red(),
    Tier::ExpiringSoon => Style::new().yellow(),
    Tier::Healthy => Style::new().green(),
  }
}

fn cells(row: &Row) -> [String; 6] {
  match &row.message {
    Some(message) => [
      row.index.to_string(),
      row.name.clone(),
      String::new(),
      String::new(),
      "0".to_string(),
      message.clone(),
    ],
    None => [
      row.index.to_string(),
      row.name.clone(),
      row.created_text(),
      row.expires_text(),
      row
        .classification
        .days_remaining
        .map(|d| d.to_string())
        .unwrap_or_default(),
      String::new(),
    ],
  }
}

/// Lays out `rows` as an aligned text table, one line per row.
fn render_table(headers: &[&str; 6], rows: &[Row]) -> Vec<String> {
  let body: Vec<(Tier, [String; 6])> =
    rows.iter().map(|r| (r.tier(), cells(r))).collect();

  let mut widths = headers.map(measure_text_width);
  for (_, cells) in &body {
    for (width, cell) in widths.iter_mut().zip(cells) {
      *width = (*width).max(measure_text_width(cell));
    }
  }

  let line = |cells: &[&str]| {
    cells
      .iter()
      .zip(&widths)
      .map(|(cell, width)| pad_str(cell, *width, Alignment::Left, None))
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_string()
  };

  let mut out = Vec::with_capacity(body.len() + 2);
  out.push(Style::new().bold().apply_to(line(&headers[..])).to_string());
  out.push(
    widths
      .iter()
      .map(|w| "-".repeat(*w))
      .collect::<Vec<_>>()
      .join("  "),
  );
  for (tier, cells) in &body {
    let refs = cells.each_ref().map(String::as_str);
    out.push(tier_style(*tier).apply_to(line(&refs[..])).to_string());
  }
  out
}

fn summary_line(counts: &Counts) -> String {
  format!(
    "{} total: {} ok, {} warning, {} error ({} expired, {} expiring soon)",
    counts.total,
    style(counts.success).green(),
    style(counts.warn).yellow(),
    style(counts.error).red(),
    counts.expired,
    counts.expiring_soon,
  )
}

pub fn print_report_tables(report: &Report) {
  header("Domain Registrations", "📜");
  for line in render_table(&DOMAIN_HEADERS, &report.domains) {
    println!("{line}");
  }
  println!("  {}", summary_line(&report.domain_counts));

  header("SSL Certificates", "🔒");
  for line in render_table(&SSL_HEADERS, &report.certs) {
    println!("{line}");
  }
  println!("  {}", summary_line(&report.cert_counts));
}

/// # Errors
///
/// Fails if the report cannot be serialized.
pub fn print_json(report: &Report) -> Result<()> {
  serde_json::to_string(&report.to_json())
    .map(|s| println!("{s}"))
    .context("Failed to serialize results to JSON")
}

fn print_classification(c: &Classification) {
  println!(
    "  {} {}",
    key("Status:"),
    tier_style(c.tier).apply_to(&c.message)
  );
}

fn date_or_na(date: Option<chrono::DateTime<chrono::Utc>>) -> String {
  date.map_or_else(|| "N/A".to_string(), |d| d.to_rfc2822())
}

pub fn print_whois_info(domain: &str, record: &WhoisRecord, c: &Classification) {
  header(&format!("WHOIS for {domain}"), "📜");
  println!("  {} {}", key("Created:"), date_or_na(record.creation_date));
  println!("  {} {}", key("Updated:"), date_or_na(record.updated_date));
  println!(
    "  {} {}",
    key("Expires:"),
    date_or_na(record.registry_expiry_date)
  );
  print_classification(c);
}

/// Prints the WHOIS reply exactly as the server sent it.
pub fn print_whois_original(record: &WhoisRecord) {
  println!("{}", record.original());
}

pub fn print_ssl_info(host: &str, info: &CertificateInfo, c: &Classification) {
  header(&format!("SSL Certificate for {host}"), "🔒");
  println!("  {} {}", key("Issuer:"), info.issuer);
  println!("  {} {}", key("Subject:"), info.subject);
  println!("  {} {}", key("Valid From:"), info.not_before.to_rfc2822());
  println!("  {} {}", key("Valid Until:"), info.not_after.to_rfc2822());
  let dns_names_str = if info.dns_names.is_empty() {
    "N/A".to_string()
  } else {
    info.dns_names.join(", ")
  };
  println!("  {} {}", key("DNS Names:"), dns_names_str);
  println!("  {} {}", key("TLS Version:"), info.tls_version);
  print_classification(c);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    pipeline::{AnalysisResult, DomainAnalysis},
    test_support::cert_expiring,
  };
  use chrono::{TimeZone, Utc};

  fn sample_report() -> Report {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let analyses = vec![
      DomainAnalysis {
        whois: AnalysisResult::failed("broken.example", "connection refused"),
        certs: vec![AnalysisResult::found(
          "broken.example",
          cert_expiring("broken.example", now, 40),
        )],
      },
      DomainAnalysis {
        whois: AnalysisResult::found("a-much-longer-name.example", WhoisRecord {
          creation_date: Some(now),
          registry_expiry_date: Some(now + chrono::Duration::days(7)),
          ..WhoisRecord::default()
        }),
        certs: vec![],
      },
    ];
    Report::build(&analyses, now, 15)
  }

  #[test]
  fn test_failed_rows_show_zero_days_and_message() {
    let report = sample_report();
    let failed = cells(&report.domains[0]);
    assert_eq!(failed[2], "");
    assert_eq!(failed[3], "");
    assert_eq!(failed[4], "0");
    assert_eq!(failed[5], "connection refused");

    let ok = cells(&report.domains[1]);
    assert_eq!(ok[2], "2024-06-01");
    assert_eq!(ok[3], "2024-06-08");
    assert_eq!(ok[4], "7");
    assert_eq!(ok[5], "");
  }

  #[test]
  fn test_table_has_header_rule_and_rows() {
    console::set_colors_enabled(false);
    let report = sample_report();
    let lines = render_table(&DOMAIN_HEADERS, &report.domains);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("#  Domain"));
    assert!(lines[1].starts_with("-  ------"));
    assert!(lines[2].contains("broken.example"));
    assert!(lines[3].contains("a-much-longer-name.example"));
    let domain_col = lines[0].find("WHOIS Created").unwrap();
    assert_eq!(lines[3].find("2024-06-01"), Some(domain_col));
  }
}
