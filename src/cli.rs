use crate::domain::CertHostRule;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "domwatch", version)]
#[command(
  about = "Track domain registration and TLS certificate expiry.",
  long_about = "A command-line utility that reads WHOIS records and live TLS certificates for a list of domains, classifies how close each one is to expiring, and prints a table or JSON report."
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace).
  #[arg(short, long, action = ArgAction::Count, global = true)]
  pub verbose: u8,

  /// Read settings from this file instead of the user config directory.
  #[arg(long, value_name = "PATH", global = true)]
  pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Show the TLS certificate a host presents.
  Ssl {
    /// Host to connect to on port 443.
    host: String,
  },
  /// Show the registration dates of a domain.
  Whois {
    /// Domain to look up.
    host: String,

    /// Print the WHOIS reply verbatim instead of the extracted dates.
    #[arg(short, long)]
    original: bool,
  },
  /// Check every domain listed in a file.
  Scan {
    /// Newline-delimited list of domains.
    file: PathBuf,

    /// Output results in JSON format instead of tables.
    #[arg(long)]
    json: bool,

    /// Days below which a valid registration or certificate is flagged.
    #[arg(short, long, value_name = "DAYS")]
    deadline: Option<u32>,

    /// Maximum number of lookups in flight at once.
    #[arg(
      short,
      long,
      value_name = "N",
      value_parser = clap::value_parser!(u16).range(1..)
    )]
    concurrency: Option<u16>,

    /// Certificate hosts checked for domains listed on their own.
    #[arg(long, value_enum, value_name = "RULE")]
    cert_hosts: Option<CertHostRule>,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_args(args: &[&str]) -> Vec<String> {
    std::iter::once("domwatch".to_string())
      .chain(args.iter().map(std::string::ToString::to_string))
      .collect()
  }

  #[test]
  fn test_scan_defaults() {
    let cli = Cli::try_parse_from(make_args(&["scan", "domains.txt"]))
      .expect("Should parse scan with a file");
    match cli.command {
      Command::Scan {
        file,
        json,
        deadline,
        concurrency,
        cert_hosts,
      } => {
        assert_eq!(file, PathBuf::from("domains.txt"));
        assert!(!json);
        assert!(deadline.is_none());
        assert!(concurrency.is_none());
        assert!(cert_hosts.is_none());
      }
      other => panic!("unexpected command {other:?}"),
    }
    assert_eq!(cli.verbose, 0);
  }

  #[test]
  fn test_scan_flags() {
    let cli = Cli::try_parse_from(make_args(&[
      "scan",
      "domains.txt",
      "--json",
      "-d",
      "30",
      "-c",
      "4",
      "--cert-hosts",
      "www",
    ]))
    .expect("Should parse scan flags");
    match cli.command {
      Command::Scan {
        json,
        deadline,
        concurrency,
        cert_hosts,
        ..
      } => {
        assert!(json);
        assert_eq!(deadline, Some(30));
        assert_eq!(concurrency, Some(4));
        assert_eq!(cert_hosts, Some(CertHostRule::Www));
      }
      other => panic!("unexpected command {other:?}"),
    }
  }

  #[test]
  fn test_negative_deadline_is_rejected() {
    let result =
      Cli::try_parse_from(make_args(&["scan", "domains.txt", "-d", "-5"]));
    assert!(result.is_err(), "Negative deadlines must be rejected");
  }

  #[test]
  fn test_non_numeric_deadline_is_rejected() {
    let result = Cli::try_parse_from(make_args(&[
      "scan",
      "domains.txt",
      "--deadline",
      "soon",
    ]));
    assert!(
      matches!(
        result.unwrap_err().kind(),
        clap::error::ErrorKind::ValueValidation
      ),
      "Error kind should be ValueValidation"
    );
  }

  #[test]
  fn test_zero_concurrency_is_rejected() {
    let result =
      Cli::try_parse_from(make_args(&["scan", "domains.txt", "-c", "0"]));
    assert!(result.is_err());
  }

  #[test]
  fn test_whois_original_flag() {
    let cli = Cli::try_parse_from(make_args(&["whois", "gitlab.com", "-o"]))
      .expect("Should parse whois --original");
    match cli.command {
      Command::Whois { host, original } => {
        assert_eq!(host, "gitlab.com");
        assert!(original);
      }
      other => panic!("unexpected command {other:?}"),
    }
  }

  #[test]
  fn test_ssl_command_and_global_flags() {
    let cli = Cli::try_parse_from(make_args(&[
      "ssl",
      "www.rust-lang.org",
      "-vv",
      "--config",
      "/tmp/domwatch.toml",
    ]))
    .expect("Should parse ssl with global flags");
    assert!(
      matches!(cli.command, Command::Ssl { ref host } if host == "www.rust-lang.org")
    );
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/domwatch.toml")));
  }

  #[test]
  fn test_missing_subcommand_fails() {
    let result = Cli::try_parse_from(make_args(&[]));
    assert!(
      result.is_err(),
      "Parsing should fail if no subcommand is given"
    );
  }

  #[test]
  fn test_missing_scan_file_fails() {
    let result = Cli::try_parse_from(make_args(&["scan"]));
    assert!(
      matches!(
        result.unwrap_err().kind(),
        clap::error::ErrorKind::MissingRequiredArgument
      ),
      "Error kind should be MissingRequiredArgument"
    );
  }
}
