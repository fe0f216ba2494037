#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

use anyhow::Result;

// Declare library modules
mod app;
pub mod cert;
pub mod classify;
mod cli;
pub mod domain;
mod logger;
pub mod pipeline;
pub mod providers;
pub mod report;
mod results;
mod steps;
#[cfg(test)]
mod test_support;
mod user_config;
pub mod whois;

/// Runs the main application logic.
///
/// This function parses command-line arguments, loads the user configuration,
/// runs the requested subcommand (single SSL or WHOIS lookup, or a batch
/// scan), and prints the results.
///
/// # Errors
///
/// Returns an error if the domain list cannot be read, a transport cannot
/// be initialised, a single lookup fails, or the report cannot be rendered.
/// Individual failures inside a batch scan are reported as rows instead.
pub async fn run() -> Result<()> {
  let app = app::App::new();
  app.run().await
}
