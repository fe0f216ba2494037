//! Logger initialization.

use env_logger::Env;
use log::LevelFilter;

/// Initializes `env_logger` on stderr so JSON on stdout stays clean.
///
/// Without `-v` the level comes from `RUST_LOG` (default `warn`); each `-v`
/// raises this crate's level by one step and takes precedence.
pub fn init_logger(verbosity: u8) {
  let mut builder =
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"));

  if verbosity > 0 {
    let level = match verbosity {
      1 => LevelFilter::Info,
      2 => LevelFilter::Debug,
      _ => LevelFilter::Trace,
    };
    builder.filter_module("domwatch", level);
  }
  // Malformed DNS replies are retried by the resolver itself.
  builder.filter_module("hickory_proto", LevelFilter::Error);
  builder.format_timestamp_millis();

  // env_logger can only be initialized once per process
  let _ = builder.try_init();
}
