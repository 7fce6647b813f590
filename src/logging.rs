//! Log output for the command line.
//!
//! Logs go to stderr so compiled definitions printed on stdout stay
//! machine readable. The level comes from `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

pub fn init(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
  let registry = tracing_subscriber::registry().with(filter);

  let result = if json {
    registry
      .with(fmt::layer().with_writer(std::io::stderr).json())
      .try_init()
  } else {
    registry
      .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
      .try_init()
  };

  if result.is_err() {
    tracing::debug!("tracing subscriber already initialized");
  }
}
