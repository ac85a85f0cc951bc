//! Tracing subscriber setup.

use crate::config::SimConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber.
///
/// Logs go to stderr so stdout stays clean for `--json` reports.
/// `RUST_LOG` wins over `config.log_level`. Returns `false` when a subscriber
/// was already installed, which is normal when several tests set up logging.
pub fn init_tracing(config: &SimConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
