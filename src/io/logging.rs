use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "WORKLY_LOG";

/// Install the global subscriber. Logs go to stderr so that stdout stays
/// clean for `--json` output. `verbose` raises the default level to debug.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "workly=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
