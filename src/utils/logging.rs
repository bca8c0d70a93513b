//! tracing setup

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "vidgrab=warn";
const VERBOSE_FILTER: &str = "vidgrab=debug";

/// Install the global subscriber; `RUST_LOG` wins over `verbose`
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
