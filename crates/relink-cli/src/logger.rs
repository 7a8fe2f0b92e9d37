//! Logging setup for the relink CLI.
//!
//! Verbosity is resolved in this order:
//! 1. `--verbose`: debug for the relink crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for the relink crates

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "relink=debug,relink_graph=debug,relink_config=debug,relink_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "relink=info,relink_graph=info,relink_config=info,relink_cli=info";

/// Build the filter for the given flags.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    // A second initialization (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins_over_environment() {
        let filter = filter_for(true, false);
        assert!(filter.to_string().contains("relink_graph=debug"));
    }

    #[test]
    fn quiet_only_shows_errors() {
        assert!(filter_for(false, true).to_string().contains("error"));
    }

    #[test]
    fn repeated_initialization_does_not_panic() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}
