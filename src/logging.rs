//! Diagnostic logging setup.
//!
//! Logs go to stderr so `--json` output on stdout stays parseable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable with a filter directive, e.g. `PCRM_LOG=pcrm=debug`
pub const ENV_LOG: &str = "PCRM_LOG";

/// Default filter for a `-v` count when no environment override is set
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "pcrm=info,warn",
        _ => "pcrm=debug,info",
    }
}

/// Install the global subscriber. `PCRM_LOG`, then `RUST_LOG`, override the
/// verbosity flag.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbosity in 0..=3 {
            assert!(EnvFilter::try_new(default_directive(verbosity)).is_ok());
        }
    }
}
