//! `tracing` subscriber setup for the binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `CAREBOARD_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "careboard=info";

/// Builds the filter from a `CAREBOARD_LOG`-style directive string.
#[must_use]
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber, writing to stderr so command output on
/// stdout stays clean. Calling it twice is a no-op.
pub fn init(json: bool) {
    let filter = filter_from(std::env::var("CAREBOARD_LOG").ok().as_deref());
    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_directives_fall_back_to_default() {
        assert_eq!(filter_from(Some("careboard=loud")).to_string(), DEFAULT_FILTER);
        assert_eq!(filter_from(None).to_string(), DEFAULT_FILTER);
        assert_eq!(filter_from(Some("careboard=debug")).to_string(), "careboard=debug");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
