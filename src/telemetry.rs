//! Logging setup.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default directive when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "listview=info,listview_core=info";

/// Install the global `fmt` subscriber. `RUST_LOG` wins over
/// `default_filter`. Fails if a subscriber is already installed.
pub fn init_logging(default_filter: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // the first call may lose to another test's subscriber, the second never wins
        let _ = init_logging(DEFAULT_LOG_FILTER);
        assert!(init_logging(DEFAULT_LOG_FILTER).is_err());
    }
}
