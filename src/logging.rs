//! Tracing setup and the explicit logging switch handed to services.
//!
//! Nothing here ever logs a PIN, a password, or a user id.

use std::fmt::Display;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Logging behaviour chosen at startup and passed down explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub verbose: bool,
}

impl LogSettings {
    /// Logs an error. The underlying detail is only included when verbose.
    pub fn error(&self, message: &str, detail: &dyn Display) {
        if self.verbose {
            tracing::error!("{}: {}", message, detail);
        } else {
            tracing::error!("{} [details hidden]", message);
        }
    }

    /// Marks a step that handles sensitive data. Emits nothing unless verbose.
    pub fn sensitive(&self, message: &str) {
        if self.verbose {
            tracing::info!("{} [sensitive data hidden]", message);
        }
    }
}

/// Default filter when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "savings_wallet_api=debug,tower_http=debug"
    } else {
        "savings_wallet_api=warn,tower_http=warn"
    }
}

/// Installs the global subscriber.
pub fn init(settings: LogSettings) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(settings.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
