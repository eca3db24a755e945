//! Tracing subscriber setup.
//!
//! Library crates only emit `tracing` events. Binaries that want them
//! printed call [`init`] once at startup, or compose [`subscriber`] into
//! their own setup.
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Full filter directive; wins over everything else |
//! | `TRIPWIRE_LOG_LEVEL` | Default level when `RUST_LOG` is unset (`info`) |
//! | `TRIPWIRE_LOG_FORMAT` | `json`, `pretty` or `compact` (default) |

use std::env;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable holding the default level.
pub const LEVEL_ENV: &str = "TRIPWIRE_LOG_LEVEL";

/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "TRIPWIRE_LOG_FORMAT";

const DEFAULT_LEVEL: &str = "info";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One JSON object per line
    Json,
    /// Multi-line, human-oriented
    Pretty,
    /// Single line per event
    #[default]
    Compact,
}

impl Format {
    /// Parse a format name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    /// Format from `TRIPWIRE_LOG_FORMAT`, or the default.
    pub fn from_env() -> Self {
        env::var(FORMAT_ENV)
            .ok()
            .and_then(|s| Self::parse(&s))
            .unwrap_or_default()
    }
}

/// Filter from `RUST_LOG`, falling back to `TRIPWIRE_LOG_LEVEL`.
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::var(LEVEL_ENV).unwrap_or_else(|_| DEFAULT_LEVEL.to_string());
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    })
}

/// Subscriber configured from the environment.
pub fn subscriber() -> Box<dyn tracing::Subscriber + Send + Sync> {
    let registry = tracing_subscriber::registry().with(filter());

    match Format::from_env() {
        Format::Json => Box::new(
            registry.with(tracing_subscriber::fmt::layer().json().flatten_event(true)),
        ),
        Format::Pretty => Box::new(registry.with(tracing_subscriber::fmt::layer().pretty())),
        Format::Compact => Box::new(registry.with(tracing_subscriber::fmt::layer().compact())),
    }
}

/// Install [`subscriber`] as the global default.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    tracing::subscriber::set_global_default(subscriber()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::parse("json"), Some(Format::Json));
        assert_eq!(Format::parse("PRETTY"), Some(Format::Pretty));
        assert_eq!(Format::parse(" compact "), Some(Format::Compact));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn test_default_format() {
        assert_eq!(Format::default(), Format::Compact);
    }

    #[test]
    fn test_subscriber_builds() {
        let subscriber = subscriber();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(feature = "checkout-v2", "Feature evaluated");
        });
    }

    #[test]
    fn test_init_twice() {
        init();
        assert!(!init());
    }
}
