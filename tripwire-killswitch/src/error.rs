//! Killswitch error types.

use thiserror::Error;

/// Result type for killswitch operations.
pub type KillswitchResult<T> = std::result::Result<T, KillswitchError>;

/// Killswitch errors.
#[derive(Debug, Error)]
pub enum KillswitchError {
    /// The killswitch source does not exist.
    #[error("Killswitch source not found: {0}")]
    NotFound(String),

    /// I/O error while reading a source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob store backend error.
    #[error("Blob store error: {0}")]
    Store(String),

    /// A poll failed while fetching from the given locator.
    #[error("Failed to fetch killswitch data from '{locator}': {source}")]
    Fetch {
        /// Locator that was being fetched.
        locator: String,
        /// Underlying store error.
        #[source]
        source: Box<KillswitchError>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `start` was called on a poller that is already running.
    #[error("Killswitch poller already started")]
    AlreadyStarted,
}

impl KillswitchError {
    /// Wrap a store error with the locator being fetched.
    pub fn fetch(locator: impl Into<String>, source: KillswitchError) -> Self {
        Self::Fetch {
            locator: locator.into(),
            source: Box::new(source),
        }
    }

    /// Check if this is (or wraps) a not found error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::Fetch { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_through_fetch() {
        let err = KillswitchError::fetch("ks.txt", KillswitchError::NotFound("ks.txt".into()));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("ks.txt"));
    }

    #[test]
    fn test_io_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(KillswitchError::from(io).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(!KillswitchError::from(io).is_not_found());
    }

    #[test]
    fn test_store_error_is_not_not_found() {
        let err = KillswitchError::fetch("s3://bucket/ks", KillswitchError::Store("503".into()));
        assert!(!err.is_not_found());
        assert!(std::error::Error::source(&err).is_some());
    }
}
