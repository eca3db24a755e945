//! Error types for feature registration.

use thiserror::Error;

/// Result type for feature operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Feature errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    /// A feature with the same case-insensitive name is already registered
    #[error("a feature with the name {0:?} already exists")]
    DuplicateName(String),
}
