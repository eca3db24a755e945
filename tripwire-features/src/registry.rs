//! Process-wide feature name registry.

use crate::error::{FeatureError, FeatureResult};
use dashmap::DashSet;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL: Lazy<FeatureRegistry> = Lazy::new(FeatureRegistry::new);

/// Set of registered feature names, compared case-insensitively.
///
/// Registration is safe to call from many threads at once; exactly one
/// caller wins for each name. Names are never removed.
///
/// # Examples
///
/// ```
/// use tripwire_features::*;
///
/// let registry = FeatureRegistry::new();
/// registry.register("Checkout-V2").unwrap();
///
/// assert!(registry.contains("checkout-v2"));
/// assert_eq!(
///     registry.register("checkout-v2"),
///     Err(FeatureError::DuplicateName("checkout-v2".to_string()))
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    names: Arc<DashSet<String>>,
}

impl FeatureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by features that don't name one.
    pub fn global() -> &'static FeatureRegistry {
        &GLOBAL
    }

    /// Claim a name.
    pub fn register(&self, name: &str) -> FeatureResult<()> {
        if self.names.insert(name.to_lowercase()) {
            Ok(())
        } else {
            Err(FeatureError::DuplicateName(name.to_string()))
        }
    }

    /// Whether a name has been claimed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-folded registered names, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().map(|name| name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_duplicate_is_case_insensitive() {
        let registry = FeatureRegistry::new();
        registry.register("Foo").unwrap();
        assert!(registry.register("foo").is_err());
        assert!(registry.register("FOO").is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clones_share_names() {
        let registry = FeatureRegistry::new();
        let clone = registry.clone();
        registry.register("shared").unwrap();
        assert!(clone.contains("SHARED"));
    }

    #[test]
    fn test_concurrent_registration_single_winner() {
        let registry = FeatureRegistry::new();
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    registry.register("contended").is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_names() {
        let registry = FeatureRegistry::new();
        registry.register("A").unwrap();
        registry.register("b").unwrap();

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
