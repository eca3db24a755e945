//! Evaluation context
//!
//! A [`Context`] carries everything a feature needs to decide: string values
//! for matchers, test/operator overrides, an optional killswitch and an
//! optional observer. It is immutable; every `with_*` call returns a new
//! context whose values shadow the ones it was built from, so a
//! process-wide base context can be extended per request without copying.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tripwire_killswitch::{Killswitch, fold_name};

use crate::Feature;

/// Callback invoked with every feature decision.
pub type ObserverFn = Arc<dyn Fn(&Context, &str, bool) + Send + Sync>;

/// Case-insensitive name of a context value.
///
/// # Examples
///
/// ```
/// use tripwire_features::Key;
///
/// assert_eq!(Key::new("CustomerID"), Key::new("customerid"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Create a key; the name is case-folded.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    /// Case-folded key name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent singly-linked list of `(name, value)` layers.
///
/// Pushing shares the existing chain; lookups walk from the newest layer.
struct Layer<T> {
    name: String,
    value: T,
    parent: Option<Arc<Layer<T>>>,
}

struct Layers<T> {
    head: Option<Arc<Layer<T>>>,
}

impl<T> Layers<T> {
    fn push(&self, name: String, value: T) -> Self {
        Self {
            head: Some(Arc::new(Layer {
                name,
                value,
                parent: self.head.clone(),
            })),
        }
    }

    fn get(&self, name: &str) -> Option<&T> {
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            if current.name == name {
                return Some(&current.value);
            }
            layer = current.parent.as_deref();
        }
        None
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_deref();
        }
        depth
    }
}

impl<T> Drop for Layer<T> {
    // Unlink iteratively; recursive drops of a long chain overflow the stack.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(layer) = parent {
            parent = match Arc::into_inner(layer) {
                Some(mut layer) => layer.parent.take(),
                None => break,
            };
        }
    }
}

impl<T> Clone for Layers<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

impl<T> Default for Layers<T> {
    fn default() -> Self {
        Self { head: None }
    }
}

/// Immutable, layered evaluation context.
///
/// # Examples
///
/// ```
/// use tripwire_features::*;
///
/// // Values that live for the life of the service
/// let base = Context::new().with_value("region", "westus");
///
/// // Values scoped to one request
/// let request = base.clone().with_value("customerID", "cust-42");
///
/// assert_eq!(request.value("Region"), Some("westus"));
/// assert_eq!(request.value("customerid"), Some("cust-42"));
/// assert_eq!(base.value("customerid"), None);
/// ```
#[derive(Clone, Default)]
pub struct Context {
    values: Layers<String>,
    overrides: Layers<bool>,
    global_override: Option<bool>,
    observer: Option<ObserverFn>,
    killswitch: Option<Arc<dyn Killswitch>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string value for matchers. Keys are case-insensitive.
    pub fn with_value(mut self, key: impl Into<Key>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.values = self.values.push(key.0, value.into());
        self
    }

    /// Innermost value for a key.
    pub fn value(&self, key: impl Into<Key>) -> Option<&str> {
        self.values.get(key.into().as_str()).map(String::as_str)
    }

    /// Value for a key, or the empty string if it was never set.
    pub fn lookup(&self, key: &Key) -> &str {
        self.values
            .get(key.as_str())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Force a feature to be enabled or disabled. Useful in tests.
    pub fn with_override(self, feature: &Feature, enabled: bool) -> Self {
        self.with_named_override(feature.name(), enabled)
    }

    /// Force a feature, by name, to be enabled or disabled.
    pub fn with_named_override(mut self, feature: &str, enabled: bool) -> Self {
        self.overrides = self.overrides.push(feature.to_lowercase(), enabled);
        self
    }

    /// Force-enable every feature in a comma-separated list.
    ///
    /// `prefix` is stripped from each item first, so a list like
    /// `"feat-a,feat-b"` with prefix `"feat-"` enables `a` and `b`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire_features::Context;
    ///
    /// let ctx = Context::new().with_override_string("ff_", "ff_search, ff_Checkout,");
    /// assert_eq!(ctx.override_for("search"), Some(true));
    /// assert_eq!(ctx.override_for("checkout"), Some(true));
    /// assert_eq!(ctx.override_for(""), None);
    /// ```
    pub fn with_override_string(mut self, prefix: &str, list: &str) -> Self {
        for chunk in list.split(',') {
            let chunk = chunk.trim();
            let name = chunk.strip_prefix(prefix).unwrap_or(chunk);
            if name.is_empty() {
                continue;
            }
            self = self.with_named_override(name, true);
        }
        self
    }

    /// Override set for a feature, if any.
    pub fn override_for(&self, feature: &str) -> Option<bool> {
        self.overrides.get(&fold_name(feature)).copied()
    }

    /// Force every feature to be enabled or disabled. Useful in tests.
    pub fn with_global_override(mut self, enabled: bool) -> Self {
        self.global_override = Some(enabled);
        self
    }

    /// Global override, if any.
    pub fn global_override(&self) -> Option<bool> {
        self.global_override
    }

    /// Register a function called every time a feature is evaluated.
    ///
    /// Useful for logging feature states.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Context, &str, bool) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Observer, if any.
    pub fn observer(&self) -> Option<&ObserverFn> {
        self.observer.as_ref()
    }

    /// Attach a killswitch consulted by every feature evaluation.
    pub fn with_killswitch<K>(mut self, killswitch: K) -> Self
    where
        K: Killswitch + 'static,
    {
        self.killswitch = Some(Arc::new(killswitch));
        self
    }

    /// Attached killswitch, if any.
    pub fn killswitch(&self) -> Option<&dyn Killswitch> {
        self.killswitch.as_deref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.depth())
            .field("overrides", &self.overrides.depth())
            .field("global_override", &self.global_override)
            .field("observer", &self.observer.is_some())
            .field("killswitch", &self.killswitch.is_some())
            .finish()
    }
}
