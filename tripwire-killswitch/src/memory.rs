//! In-process killswitch.

use crate::{Killswitch, UNLIMITED_LEVEL, fold_name};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Killswitch held entirely in memory.
///
/// Useful in tests and for operator tooling that decides kills in-process.
///
/// # Examples
///
/// ```
/// use tripwire_killswitch::{Killswitch, MemoryKillswitch};
///
/// let ks = MemoryKillswitch::new();
/// ks.kill("checkout-v2");
/// assert!(ks.is_killed("Checkout-V2"));
///
/// ks.revive("checkout-v2");
/// assert!(!ks.is_killed("checkout-v2"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryKillswitch {
    state: RwLock<HashMap<String, i64>>,
}

impl MemoryKillswitch {
    /// Create a killswitch with nothing disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable a feature so that no override level can re-enable it.
    pub fn kill(&self, feature: &str) {
        self.kill_at_level(feature, UNLIMITED_LEVEL);
    }

    /// Disable a feature unless its override level exceeds `level`.
    pub fn kill_at_level(&self, feature: &str, level: i64) {
        let name = fold_name(feature).into_owned();
        self.state.write().insert(name, level);
    }

    /// Re-enable a feature.
    pub fn revive(&self, feature: &str) {
        let name = fold_name(feature);
        self.state.write().remove(&*name);
    }

    /// Re-enable every feature.
    pub fn clear(&self) {
        self.state.write().clear();
    }
}

impl Killswitch for MemoryKillswitch {
    fn level(&self, feature: &str) -> Option<i64> {
        let name = fold_name(feature);
        self.state.read().get(&*name).copied()
    }
}
