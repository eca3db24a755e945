//! Killswitch from an environment variable.
//!
//! The variable holds a comma-separated list of feature names, e.g.
//! `TRIPWIRE_KILLSWITCH=checkout-v2,search-rerank`. Every listed feature is
//! disabled at [`UNLIMITED_LEVEL`](crate::UNLIMITED_LEVEL).

use crate::{Killswitch, KillswitchState};
use std::env;
use tracing::debug;

/// Variable read by [`EnvKillswitch::from_env`].
pub const KILLSWITCH_ENV: &str = "TRIPWIRE_KILLSWITCH";

/// Killswitch read once from a comma-separated list.
///
/// The list is captured when the killswitch is built; later changes to the
/// environment are not seen. Use a [`Poller`](crate::Poller) for runtime
/// changes.
///
/// # Examples
///
/// ```
/// use tripwire_killswitch::{EnvKillswitch, Killswitch};
///
/// let ks = EnvKillswitch::from_list("someotherfeature,checkout-v2,anotherfeature");
/// assert!(ks.is_killed("Checkout-V2"));
/// assert!(!ks.is_killed("checkout"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvKillswitch {
    state: KillswitchState,
}

impl EnvKillswitch {
    /// Read `TRIPWIRE_KILLSWITCH`.
    pub fn from_env() -> Self {
        Self::from_var(KILLSWITCH_ENV)
    }

    /// Read a named variable. Unset or non-UTF-8 means nothing is disabled.
    pub fn from_var(var: &str) -> Self {
        let list = env::var(var).unwrap_or_default();
        let ks = Self::from_list(&list);
        debug!(
            var = var,
            disabled = ks.state.len(),
            "Loaded killswitch from environment"
        );
        ks
    }

    /// Build from a comma-separated list of names.
    pub fn from_list(list: &str) -> Self {
        Self {
            state: KillswitchState::from_list(list),
        }
    }

    /// Parsed state.
    pub fn state(&self) -> &KillswitchState {
        &self.state
    }
}

impl Killswitch for EnvKillswitch {
    fn level(&self, feature: &str) -> Option<i64> {
        self.state.level(feature)
    }
}
