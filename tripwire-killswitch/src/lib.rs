//! Killswitches for tripwire features
//!
//! A killswitch forces features off at runtime, without a deploy, by
//! publishing their names to an external source that every instance polls.
//!
//! # Features
//!
//! - **Pluggable sources** - local files or any [`BlobStore`] (S3, Azure, GCS, HTTP)
//! - **Environment** - a fixed comma-separated list in `TRIPWIRE_KILLSWITCH`
//! - **Override levels** - `name=N` records can be bypassed by features configured above `N`
//! - **Stale-but-available** - a failed poll never erases the last good state
//! - **Jittered polling** - avoids synchronized refresh storms across a fleet
//! - **Change detection** - every state carries a SHA-256 fingerprint of its source
//!
//! # Source Format
//!
//! ```text
//! checkout-v2
//! search-rerank=1
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tripwire_killswitch::*;
//!
//! # async fn example() -> KillswitchResult<()> {
//! let poller = Poller::file("/etc/tripwire/killswitch", Duration::from_secs(10))?;
//!
//! // Blocks until the first poll has completed
//! let shutdown = CancellationToken::new();
//! let handle = poller.start(shutdown.clone()).await?;
//!
//! if poller.is_killed("checkout-v2") {
//!     // fall back to the old checkout
//! }
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # In-Memory Killswitch
//!
//! ```
//! use tripwire_killswitch::*;
//!
//! let ks = MemoryKillswitch::new();
//! ks.kill_at_level("search-rerank", 1);
//! assert_eq!(ks.level("search-rerank"), Some(1));
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod memory;
mod metrics;
pub mod poller;
pub mod state;
pub mod store;

pub use config::{Jitter, KillswitchConfig};
pub use env::{EnvKillswitch, KILLSWITCH_ENV};
pub use error::{KillswitchError, KillswitchResult};
pub use memory::MemoryKillswitch;
pub use poller::{ErrorHandler, PollOutcome, Poller, PollerBuilder, PollerHandle};
pub use state::{KillswitchState, UNLIMITED_LEVEL, fold_name};
pub use store::{BlobStore, BlobStoreFn, FileStore};

/// Source of forced-disable decisions for features.
///
/// Lookups are synchronous and must be cheap: they sit on every feature
/// evaluation.
pub trait Killswitch: Send + Sync {
    /// Stored level for a disabled feature, or `None` if it is not disabled.
    ///
    /// A record without an explicit level reports [`UNLIMITED_LEVEL`].
    fn level(&self, feature: &str) -> Option<i64>;

    /// Whether the feature appears in the killswitch at all.
    fn is_killed(&self, feature: &str) -> bool {
        self.level(feature).is_some()
    }
}

impl<T: Killswitch + ?Sized> Killswitch for std::sync::Arc<T> {
    fn level(&self, feature: &str) -> Option<i64> {
        (**self).level(feature)
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Jitter, KillswitchConfig};
    pub use crate::env::EnvKillswitch;
    pub use crate::error::{KillswitchError, KillswitchResult};
    pub use crate::memory::MemoryKillswitch;
    pub use crate::poller::{Poller, PollerHandle};
    pub use crate::store::{BlobStore, BlobStoreFn, FileStore};
    pub use crate::Killswitch;
}
