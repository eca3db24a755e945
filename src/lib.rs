//! Tripwire - feature toggles with rule matchers, overrides and killswitches
//!
//! This crate bundles the workspace members behind one import:
//!
//! - [`features`] - features, matchers, contexts and overrides
//! - [`killswitch`] - polled and in-memory killswitches
//! - [`metrics`] - the Prometheus registry every crate records into
//! - [`logging`] - tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tripwire::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! tripwire::logging::init();
//!
//! let checkout = Feature::builder("checkout-v2")
//!     .matcher(Matcher::percentage("customerId", 25))
//!     .build();
//!
//! let killswitch = Poller::file("/etc/tripwire/killswitch", Duration::from_secs(10))?;
//! let handle = killswitch.start(CancellationToken::new()).await?;
//!
//! let base = Context::new().with_killswitch(killswitch.clone());
//! let request = base.with_value("customerId", "cust-42");
//! let _enabled = checkout.enabled(&request);
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod logging;

pub use tripwire_features as features;
pub use tripwire_killswitch as killswitch;
pub use tripwire_metrics as metrics;

pub use tripwire_features::{Context, Feature, FeatureError, FeatureRegistry, Key, Matcher};
pub use tripwire_killswitch::{Killswitch, KillswitchConfig, KillswitchError, Poller};

/// Re-export commonly used types
pub mod prelude {
    pub use tripwire_features::prelude::*;
    pub use tripwire_killswitch::prelude::*;
}
