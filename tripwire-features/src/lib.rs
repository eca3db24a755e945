//! Feature toggles for tripwire
//!
//! Features are defined once in code, gated by matcher rules over a
//! request [`Context`], and can be forced on or off by overrides or forced
//! off at runtime by a killswitch.
//!
//! # Features
//!
//! - **Matchers** - exact-match, stable percentage rollout and AND trees
//! - **Layered contexts** - a process-wide base context extended per request
//! - **Overrides** - per-feature and global, for tests and operators
//! - **Killswitch** - disable features without a deploy, with override levels
//! - **Observers** - see every decision as it is made
//! - **Metrics** - Prometheus counters for enablements and kills
//!
//! # Quick Start
//!
//! ```
//! use tripwire_features::*;
//!
//! # let registry = FeatureRegistry::new();
//! let checkout = Feature::builder("checkout-v2")
//!     .matcher(Matcher::and([
//!         Matcher::exact_match("region", "eu"),
//!         Matcher::percentage("customerId", 25),
//!     ]))
//! #   .registry(&registry)
//!     .build();
//!
//! let base = Context::new().with_value("region", "eu");
//! let request = base.with_value("customerId", "cust-13");
//!
//! if checkout.enabled(&request) {
//!     // new checkout
//! }
//! ```
//!
//! # Overrides
//!
//! ```
//! use tripwire_features::*;
//!
//! # let registry = FeatureRegistry::new();
//! let search = Feature::builder("search-rerank")
//! #   .registry(&registry)
//!     .build();
//!
//! let ctx = Context::new().with_override(&search, true);
//! assert!(search.enabled(&ctx));
//!
//! // Comma-separated lists, e.g. from a header or environment variable
//! let ctx = Context::new().with_override_string("ff-", "ff-search-rerank");
//! assert!(search.enabled(&ctx));
//! ```
//!
//! # Killswitch
//!
//! ```
//! use std::sync::Arc;
//! use tripwire_features::*;
//! use tripwire_killswitch::MemoryKillswitch;
//!
//! # let registry = FeatureRegistry::new();
//! let feature = Feature::builder("profile-v3")
//!     .matcher(Matcher::and([]))
//! #   .registry(&registry)
//!     .build();
//!
//! let killswitch = Arc::new(MemoryKillswitch::new());
//! let ctx = Context::new().with_killswitch(killswitch.clone());
//! assert!(feature.enabled(&ctx));
//!
//! killswitch.kill("profile-v3");
//! assert!(!feature.enabled(&ctx));
//! ```

pub mod context;
pub mod error;
pub mod feature;
pub mod matcher;
pub mod metrics;
pub mod registry;

pub use context::{Context, Key, ObserverFn};
pub use error::{FeatureError, FeatureResult};
pub use feature::{Feature, FeatureBuilder};
pub use matcher::{Matcher, bucket};
pub use registry::FeatureRegistry;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::context::{Context, Key};
    pub use crate::error::{FeatureError, FeatureResult};
    pub use crate::feature::Feature;
    pub use crate::matcher::Matcher;
    pub use crate::registry::FeatureRegistry;
}
