//! Prometheus metrics for tripwire
//!
//! Feature evaluation and killswitch polling report what they decide through
//! counters and gauges registered in a single process-wide registry. Every
//! metric is fire-and-forget: registration problems are logged once and the
//! metric degrades to a no-op, so recording can never fail an evaluation.
//!
//! # Quick Start
//!
//! ```
//! use tripwire_metrics::*;
//!
//! let enabled = CounterFamily::register(
//!     "doc_feature_enable_total",
//!     "Number of times a feature is enabled.",
//!     &["feature"],
//! );
//! enabled.inc(&["checkout-v2"]);
//!
//! let text = export_metrics();
//! assert!(text.contains("doc_feature_enable_total"));
//! ```

pub mod counter;
pub mod gauge;
pub mod registry;

pub use counter::*;
pub use gauge::*;
pub use prometheus;
pub use registry::*;

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Registry every tripwire crate records into.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Render [`default_registry`] in the Prometheus text exposition format.
pub fn export_metrics() -> String {
    export_metrics_from_registry(&DEFAULT_REGISTRY)
}

/// Render any registry in the Prometheus text exposition format.
///
/// Encoding failures are logged and rendered as a comment line, so a scrape
/// endpoint always has something to serve.
///
/// # Examples
///
/// ```
/// use tripwire_metrics::*;
/// use prometheus::Registry;
///
/// let registry = Registry::new();
/// assert!(export_metrics_from_registry(&registry).is_empty());
/// ```
pub fn export_metrics_from_registry(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    match TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Metrics exposition is not UTF-8");
            String::from("# metrics unavailable\n")
        }),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            String::from("# metrics unavailable\n")
        }
    }
}
