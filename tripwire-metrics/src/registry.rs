//! Metric registration helpers

use prometheus::{CounterVec, GaugeVec, Opts};

/// Register a counter with labels in the default registry
///
/// # Examples
///
/// ```
/// use tripwire_metrics::*;
///
/// let counter = register_counter_vec(
///     "doc_polls_total",
///     "Killswitch polls by outcome",
///     &["outcome"],
/// )
/// .unwrap();
///
/// counter.with_label_values(&["changed"]).inc();
/// ```
pub fn register_counter_vec(
    name: &str,
    help: &str,
    label_names: &[&str],
) -> Result<CounterVec, prometheus::Error> {
    let counter = CounterVec::new(Opts::new(name, help), label_names)?;
    crate::default_registry().register(Box::new(counter.clone()))?;
    Ok(counter)
}

/// Register a gauge with labels in the default registry
///
/// # Examples
///
/// ```
/// use tripwire_metrics::*;
///
/// let gauge = register_gauge_vec("doc_info", "Build metadata", &["hash"]).unwrap();
/// gauge.with_label_values(&["abc123"]).set(1.0);
/// ```
pub fn register_gauge_vec(
    name: &str,
    help: &str,
    label_names: &[&str],
) -> Result<GaugeVec, prometheus::Error> {
    let gauge = GaugeVec::new(Opts::new(name, help), label_names)?;
    crate::default_registry().register(Box::new(gauge.clone()))?;
    Ok(gauge)
}
