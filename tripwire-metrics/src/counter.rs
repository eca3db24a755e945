//! Counter metrics
//!
//! Counters only increase over time. [`CounterFamily`] wraps a labelled
//! counter so that callers on a hot path never have to handle registration
//! errors.

pub use prometheus::CounterVec;

/// Labelled counter that never fails to record.
///
/// If registration fails (invalid name, duplicate registration) the failure
/// is logged and every later increment is silently dropped.
#[derive(Clone, Debug)]
pub struct CounterFamily {
    inner: Option<CounterVec>,
}

impl CounterFamily {
    /// Register a counter family in the default registry.
    pub fn register(name: &str, help: &str, label_names: &[&str]) -> Self {
        match crate::register_counter_vec(name, help, label_names) {
            Ok(counter) => Self {
                inner: Some(counter),
            },
            Err(e) => {
                tracing::warn!(metric = name, error = %e, "Failed to register counter");
                Self::noop()
            }
        }
    }

    /// A counter family that records nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Whether increments are being recorded.
    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    /// Increment the counter for the given label values by one.
    pub fn inc(&self, label_values: &[&str]) {
        if let Some(counter) = &self.inner
            && let Ok(c) = counter.get_metric_with_label_values(label_values)
        {
            c.inc();
        }
    }

    /// Current value for the given label values (0 when inactive).
    pub fn get(&self, label_values: &[&str]) -> f64 {
        self.inner
            .as_ref()
            .and_then(|c| c.get_metric_with_label_values(label_values).ok())
            .map(|c| c.get())
            .unwrap_or(0.0)
    }
}
