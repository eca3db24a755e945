//! Gauge metrics
//!
//! Gauges can increase and decrease. The killswitch uses an info-style
//! gauge: one series set to 1, labelled with the current content hash.

pub use prometheus::GaugeVec;

/// Labelled gauge that never fails to record.
#[derive(Clone, Debug)]
pub struct GaugeFamily {
    inner: Option<GaugeVec>,
}

impl GaugeFamily {
    /// Register a gauge family in the default registry.
    pub fn register(name: &str, help: &str, label_names: &[&str]) -> Self {
        match crate::register_gauge_vec(name, help, label_names) {
            Ok(gauge) => Self { inner: Some(gauge) },
            Err(e) => {
                tracing::warn!(metric = name, error = %e, "Failed to register gauge");
                Self::noop()
            }
        }
    }

    /// A gauge family that records nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Set the value for the given label values.
    pub fn set(&self, label_values: &[&str], value: f64) {
        if let Some(gauge) = &self.inner
            && let Ok(g) = gauge.get_metric_with_label_values(label_values)
        {
            g.set(value);
        }
    }

    /// Drop every series, then set a single one to 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire_metrics::*;
    ///
    /// let info = GaugeFamily::register("doc_gauge_info", "Info", &["hash"]);
    /// info.replace_info(&["aaa"]);
    /// info.replace_info(&["bbb"]);
    /// assert_eq!(info.get(&["aaa"]), 0.0);
    /// assert_eq!(info.get(&["bbb"]), 1.0);
    /// ```
    pub fn replace_info(&self, label_values: &[&str]) {
        if let Some(gauge) = &self.inner {
            gauge.reset();
        }
        self.set(label_values, 1.0);
    }

    /// Current value for the given label values (0 when inactive).
    pub fn get(&self, label_values: &[&str]) -> f64 {
        self.inner
            .as_ref()
            .and_then(|g| g.get_metric_with_label_values(label_values).ok())
            .map(|g| g.get())
            .unwrap_or(0.0)
    }
}
