//! Evaluation counters.

use once_cell::sync::Lazy;
use tripwire_metrics::CounterFamily;

static ENABLED: Lazy<CounterFamily> = Lazy::new(|| {
    CounterFamily::register(
        "tripwire_feature_enable_total",
        "Number of times a feature is enabled.",
        &["feature"],
    )
});

static KILLSWITCH: Lazy<CounterFamily> = Lazy::new(|| {
    CounterFamily::register(
        "tripwire_feature_killswitch_total",
        "Number of times a feature is disabled by a killswitch.",
        &["feature"],
    )
});

pub(crate) fn record_enabled(feature: &str) {
    ENABLED.inc(&[feature]);
}

pub(crate) fn record_killswitch(feature: &str) {
    KILLSWITCH.inc(&[feature]);
}

/// Rule-driven enablements recorded for a feature so far.
pub fn enabled_count(feature: &str) -> f64 {
    ENABLED.get(&[feature])
}

/// Killswitch-forced disablements recorded for a feature so far.
pub fn killswitch_count(feature: &str) -> f64 {
    KILLSWITCH.get(&[feature])
}
