//! Poller metrics.

use once_cell::sync::Lazy;
use tripwire_metrics::{CounterFamily, GaugeFamily};

static POLLS: Lazy<CounterFamily> = Lazy::new(|| {
    CounterFamily::register(
        "tripwire_killswitch_polls_total",
        "Number of killswitch polls by outcome.",
        &["outcome"],
    )
});

static INFO: Lazy<GaugeFamily> = Lazy::new(|| {
    GaugeFamily::register(
        "tripwire_killswitch_info",
        "Metadata related to the tripwire killswitch.",
        &["hash"],
    )
});

pub(crate) fn record_poll(outcome: &str) {
    POLLS.inc(&[outcome]);
}

pub(crate) fn record_fingerprint(hash: &str) {
    INFO.replace_info(&[hash]);
}
