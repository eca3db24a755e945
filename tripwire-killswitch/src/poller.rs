//! Background killswitch poller.
//!
//! The poller owns the only writer to its cached [`KillswitchState`]. Each
//! poll fetches the source, parses it into a fresh state, and swaps it in
//! behind a lock that is held only for the pointer swap. Readers take the
//! same lock only long enough to look a name up.

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::metrics;
use crate::{
    BlobStore, FileStore, Jitter, Killswitch, KillswitchConfig, KillswitchError,
    KillswitchResult, KillswitchState, fold_name,
};
use parking_lot::RwLock;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Hook invoked with every background poll failure.
///
/// Receives the poller's locator and the error. A source that goes missing
/// under `missing_is_empty` is not reported.
pub type ErrorHandler = Arc<dyn Fn(&str, &KillswitchError) + Send + Sync>;

/// Result of a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Source bytes differ from the previous poll.
    Changed,
    /// Source bytes are identical to the previous poll.
    Unchanged,
}

impl PollOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Changed => "changed",
            PollOutcome::Unchanged => "unchanged",
        }
    }
}

/// Polls a [`BlobStore`] and caches the disabled-feature state.
///
/// Cloning is cheap; clones share the same cache and background task.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn BlobStore>,
    locator: String,
    interval: Duration,
    jitter: Jitter,
    missing_is_empty: bool,
    error_handler: Option<ErrorHandler>,
    state: RwLock<Arc<KillswitchState>>,
    started: AtomicBool,
}

impl Poller {
    /// Start building a poller over the given store.
    pub fn builder<S>(store: S) -> PollerBuilder
    where
        S: BlobStore + 'static,
    {
        PollerBuilder::new(Arc::new(store))
    }

    /// File-backed poller: a missing file means nothing is disabled.
    pub fn file(path: impl Into<String>, interval: Duration) -> KillswitchResult<Self> {
        Self::builder(FileStore::new())
            .locator(path)
            .interval(interval)
            .missing_is_empty(true)
            .build()
    }

    /// Build a poller from configuration.
    pub fn from_config<S>(store: S, config: &KillswitchConfig) -> KillswitchResult<Self>
    where
        S: BlobStore + 'static,
    {
        config.validate()?;
        Self::builder(store).config(config).build()
    }

    /// Locator passed to the store on every poll.
    pub fn locator(&self) -> &str {
        &self.inner.locator
    }

    /// Base polling interval.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Stored level for a feature, or `None` if it is not disabled.
    pub fn get(&self, feature: &str) -> Option<i64> {
        let name = fold_name(feature);
        self.inner.state.read().level(&name)
    }

    /// Current cached state.
    pub fn snapshot(&self) -> Arc<KillswitchState> {
        self.inner.state.read().clone()
    }

    /// Fingerprint of the source bytes behind the cached state.
    pub fn fingerprint(&self) -> Option<String> {
        self.inner.state.read().fingerprint().map(str::to_string)
    }

    /// Run the first poll, then keep polling in the background until
    /// `cancel` fires.
    ///
    /// Returns only after the first poll has completed, so every lookup made
    /// afterwards sees at least that state. A first-poll failure is returned
    /// and no background task is started, except that a missing source is
    /// treated as empty when the poller was built with `missing_is_empty`.
    pub async fn start(&self, cancel: CancellationToken) -> KillswitchResult<PollerHandle> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(KillswitchError::AlreadyStarted);
        }

        if let Err(e) = self.initial_poll().await {
            self.inner.started.store(false, Ordering::Release);
            return Err(e);
        }

        info!(
            locator = %self.inner.locator,
            interval = ?self.inner.interval,
            "Killswitch poller started"
        );

        let poller = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { poller.run(token).await });

        Ok(PollerHandle { cancel, task })
    }

    /// Poll the source once and swap in the result.
    ///
    /// On error the cached state is left untouched.
    pub async fn refresh(&self) -> KillswitchResult<PollOutcome> {
        let raw = match self.inner.store.get_blob_data(&self.inner.locator).await {
            Ok(raw) => raw,
            Err(e) => {
                let e = KillswitchError::fetch(&self.inner.locator, e);
                if self.is_tolerated_missing(&e) {
                    metrics::record_poll("missing");
                } else {
                    metrics::record_poll("failed");
                }
                return Err(e);
            }
        };

        let outcome = self.install(KillswitchState::parse(&raw));
        metrics::record_poll(outcome.as_str());
        Ok(outcome)
    }

    async fn initial_poll(&self) -> KillswitchResult<()> {
        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(e) if self.is_tolerated_missing(&e) => {
                debug!(
                    locator = %self.inner.locator,
                    "Killswitch source not present, starting with nothing disabled"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn run(self, cancel: CancellationToken) {
        loop {
            let delay = self.next_delay();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.refresh() => self.handle_poll_result(result),
            }
        }

        debug!(locator = %self.inner.locator, "Killswitch poller stopped");
    }

    fn handle_poll_result(&self, result: KillswitchResult<PollOutcome>) {
        match result {
            Ok(_) => {}
            Err(e) if self.is_tolerated_missing(&e) => {
                debug!(
                    locator = %self.inner.locator,
                    "Killswitch source disappeared, keeping previous state"
                );
            }
            Err(e) => {
                warn!(
                    locator = %self.inner.locator,
                    error = %e,
                    "Killswitch poll failed, keeping previous state"
                );
                if let Some(handler) = &self.inner.error_handler {
                    handler(&self.inner.locator, &e);
                }
            }
        }
    }

    fn install(&self, next: KillswitchState) -> PollOutcome {
        let next = Arc::new(next);
        let previous = std::mem::replace(&mut *self.inner.state.write(), next.clone());

        if previous.fingerprint() == next.fingerprint() {
            debug!(locator = %self.inner.locator, "Killswitch unchanged");
            return PollOutcome::Unchanged;
        }

        let hash = next.fingerprint().unwrap_or_default();
        info!(
            locator = %self.inner.locator,
            hash = hash,
            disabled = next.len(),
            "Killswitch state updated"
        );
        metrics::record_fingerprint(hash);
        PollOutcome::Changed
    }

    fn is_tolerated_missing(&self, e: &KillswitchError) -> bool {
        self.inner.missing_is_empty && e.is_not_found()
    }

    fn next_delay(&self) -> Duration {
        jittered(self.inner.interval, self.inner.jitter)
    }
}

impl Killswitch for Poller {
    fn level(&self, feature: &str) -> Option<i64> {
        self.get(feature)
    }
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("locator", &self.inner.locator)
            .field("interval", &self.inner.interval)
            .field("jitter", &self.inner.jitter)
            .field("missing_is_empty", &self.inner.missing_is_empty)
            .field("started", &self.inner.started.load(Ordering::Acquire))
            .finish()
    }
}

/// Builder for [`Poller`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use std::time::Duration;
/// use tripwire_killswitch::*;
///
/// let store = BlobStoreFn::new(|_url: String| async { Ok(Bytes::new()) });
/// let poller = Poller::builder(store)
///     .locator("s3://flags/killswitch")
///     .interval(Duration::from_secs(30))
///     .jitter(Duration::from_secs(5))
///     .error_handler(|locator, e| eprintln!("killswitch poll of {locator} failed: {e}"))
///     .build()
///     .unwrap();
///
/// assert_eq!(poller.locator(), "s3://flags/killswitch");
/// ```
pub struct PollerBuilder {
    store: Arc<dyn BlobStore>,
    locator: String,
    interval: Duration,
    jitter: Jitter,
    missing_is_empty: bool,
    error_handler: Option<ErrorHandler>,
}

impl PollerBuilder {
    fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            locator: String::new(),
            interval: DEFAULT_POLL_INTERVAL,
            jitter: Jitter::Proportional,
            missing_is_empty: false,
            error_handler: None,
        }
    }

    /// Locator passed to the store.
    pub fn locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = locator.into();
        self
    }

    /// Base polling interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Add a random delay in `[0, window)` to every interval.
    pub fn jitter(mut self, window: Duration) -> Self {
        self.jitter = Jitter::Window(window);
        self
    }

    /// Treat a missing source as "nothing disabled".
    pub fn missing_is_empty(mut self, missing_is_empty: bool) -> Self {
        self.missing_is_empty = missing_is_empty;
        self
    }

    /// Hook called with each background poll failure.
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &KillswitchError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Apply locator, interval, jitter and missing-source policy from config.
    pub fn config(mut self, config: &KillswitchConfig) -> Self {
        self.locator = config.locator.clone();
        self.interval = config.poll_interval();
        self.jitter = config.jitter();
        self.missing_is_empty = config.missing_is_empty;
        self
    }

    /// Build the poller.
    pub fn build(self) -> KillswitchResult<Poller> {
        if self.interval.is_zero() {
            return Err(KillswitchError::Config(
                "killswitch poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(Poller {
            inner: Arc::new(Inner {
                store: self.store,
                locator: self.locator,
                interval: self.interval,
                jitter: self.jitter,
                missing_is_empty: self.missing_is_empty,
                error_handler: self.error_handler,
                state: RwLock::new(Arc::new(KillswitchState::empty())),
                started: AtomicBool::new(false),
            }),
        })
    }
}

/// Handle to a running poller task.
///
/// Dropping the handle does not stop the task; cancel the token passed to
/// [`Poller::start`] or call [`PollerHandle::shutdown`].
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Token that stops the poller.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the poller and wait for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Wait for the task to exit without cancelling it.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "Killswitch poller task ended abnormally");
        }
    }
}

/// Interval with jitter applied.
///
/// A zero interval or zero window degrades to the bare interval.
pub fn jittered(interval: Duration, jitter: Jitter) -> Duration {
    match jitter {
        Jitter::Proportional => {
            let base = as_nanos(interval);
            let swing = base / 10;
            if swing == 0 {
                return interval;
            }
            let offset = rand::rng().random_range(0..swing);
            Duration::from_nanos((base - swing / 2).saturating_add(offset))
        }
        Jitter::Window(window) => {
            let window = as_nanos(window);
            if window == 0 {
                return interval;
            }
            interval + Duration::from_nanos(rand::rng().random_range(0..window))
        }
    }
}

fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
