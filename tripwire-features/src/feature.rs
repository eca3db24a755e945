//! Feature definitions and evaluation.

use crate::context::Context;
use crate::error::FeatureResult;
use crate::matcher::Matcher;
use crate::metrics;
use crate::registry::FeatureRegistry;
use tracing::debug;

/// A named feature gated by matchers, overrides and a killswitch.
///
/// Features are defined once, usually as statics, and evaluated on every
/// request. Evaluation is lock-free apart from the killswitch lookup.
///
/// # Examples
///
/// ```
/// use tripwire_features::*;
///
/// let registry = FeatureRegistry::new();
/// let feature = Feature::builder("checkout-v2")
///     .matcher(Matcher::and([
///         Matcher::exact_match("region", "eu"),
///         Matcher::percentage("customerId", 25),
///     ]))
///     .registry(&registry)
///     .build();
///
/// let ctx = Context::new()
///     .with_value("region", "eu")
///     .with_value("customerId", "cust-13");
/// assert!(feature.enabled(&ctx));
///
/// let ctx = ctx.with_value("customerId", "cust-3");
/// assert!(!feature.enabled(&ctx));
/// ```
#[derive(Debug, Clone)]
pub struct Feature {
    name: String,
    key: String,
    matchers: Vec<Matcher>,
    killswitch_override: i64,
}

/// How a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Killed,
    Override(bool),
    GlobalOverride(bool),
    Matched,
    Unmatched,
}

impl Decision {
    fn enabled(self) -> bool {
        match self {
            Self::Killed | Self::Unmatched => false,
            Self::Override(enabled) | Self::GlobalOverride(enabled) => enabled,
            Self::Matched => true,
        }
    }
}

/// Reports the decision to the context's observer when dropped, so every
/// return path is observed exactly once.
struct Observation<'a> {
    ctx: &'a Context,
    feature: &'a str,
    enabled: bool,
}

impl Drop for Observation<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Some(observer) = self.ctx.observer() {
            observer(self.ctx, self.feature, self.enabled);
        }
    }
}

impl Feature {
    /// Define a feature in the global registry.
    ///
    /// # Panics
    ///
    /// Panics if a feature with the same case-insensitive name already
    /// exists. Use [`Feature::builder`] and [`FeatureBuilder::try_build`] to
    /// handle that as an error instead.
    pub fn new(name: impl Into<String>, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self::builder(name).matchers(matchers).build()
    }

    /// Start building a feature.
    pub fn builder(name: impl Into<String>) -> FeatureBuilder {
        FeatureBuilder::new(name)
    }

    /// Feature name as defined.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highest killswitch level this feature ignores.
    pub fn killswitch_override(&self) -> i64 {
        self.killswitch_override
    }

    /// Top-level matchers, ORed together.
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Whether the feature is enabled for a context.
    ///
    /// Precedence, first match wins:
    ///
    /// 1. A killswitch record at or above the feature's override level
    ///    disables it.
    /// 2. A per-feature override on the context.
    /// 3. A global override on the context.
    /// 4. Any matcher evaluating true enables it.
    ///
    /// The context's observer sees every decision, including overridden
    /// and killed ones.
    pub fn enabled(&self, ctx: &Context) -> bool {
        let mut observation = Observation {
            ctx,
            feature: &self.name,
            enabled: false,
        };

        let decision = self.decide(ctx);
        match decision {
            Decision::Killed => metrics::record_killswitch(&self.name),
            Decision::Matched => metrics::record_enabled(&self.name),
            _ => {}
        }

        observation.enabled = decision.enabled();
        observation.enabled
    }

    fn decide(&self, ctx: &Context) -> Decision {
        if let Some(killswitch) = ctx.killswitch()
            && let Some(level) = killswitch.level(&self.key)
            && level >= self.killswitch_override
        {
            debug!(
                feature = %self.name,
                level,
                override_level = self.killswitch_override,
                "Feature disabled by killswitch"
            );
            return Decision::Killed;
        }

        if let Some(enabled) = ctx.override_for(&self.key) {
            return Decision::Override(enabled);
        }

        if let Some(enabled) = ctx.global_override() {
            return Decision::GlobalOverride(enabled);
        }

        if self.matchers.iter().any(|m| m.evaluate(ctx)) {
            Decision::Matched
        } else {
            Decision::Unmatched
        }
    }
}

/// Builder for [`Feature`].
#[derive(Debug)]
pub struct FeatureBuilder {
    name: String,
    matchers: Vec<Matcher>,
    killswitch_override: i64,
    registry: Option<FeatureRegistry>,
}

impl FeatureBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matchers: Vec::new(),
            killswitch_override: 0,
            registry: None,
        }
    }

    /// Add a matcher. Matchers are ORed together.
    pub fn matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Add several matchers.
    pub fn matchers(mut self, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        self.matchers.extend(matchers);
        self
    }

    /// Ignore killswitch records whose level is below `level`.
    ///
    /// A record `name=N` disables the feature only when `N >= level`. The
    /// default of 0 means any record disables it.
    pub fn killswitch_override(mut self, level: i64) -> Self {
        self.killswitch_override = level;
        self
    }

    /// Register the name in `registry` instead of the global one.
    pub fn registry(mut self, registry: &FeatureRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Build the feature, claiming its name.
    pub fn try_build(self) -> FeatureResult<Feature> {
        let registry = self.registry.as_ref().unwrap_or(FeatureRegistry::global());
        registry.register(&self.name)?;

        Ok(Feature {
            key: self.name.to_lowercase(),
            name: self.name,
            matchers: self.matchers,
            killswitch_override: self.killswitch_override,
        })
    }

    /// Build the feature, claiming its name.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered.
    pub fn build(self) -> Feature {
        match self.try_build() {
            Ok(feature) => feature,
            Err(e) => panic!("{e}"),
        }
    }
}
