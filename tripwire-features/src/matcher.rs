//! Matcher trees
//!
//! A matcher is either a leaf predicate over context values or an AND over
//! child matchers. A feature ORs its top-level matchers together.

use crate::context::{Context, Key};
use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Number of percentage buckets.
pub const BUCKETS: u32 = 100;

/// A node in a feature's rule tree.
///
/// Matchers are built once at startup and evaluated concurrently by every
/// request afterwards; evaluation has no side effects.
///
/// # Examples
///
/// ```
/// use tripwire_features::*;
///
/// // 25% of customers in the EU
/// let matcher = Matcher::and([
///     Matcher::exact_match("region", "eu"),
///     Matcher::percentage("customerId", 25),
/// ]);
///
/// let ctx = Context::new()
///     .with_value("region", "eu")
///     .with_value("customerId", "cust-13");
/// assert!(matcher.evaluate(&ctx));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Matcher {
    /// True when every child is true; true when there are no children.
    And {
        /// Child matchers
        matchers: Vec<Matcher>,
    },

    /// True when the context value equals `value` exactly.
    ExactMatch {
        /// Context key to read
        key: Key,
        /// Expected value (case-sensitive)
        value: String,
    },

    /// True for a stable `percent` of the possible values of `key`.
    Percentage {
        /// Context key to bucket by
        key: Key,
        /// Share of buckets that match (0-100)
        percent: u32,
    },
}

impl Matcher {
    /// Match when all children match.
    pub fn and(matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self::And {
            matchers: matchers.into_iter().collect(),
        }
    }

    /// Match when a context value equals `value`.
    ///
    /// An absent key reads as the empty string.
    pub fn exact_match(key: impl Into<Key>, value: impl Into<String>) -> Self {
        Self::ExactMatch {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Match a stable percentage of the possible values of a key.
    ///
    /// Percentages above 100 are clamped to 100.
    pub fn percentage(key: impl Into<Key>, percent: u32) -> Self {
        Self::Percentage {
            key: key.into(),
            percent: percent.min(BUCKETS),
        }
    }

    /// Evaluate against a context.
    pub fn evaluate(&self, ctx: &Context) -> bool {
        match self {
            Self::And { matchers } => matchers.iter().all(|m| m.evaluate(ctx)),
            Self::ExactMatch { key, value } => ctx.lookup(key) == value,
            Self::Percentage { key, percent } => bucket(ctx.lookup(key)) < *percent,
        }
    }
}

/// Bucket (0-99) a value falls into for percentage rollout.
///
/// Uses 32-bit FNV-1a, so the result is the same across processes,
/// platforms and releases.
///
/// # Examples
///
/// ```
/// use tripwire_features::bucket;
///
/// assert_eq!(bucket("cust-13"), 9);
/// assert_eq!(bucket("cust-13"), bucket("cust-13"));
/// ```
pub fn bucket(value: &str) -> u32 {
    fnv1a32(value.as_bytes()) % BUCKETS
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}
