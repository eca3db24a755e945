//! Parsed killswitch state.
//!
//! A source is UTF-8 text with one record per line:
//!
//! ```text
//! # comment
//! checkout-v2        <- disabled, cannot be overridden
//! search-rerank=1    <- disabled unless the feature's override level is above 1
//! ```
//!
//! Names are case-folded. A level that does not parse as an integer is
//! treated as [`UNLIMITED_LEVEL`].

use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// Level recorded for a name with no `=level` suffix.
pub const UNLIMITED_LEVEL: i64 = i64::MAX;

/// Immutable snapshot of disabled features.
///
/// Each successful poll builds a fresh snapshot and swaps it in whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillswitchState {
    levels: HashMap<String, i64>,
    fingerprint: Option<String>,
}

impl KillswitchState {
    /// State with nothing disabled and no fingerprint.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse raw source bytes and fingerprint them.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire_killswitch::{KillswitchState, UNLIMITED_LEVEL};
    ///
    /// let state = KillswitchState::parse(b"Checkout-V2\nsearch=1\n");
    /// assert_eq!(state.level("checkout-v2"), Some(UNLIMITED_LEVEL));
    /// assert_eq!(state.level("SEARCH"), Some(1));
    /// assert_eq!(state.level("other"), None);
    /// ```
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut levels = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (name, level) = match line.split_once('=') {
                Some((name, level)) => (name.trim(), parse_level(name, level)),
                None => (line, UNLIMITED_LEVEL),
            };
            if name.is_empty() {
                continue;
            }

            levels.insert(name.to_lowercase(), level);
        }

        Self {
            levels,
            fingerprint: Some(fingerprint(raw)),
        }
    }

    /// Build a state directly from `(name, level)` pairs.
    pub fn from_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        Self {
            levels: levels
                .into_iter()
                .map(|(name, level)| (name.as_ref().to_lowercase(), level))
                .collect(),
            fingerprint: None,
        }
    }

    /// Build a state from a comma-separated list of names.
    ///
    /// Every listed feature is disabled at [`UNLIMITED_LEVEL`]; blank items
    /// are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire_killswitch::KillswitchState;
    ///
    /// let state = KillswitchState::from_list("search, Checkout-V2,,");
    /// assert_eq!(state.len(), 2);
    /// assert!(state.is_killed("checkout-v2"));
    /// ```
    pub fn from_list(list: &str) -> Self {
        Self::from_levels(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| (name, UNLIMITED_LEVEL)),
        )
    }

    /// Stored level for a feature, if it is disabled.
    pub fn level(&self, feature: &str) -> Option<i64> {
        self.levels.get(&*fold_name(feature)).copied()
    }

    /// Whether a feature appears in the state at all.
    pub fn is_killed(&self, feature: &str) -> bool {
        self.level(feature).is_some()
    }

    /// Hex SHA-256 of the bytes this state was parsed from.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Number of disabled features.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether nothing is disabled.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Case-folded names of every disabled feature.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }
}

fn parse_level(name: &str, raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(level) => level,
        Err(_) => {
            debug!(
                feature = name,
                level = raw,
                "Malformed killswitch level, treating as unlimited"
            );
            UNLIMITED_LEVEL
        }
    }
}

/// Case-fold a feature name, borrowing when it is already folded.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use tripwire_killswitch::fold_name;
///
/// assert!(matches!(fold_name("checkout-v2"), Cow::Borrowed(_)));
/// assert_eq!(fold_name("Checkout-V2"), "checkout-v2");
/// ```
pub fn fold_name(name: &str) -> Cow<'_, str> {
    let folded = name.chars().all(|c| {
        let mut lower = c.to_lowercase();
        lower.next() == Some(c) && lower.next().is_none()
    });
    if folded {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_lowercase())
    }
}

/// Hex-encoded SHA-256 of raw killswitch bytes.
pub fn fingerprint(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        let state = KillswitchState::parse(b"foo=0\nbaz\nbar=2");

        assert_eq!(state.level("foo"), Some(0));
        assert_eq!(state.level("bar"), Some(2));
        assert_eq!(state.level("baz"), Some(UNLIMITED_LEVEL));
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_parse_case_folds_names() {
        let state = KillswitchState::parse(b"MyFeature=3\n");
        assert_eq!(state.level("myfeature"), Some(3));
        assert_eq!(state.level("MYFEATURE"), Some(3));
    }

    #[test]
    fn test_malformed_level_is_unlimited() {
        let state = KillswitchState::parse(b"foo=abc\nbar=\nbaz=1.5");
        assert_eq!(state.level("foo"), Some(UNLIMITED_LEVEL));
        assert_eq!(state.level("bar"), Some(UNLIMITED_LEVEL));
        assert_eq!(state.level("baz"), Some(UNLIMITED_LEVEL));
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let state = KillswitchState::parse(b"\n\n# disabled during incident 42\n  foo  \n\r\n=3\n");
        assert_eq!(state.len(), 1);
        assert!(state.is_killed("foo"));
        assert!(!state.is_killed(""));
    }

    #[test]
    fn test_windows_line_endings() {
        let state = KillswitchState::parse(b"foo=1\r\nbar\r\n");
        assert_eq!(state.level("foo"), Some(1));
        assert_eq!(state.level("bar"), Some(UNLIMITED_LEVEL));
    }

    #[test]
    fn test_last_record_wins() {
        let state = KillswitchState::parse(b"foo=1\nFOO=4\n");
        assert_eq!(state.level("foo"), Some(4));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = KillswitchState::parse(b"foo\n");
        let b = KillswitchState::parse(b"foo\n");
        let c = KillswitchState::parse(b"foo\nbar\n");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().map(str::len), Some(64));
    }

    #[test]
    fn test_fold_name_borrows_folded_names() {
        assert!(matches!(fold_name("checkout-v2"), Cow::Borrowed(_)));
        assert!(matches!(fold_name(""), Cow::Borrowed(_)));
        assert!(matches!(fold_name("ünïcode-42"), Cow::Borrowed(_)));
        assert!(matches!(fold_name("Checkout"), Cow::Owned(_)));
        assert_eq!(fold_name("ÜBER"), "über");
    }

    #[test]
    fn test_from_list() {
        let state = KillswitchState::from_list("someotherfeature,MyFeature,anotherfeature");
        assert_eq!(state.len(), 3);
        assert_eq!(state.level("myfeature"), Some(UNLIMITED_LEVEL));
        assert!(!state.is_killed("my"));
        assert_eq!(state.fingerprint(), None);
    }

    #[test]
    fn test_from_list_skips_blank_items() {
        assert!(KillswitchState::from_list("").is_empty());
        assert_eq!(KillswitchState::from_list(" a , ,b,").len(), 2);
    }

    #[test]
    fn test_empty_state() {
        let state = KillswitchState::empty();
        assert!(state.is_empty());
        assert_eq!(state.fingerprint(), None);
        assert_eq!(state.level("anything"), None);
    }

    #[test]
    fn test_empty_source_still_fingerprinted() {
        let state = KillswitchState::parse(b"");
        assert!(state.is_empty());
        assert!(state.fingerprint().is_some());
    }
}
