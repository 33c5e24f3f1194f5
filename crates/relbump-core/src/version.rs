//! Release version validation and ordering.
//!
//! A release version is any string containing a match of
//! `[0-9]+\.[0-9]+\.[0-9]+(-.+)?`. The pattern is deliberately unanchored,
//! so `1.2.3.4` passes while `1.2` does not.
//!
//! Ordering is a natural "version sort": strings are split into runs of
//! digits and non-digits, digit runs compare numerically and other runs
//! compare as text. A run starting with `-` (or any character below it)
//! sorts before the end of the string, so `1.0.0-rc1 < 1.0.0` as in SemVer.
//! Ties between numerically equal strings (`01.2.3`, `1.2.3`) fall back to
//! the text, which keeps the order total over every string.
//! Plain lexicographic ordering would rank `1.10.0` before `1.9.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+(-.+)?").expect("version pattern is a valid regex")
});

/// Errors from version operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string does not look like `major.minor.patch[-prerelease]`.
    #[error("invalid version format: {0:?} (expected e.g. 1.2.3 or 1.2.3-rc1)")]
    InvalidFormat(String),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// A validated release version.
///
/// Keeps the exact text the user supplied; equality is string equality and
/// [`Ord`] is the release ordering described in the module docs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// The version text as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `self` sorts before or equal to `other`.
    pub fn is_less_or_equal(&self, other: &Self) -> bool {
        is_less_or_equal(&self.0, &other.0)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReleaseVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.0, &other.0)
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Validate a user-supplied version string.
#[instrument]
pub fn validate(input: &str) -> VersionResult<ReleaseVersion> {
    if VERSION_PATTERN.is_match(input) {
        debug!("version accepted");
        Ok(ReleaseVersion(input.to_owned()))
    } else {
        Err(VersionError::InvalidFormat(input.to_owned()))
    }
}

/// Whether `a` sorts before or equal to `b`.
///
/// Both `is_less_or_equal(a, b)` and `is_less_or_equal(b, a)` hold only
/// when `a == b`.
pub fn is_less_or_equal(a: &str, b: &str) -> bool {
    compare(a, b) != Ordering::Greater
}

/// Total order over version strings, in the spirit of `sort -V`.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(r)) => return end_vs_chunk(r),
            (Some(l), None) => return end_vs_chunk(l).reverse(),
            (Some(l), Some(r)) => {
                let ord = if starts_with_digit(l) && starts_with_digit(r) {
                    cmp_digit_runs(l, r)
                } else {
                    l.cmp(r)
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Where the end of a string sorts against a run the other string still has.
///
/// Digit runs start above `-`, so this splits the runs into two blocks with
/// the end sitting between them.
fn end_vs_chunk(chunk: &str) -> Ordering {
    if chunk.starts_with(|c: char| c <= '-') {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

/// Split into alternating runs of ASCII digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let digits = starts_with_digit(rest);
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

fn starts_with_digit(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

/// Compare two digit runs numerically without overflowing.
fn cmp_digit_runs(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}
