//! Release version numbers
//!
//! A version is a dot-separated sequence of non-negative integers. Ordering
//! pads the shorter version with zeros, so `1.5` and `1.5.0` compare equal.
//! Pre-release, development, post-release and local suffixes are recognised
//! and rejected with [`EngineError::UnsupportedPreRelease`] rather than being
//! given an ordering.

use crate::{EngineError, Result};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Suffix tags that mark a pre-release, development or post release
const RELEASE_TAGS: &[&str] = &[
    "a", "b", "c", "rc", "alpha", "beta", "pre", "preview", "dev", "post",
];

/// Parsed release version
#[derive(Debug, Clone)]
pub struct VersionNumber {
    segments: Vec<u64>,
    text: String,
}

impl VersionNumber {
    /// Parse a version from text
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(malformed(text, "version is empty"));
        }

        let release_end = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (release, suffix) = trimmed.split_at(release_end);

        if !suffix.is_empty() {
            let release_part = release.strip_suffix('.').unwrap_or(release);
            if parse_release(release_part).is_ok() && is_tag_chain(suffix) {
                return Err(EngineError::UnsupportedPreRelease {
                    text: trimmed.to_string(),
                });
            }
            let bad = suffix.chars().next().unwrap_or_default();
            return Err(malformed(
                trimmed,
                &format!("unexpected character '{}'", bad),
            ));
        }

        let segments = parse_release(release).map_err(|reason| malformed(trimmed, &reason))?;
        Ok(Self {
            segments,
            text: trimmed.to_string(),
        })
    }

    /// Build a version directly from numeric segments
    pub fn from_segments(segments: Vec<u64>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self { segments, text }
    }

    /// Segments as written (no padding)
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Segment at `index`, zero when the version is shorter
    pub fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }

    /// The version as written
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `[major, minor + 1]`, the exclusive ceiling of a compatible release.
    ///
    /// Returns `None` when the version has fewer than two segments or the
    /// minor segment is already `u64::MAX`.
    pub fn next_minor(&self) -> Option<VersionNumber> {
        match self.segments.as_slice() {
            [major, minor, ..] => {
                let minor = minor.checked_add(1)?;
                Some(Self::from_segments(vec![*major, minor]))
            }
            _ => None,
        }
    }

    fn significant(&self) -> &[u64] {
        let len = self
            .segments
            .iter()
            .rposition(|s| *s != 0)
            .map_or(0, |i| i + 1);
        &self.segments[..len]
    }
}

fn malformed(text: &str, reason: &str) -> EngineError {
    EngineError::MalformedVersion {
        text: text.trim().to_string(),
        reason: reason.to_string(),
    }
}

fn parse_release(release: &str) -> std::result::Result<Vec<u64>, String> {
    if release.is_empty() {
        return Err("missing numeric release".to_string());
    }
    release
        .split('.')
        .map(|segment| {
            if segment.is_empty() {
                return Err("empty version segment".to_string());
            }
            segment
                .parse::<u64>()
                .map_err(|_| format!("segment '{}' is out of range", segment))
        })
        .collect()
}

/// True when `rest` is a chain of pre/dev/post tags, optionally ending in a
/// `+local` label (e.g. `rc1`, `.dev0`, `a1.post2`, `+ubuntu1`).
fn is_tag_chain(mut rest: &str) -> bool {
    loop {
        if let Some(local) = rest.strip_prefix('+') {
            return !local.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        }

        rest = rest.strip_prefix(['.', '-', '_']).unwrap_or(rest);
        let letters = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if letters == 0 || !RELEASE_TAGS.contains(&rest[..letters].to_ascii_lowercase().as_str()) {
            return false;
        }
        rest = &rest[letters..];

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest = &rest[digits..];
        if rest.is_empty() {
            return true;
        }
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl Hash for VersionNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl FromStr for VersionNumber {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn v(s: &str) -> VersionNumber {
        VersionNumber::parse(s).unwrap()
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(v("1.5.1").segments(), &[1, 5, 1]);
        assert_eq!(v(" 4.2 ").segments(), &[4, 2]);
        assert_eq!(v("7").segments(), &[7]);
        assert_eq!(v("1.5.1").to_string(), "1.5.1");
    }

    #[test]
    fn test_trailing_zero_padding() {
        assert_eq!(v("1.5"), v("1.5.0"));
        assert_eq!(v("1.5").cmp(&v("1.5.0.0")), Ordering::Equal);
        assert!(v("1.5") < v("1.5.0.1"));

        let set: HashSet<VersionNumber> = [v("1.5"), v("1.5.0")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.3.0") < v("1.5.5"));
        assert!(v("1.5.5") < v("1.6.0"));
        assert!(v("1.10") > v("1.9.9"));
        assert!(v("2") > v("1.99.99"));
    }

    #[test]
    fn test_malformed_versions() {
        for text in [
            "",
            "  ",
            "1..2",
            "1.",
            ".1",
            "1.x",
            "abc",
            "1.5-foo",
            "99999999999999999999999",
        ] {
            let err = VersionNumber::parse(text).unwrap_err();
            assert!(
                matches!(err, EngineError::MalformedVersion { .. }),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_pre_release_rejected() {
        for text in [
            "1.5.0a1",
            "1.5.0rc2",
            "2.0.dev0",
            "1.0.post1",
            "1.0-beta",
            "1.0+local.1",
            "1.0a1.dev3",
        ] {
            let err = VersionNumber::parse(text).unwrap_err();
            assert_eq!(
                err,
                EngineError::UnsupportedPreRelease {
                    text: text.to_string()
                }
            );
        }
    }

    #[test]
    fn test_next_minor() {
        assert_eq!(v("1.5.1").next_minor(), Some(v("1.6")));
        assert_eq!(v("2.0").next_minor(), Some(v("2.1")));
        assert_eq!(v("3").next_minor(), None);
        assert_eq!(
            v("1.18446744073709551614.2").next_minor(),
            Some(v("1.18446744073709551615"))
        );
        assert_eq!(v("1.18446744073709551615").next_minor(), None);
    }

    #[test]
    fn test_from_segments_text() {
        let version = VersionNumber::from_segments(vec![1, 6]);
        assert_eq!(version.as_str(), "1.6");
        assert_eq!(version.segment(2), 0);
    }
}
