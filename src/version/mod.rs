//! Version identifier parsing and ordering.
//!
//! Upstream listings use dotted numeric versions with an optional hyphenated
//! suffix: `5.15.3`, `3.9.11-gentoo-r1`, `20230515`. This module parses those
//! identifiers and orders them so the newest candidate on a listing page can
//! be selected.
//!
//! # Ordering
//!
//! Two identifiers are comparable only when their numeric parts have the same
//! arity (both 1-part, both 2-part, or both 3-part). Comparison collapses the
//! numeric part into a single weighted integer - `major*10000 + minor*100 +
//! patch` for 3-part versions, `major*100 + minor` for 2-part, the bare value
//! for 1-part - then breaks ties on the suffix:
//!
//! - a version *with* a suffix outranks the bare numeric version it derives
//!   from (`3.9.11-gentoo-r1` > `3.9.11`). This is a deliberate policy: a
//!   tagged descriptor supersedes the plain upstream release it was cut from;
//! - otherwise suffixes compare lexicographically
//!   (`-gentoo-r2` > `-gentoo-r1`).
//!
//! The weighting allots two decimal digits per non-leading component. Values
//! of 100 or more in those slots would silently collide with a neighboring
//! component, so they are rejected with
//! [`UpsyncError::VersionComponentTooLarge`] rather than wrapped.
//!
//! # Examples
//!
//! ```
//! use upsync::version::VersionId;
//! use std::cmp::Ordering;
//!
//! # fn example() -> anyhow::Result<()> {
//! let old = VersionId::parse("3.9.11")?;
//! let new = VersionId::parse("3.10.7")?;
//! assert_eq!(old.compare(&new)?, Ordering::Less);
//!
//! // Mismatched arity is a typed error, never a silent guess.
//! let two_part = VersionId::parse("1.2")?;
//! assert!(two_part.compare(&new).is_err());
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::core::UpsyncError;

/// A parsed version identifier.
///
/// Holds the dot-separated numeric components and the optional hyphenated
/// suffix (everything after the first `-`, hyphens preserved). The original
/// string is retained for display and for use as a filename stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionId {
    raw: String,
    components: Vec<u64>,
    suffix: Option<String>,
}

impl VersionId {
    /// Parse a version identifier such as `5.15.3` or `3.9.11-gentoo-r1`.
    ///
    /// The identifier is split on the first hyphen into a numeric part and a
    /// suffix. The numeric part must consist of 1 to 3 dot-separated decimal
    /// integers.
    ///
    /// # Errors
    ///
    /// Returns [`UpsyncError::InvalidVersion`] when the numeric part is
    /// empty, contains a non-numeric component, or has more than three
    /// components.
    pub fn parse(raw: &str) -> Result<Self, UpsyncError> {
        let (numeric, suffix) = match raw.split_once('-') {
            Some((n, s)) => (n, Some(s.to_string())),
            None => (raw, None),
        };

        if numeric.is_empty() {
            return Err(UpsyncError::InvalidVersion {
                version: raw.to_string(),
                reason: "empty numeric part".to_string(),
            });
        }
        if let Some(s) = &suffix
            && s.is_empty()
        {
            return Err(UpsyncError::InvalidVersion {
                version: raw.to_string(),
                reason: "trailing hyphen with empty suffix".to_string(),
            });
        }

        let components = numeric
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| UpsyncError::InvalidVersion {
                    version: raw.to_string(),
                    reason: format!("component '{part}' is not a decimal integer"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if components.len() > 3 {
            return Err(UpsyncError::InvalidVersion {
                version: raw.to_string(),
                reason: format!("{} numeric components, at most 3 supported", components.len()),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            components,
            suffix,
        })
    }

    /// The original identifier string, suitable as a filename stem.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of dot-separated numeric components (1 to 3).
    #[must_use]
    pub fn arity(&self) -> usize {
        self.components.len()
    }

    /// Collapse the numeric components into the single weighted integer used
    /// for ordering.
    ///
    /// Non-leading components occupy two decimal digits each; values of 100
    /// or more there are rejected rather than allowed to collide with the
    /// neighboring slot. The leading component is bounded only by what the
    /// weighted integer can hold: a major large enough to overflow the
    /// multiplication is rejected with the same typed error, never wrapped.
    fn weighted(&self) -> Result<u64, UpsyncError> {
        for &component in &self.components[1..] {
            if component >= 100 {
                return Err(UpsyncError::VersionComponentTooLarge {
                    version: self.raw.clone(),
                    component,
                });
            }
        }
        let weighted = match self.components[..] {
            [major] => Some(major),
            [major, minor] => major.checked_mul(100).and_then(|w| w.checked_add(minor)),
            // minor and patch are < 100 here, so only the major multiply
            // and the final adds can overflow.
            [major, minor, patch] => major
                .checked_mul(10000)
                .and_then(|w| w.checked_add(minor * 100))
                .and_then(|w| w.checked_add(patch)),
            _ => unreachable!("arity is validated at parse time"),
        };
        weighted.ok_or_else(|| UpsyncError::VersionComponentTooLarge {
            version: self.raw.clone(),
            component: self.components[0],
        })
    }

    /// Order this version against another of the same arity.
    ///
    /// # Errors
    ///
    /// Returns [`UpsyncError::IncomparableVersions`] when the arities differ,
    /// and [`UpsyncError::VersionComponentTooLarge`] when a non-leading
    /// component overflows its weight slot.
    pub fn compare(&self, other: &Self) -> Result<Ordering, UpsyncError> {
        if self.arity() != other.arity() {
            return Err(UpsyncError::IncomparableVersions {
                left: self.raw.clone(),
                right: other.raw.clone(),
            });
        }

        let ordering = self.weighted()?.cmp(&other.weighted()?);
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }

        // Equal numeric weight: a suffixed version outranks the bare one,
        // then suffixes order lexicographically.
        Ok(match (&self.suffix, &other.suffix) {
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
            (Some(a), Some(b)) => a.cmp(b),
        })
    }

    /// Whether this version orders strictly after `other`.
    ///
    /// Convenience wrapper over [`compare`](Self::compare).
    pub fn is_newer_than(&self, other: &Self) -> Result<bool, UpsyncError> {
        Ok(self.compare(other)? == Ordering::Greater)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
