//! Constraint evaluation
//!
//! Constraints on one requirement are a conjunction: each one narrows the
//! allowed range. The compatible-release operator is expanded here, never in
//! the parser.

use crate::constraint::{Constraint, ConstraintOperator};
use crate::requirement::Requirement;
use crate::version::VersionNumber;
use crate::{EngineError, Result};
use serde::{Serialize, Serializer};
use std::ops::Bound;

/// Interval of versions with independent lower and upper bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub low: Bound<VersionNumber>,
    pub high: Bound<VersionNumber>,
}

impl VersionRange {
    /// Every version
    pub fn full() -> Self {
        Self {
            low: Bound::Unbounded,
            high: Bound::Unbounded,
        }
    }

    /// `[low, high)`
    pub fn half_open(low: VersionNumber, high: VersionNumber) -> Self {
        Self {
            low: Bound::Included(low),
            high: Bound::Excluded(high),
        }
    }

    /// Exactly one version
    pub fn point(version: VersionNumber) -> Self {
        Self {
            low: Bound::Included(version.clone()),
            high: Bound::Included(version),
        }
    }

    pub fn contains(&self, version: &VersionNumber) -> bool {
        let above = match &self.low {
            Bound::Included(low) => version >= low,
            Bound::Excluded(low) => version > low,
            Bound::Unbounded => true,
        };
        let below = match &self.high {
            Bound::Included(high) => version <= high,
            Bound::Excluded(high) => version < high,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// Tightest range admitted by both
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        VersionRange {
            low: tighter_low(&self.low, &other.low),
            high: tighter_high(&self.high, &other.high),
        }
    }

    /// True when no version can fall inside the range
    pub fn is_empty(&self) -> bool {
        match (&self.low, &self.high) {
            (Bound::Included(low), Bound::Included(high)) => low > high,
            (Bound::Included(low), Bound::Excluded(high))
            | (Bound::Excluded(low), Bound::Included(high))
            | (Bound::Excluded(low), Bound::Excluded(high)) => low >= high,
            _ => false,
        }
    }

    /// True when every version in `self` also lies in `outer`
    pub fn is_subset_of(&self, outer: &VersionRange) -> bool {
        if self.is_empty() {
            return true;
        }

        let low_ok = match (&outer.low, &self.low) {
            (Bound::Unbounded, _) => true,
            (_, Bound::Unbounded) => false,
            (Bound::Excluded(o), Bound::Included(s)) => s > o,
            (Bound::Included(o), Bound::Included(s) | Bound::Excluded(s))
            | (Bound::Excluded(o), Bound::Excluded(s)) => s >= o,
        };
        let high_ok = match (&outer.high, &self.high) {
            (Bound::Unbounded, _) => true,
            (_, Bound::Unbounded) => false,
            (Bound::Excluded(o), Bound::Included(s)) => s < o,
            (Bound::Included(o), Bound::Included(s) | Bound::Excluded(s))
            | (Bound::Excluded(o), Bound::Excluded(s)) => s <= o,
        };
        low_ok && high_ok
    }
}

fn tighter_low(a: &Bound<VersionNumber>, b: &Bound<VersionNumber>) -> Bound<VersionNumber> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            if x > y {
                a.clone()
            } else if y > x {
                b.clone()
            } else if matches!(a, Bound::Excluded(_)) {
                a.clone()
            } else {
                b.clone()
            }
        }
    }
}

fn tighter_high(a: &Bound<VersionNumber>, b: &Bound<VersionNumber>) -> Bound<VersionNumber> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            if x < y {
                a.clone()
            } else if y < x {
                b.clone()
            } else if matches!(a, Bound::Excluded(_)) {
                a.clone()
            } else {
                b.clone()
            }
        }
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.low {
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
            Bound::Unbounded => f.write_str("(*")?,
        }
        f.write_str(", ")?;
        match &self.high {
            Bound::Included(v) => write!(f, "{}]", v),
            Bound::Excluded(v) => write!(f, "{})", v),
            Bound::Unbounded => f.write_str("*)"),
        }
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ceiling of `~=v`: `[major, minor + 1]`
fn compatible_ceiling(version: &VersionNumber) -> Result<VersionNumber> {
    match version.next_minor() {
        Some(ceiling) => Ok(ceiling),
        None if version.segments().len() < 2 => {
            Err(EngineError::InvalidCompatibleVersion(version.to_string()))
        }
        None => Err(EngineError::MalformedVersion {
            text: version.to_string(),
            reason: "minor segment has no successor".to_string(),
        }),
    }
}

/// Interval form of a single constraint
///
/// `!=` has no interval form and yields `None`.
pub fn bounds(constraint: &Constraint) -> Result<Option<VersionRange>> {
    let v = constraint.version.clone();
    let range = match constraint.operator {
        ConstraintOperator::Eq => VersionRange::point(v),
        ConstraintOperator::Ne => return Ok(None),
        ConstraintOperator::Ge => VersionRange {
            low: Bound::Included(v),
            high: Bound::Unbounded,
        },
        ConstraintOperator::Gt => VersionRange {
            low: Bound::Excluded(v),
            high: Bound::Unbounded,
        },
        ConstraintOperator::Le => VersionRange {
            low: Bound::Unbounded,
            high: Bound::Included(v),
        },
        ConstraintOperator::Lt => VersionRange {
            low: Bound::Unbounded,
            high: Bound::Excluded(v),
        },
        ConstraintOperator::Compatible => {
            let ceiling = compatible_ceiling(&v)?;
            VersionRange::half_open(v, ceiling)
        }
    };
    Ok(Some(range))
}

/// Intersection of every constraint on the requirement
///
/// Returns `None` when any constraint is `!=`.
pub fn effective_range(requirement: &Requirement) -> Result<Option<VersionRange>> {
    let mut range = Some(VersionRange::full());
    for constraint in &requirement.constraints {
        let next = bounds(constraint)?;
        range = match (range, next) {
            (Some(acc), Some(next)) => Some(acc.intersect(&next)),
            _ => None,
        };
    }
    Ok(range)
}

/// Test one constraint against a candidate
pub fn matches(constraint: &Constraint, candidate: &VersionNumber) -> Result<bool> {
    let v = &constraint.version;
    Ok(match constraint.operator {
        ConstraintOperator::Eq => candidate == v,
        ConstraintOperator::Ne => candidate != v,
        ConstraintOperator::Ge => candidate >= v,
        ConstraintOperator::Gt => candidate > v,
        ConstraintOperator::Le => candidate <= v,
        ConstraintOperator::Lt => candidate < v,
        ConstraintOperator::Compatible => {
            let ceiling = compatible_ceiling(v)?;
            candidate >= v && *candidate < ceiling
        }
    })
}

/// True iff the candidate satisfies every constraint
///
/// Every constraint is checked, so an invalid `~=` surfaces even when an
/// earlier constraint already rejects the candidate.
pub fn satisfies(requirement: &Requirement, candidate: &VersionNumber) -> Result<bool> {
    requirement
        .constraints
        .iter()
        .try_fold(true, |acc, constraint| -> Result<bool> {
            Ok(matches(constraint, candidate)? && acc)
        })
}
