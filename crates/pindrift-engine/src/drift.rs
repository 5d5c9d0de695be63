//! Advisory-range drift detection
//!
//! A requirement has drifted when the range its literal constraints allow is
//! not fully contained in the `[low, high)` range its annotation tracks.

use crate::evaluator::{effective_range, VersionRange};
use crate::requirement::Requirement;
use crate::Result;
use serde::Serialize;

/// Relationship between the declared constraints and the tracked range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    /// Effective range lies inside the advisory range
    Aligned,
    /// Effective range reaches outside the advisory range
    Drifted,
    /// No parsed annotation to compare against
    NoAnnotation,
    /// A `!=` constraint has no interval form
    NotComparable,
}

impl std::fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DriftStatus::Aligned => "aligned",
            DriftStatus::Drifted => "drifted",
            DriftStatus::NoAnnotation => "no-annotation",
            DriftStatus::NotComparable => "not-comparable",
        };
        f.write_str(name)
    }
}

/// Drift status with the ranges it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftCheck {
    pub status: DriftStatus,
    /// `None` when a `!=` constraint prevents an interval form
    pub effective: Option<VersionRange>,
    pub advisory: Option<VersionRange>,
}

/// Compare the requirement's effective range with its annotation
pub fn inspect_drift(requirement: &Requirement) -> Result<DriftCheck> {
    let effective = effective_range(requirement)?;
    let advisory = requirement
        .annotation
        .as_ref()
        .map(|a| VersionRange::half_open(a.low.clone(), a.high.clone()));

    let status = match (&effective, &advisory) {
        (_, None) => DriftStatus::NoAnnotation,
        (None, Some(_)) => DriftStatus::NotComparable,
        (Some(effective), Some(advisory)) if effective.is_subset_of(advisory) => {
            DriftStatus::Aligned
        }
        (Some(_), Some(_)) => DriftStatus::Drifted,
    };

    if status == DriftStatus::Drifted {
        if let (Some(effective), Some(advisory)) = (&effective, &advisory) {
            log::debug!(
                "{}: effective range {} escapes advisory range {}",
                requirement.name,
                effective,
                advisory
            );
        }
    }

    Ok(DriftCheck {
        status,
        effective,
        advisory,
    })
}

/// Drift status of one requirement
pub fn check_drift(requirement: &Requirement) -> Result<DriftStatus> {
    inspect_drift(requirement).map(|check| check.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use rstest::rstest;

    fn status(line: &str) -> DriftStatus {
        check_drift(&Requirement::parse(line).unwrap()).unwrap()
    }

    #[rstest]
    #[case("sphinx==1.5.5  # sphinx.filter: >=1.3, <1.6", DriftStatus::Aligned)]
    #[case("sphinx>=1.5.5  # sphinx.filter: >=1.3, <1.6", DriftStatus::Drifted)]
    #[case("sphinx>=1.3, <1.6  # sphinx.filter: >=1.3, <1.6", DriftStatus::Aligned)]
    #[case("sphinx>=1.3, <=1.6  # sphinx.filter: >=1.3, <1.6", DriftStatus::Drifted)]
    #[case("sphinx>=1.2, <1.6  # sphinx.filter: >=1.3, <1.6", DriftStatus::Drifted)]
    #[case("sphinx<1.6  # sphinx.filter: >=1.3, <1.6", DriftStatus::Drifted)]
    #[case("sphinx~=1.5.1  # sphinx.filter: >=1.3, <1.6", DriftStatus::Aligned)]
    #[case("sphinx~=1.5.1  # sphinx.filter: >=1.3, <1.5.9", DriftStatus::Drifted)]
    #[case("django>=4.2, <5.2  # django.filter: >=1.3, <5.2", DriftStatus::Aligned)]
    #[case("django>=4.2, <5.3  # django.filter: >=1.3, <5.2", DriftStatus::Drifted)]
    #[case("sphinx  # sphinx.filter: >=1.3, <1.6", DriftStatus::Drifted)]
    fn test_drift_status(#[case] line: &str, #[case] expected: DriftStatus) {
        assert_eq!(status(line), expected);
    }

    #[test]
    fn test_missing_annotation_never_drifts() {
        assert_eq!(status("sphinx>=1.5.5"), DriftStatus::NoAnnotation);
        assert_eq!(status("sphinx>=1.5.5  # pinned for docs"), DriftStatus::NoAnnotation);
        assert_eq!(status("sphinx!=1.5  # pinned for docs"), DriftStatus::NoAnnotation);
    }

    #[test]
    fn test_not_equal_is_not_comparable() {
        assert_eq!(
            status("sphinx>=1.3, !=1.4.2, <1.6  # sphinx.filter: >=1.3, <1.6"),
            DriftStatus::NotComparable
        );
    }

    #[test]
    fn test_contradictory_constraints_are_aligned() {
        assert_eq!(
            status("sphinx>=2, <1  # sphinx.filter: >=1.3, <1.6"),
            DriftStatus::Aligned
        );
    }

    #[test]
    fn test_invalid_compatible_propagates() {
        let requirement = Requirement::parse("sphinx~=1  # sphinx.filter: >=1, <2").unwrap();
        assert_eq!(
            check_drift(&requirement),
            Err(EngineError::InvalidCompatibleVersion("1".to_string()))
        );
    }

    #[test]
    fn test_inspect_exposes_ranges() {
        let requirement =
            Requirement::parse("sphinx>=1.5.5  # sphinx.filter: >=1.3, <1.6").unwrap();
        let check = inspect_drift(&requirement).unwrap();
        assert_eq!(check.effective.unwrap().to_string(), "[1.5.5, *)");
        assert_eq!(check.advisory.unwrap().to_string(), "[1.3, 1.6)");
    }
}
