//! Pindrift engine
//!
//! Parses requirement manifest lines, evaluates candidate versions against
//! the declared constraints, and checks that the declared constraints stay
//! inside the advisory range each line tracks.
//!
//! The engine is pure: manifest text in, [`ManifestReport`] out. It performs
//! no I/O and holds no state between passes.
//!
//! # Example
//!
//! ```
//! use pindrift_engine::{Candidates, DriftStatus, Engine};
//!
//! let manifest = "sphinx==1.5.5  # sphinx.filter: >=1.3, <1.6\n";
//! let mut candidates = Candidates::new();
//! candidates.insert_str("Sphinx", "1.5.5").unwrap();
//!
//! let report = Engine::new().check_manifest(manifest, Some(&candidates));
//! assert_eq!(report.entries.len(), 1);
//! assert_eq!(report.summary.drifted, 0);
//! assert_eq!(report.entries[0].drift(), Some(DriftStatus::Aligned));
//! ```

pub mod constraint;
pub mod drift;
pub mod engine;
pub mod evaluator;
pub mod report;
pub mod requirement;
pub mod version;

pub use constraint::{Constraint, ConstraintOperator};
pub use drift::{check_drift, inspect_drift, DriftCheck, DriftStatus};
pub use engine::{Candidates, Engine, EngineOptions};
pub use evaluator::{bounds, effective_range, satisfies, VersionRange};
pub use report::{
    EntryOutcome, Evaluation, ManifestReport, ReportBuilder, ReportEntry, ReportError,
    ReportSummary,
};
pub use requirement::{parse_line, AdvisoryAnnotation, ParsedLine, ParsedRequirement, Requirement};
pub use version::VersionNumber;

use serde::Serialize;

/// Engine errors
///
/// Every failure is a deterministic function of the input text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Malformed version '{text}': {reason}")]
    MalformedVersion { text: String, reason: String },

    #[error("Unsupported pre-release or local version '{text}'")]
    UnsupportedPreRelease { text: String },

    #[error("Malformed requirement: {0}")]
    MalformedRequirement(String),

    #[error("Malformed annotation: {0}")]
    MalformedAnnotation(String),

    #[error("Compatible-release operator needs at least major.minor, got '{0}'")]
    InvalidCompatibleVersion(String),
}

/// Stable error classification used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedVersion,
    UnsupportedPreRelease,
    MalformedRequirement,
    MalformedAnnotation,
    InvalidCompatibleVersion,
}

impl EngineError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MalformedVersion { .. } => ErrorKind::MalformedVersion,
            EngineError::UnsupportedPreRelease { .. } => ErrorKind::UnsupportedPreRelease,
            EngineError::MalformedRequirement(_) => ErrorKind::MalformedRequirement,
            EngineError::MalformedAnnotation(_) => ErrorKind::MalformedAnnotation,
            EngineError::InvalidCompatibleVersion(_) => ErrorKind::InvalidCompatibleVersion,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::MalformedVersion => "malformed-version",
            ErrorKind::UnsupportedPreRelease => "unsupported-pre-release",
            ErrorKind::MalformedRequirement => "malformed-requirement",
            ErrorKind::MalformedAnnotation => "malformed-annotation",
            ErrorKind::InvalidCompatibleVersion => "invalid-compatible-version",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
