//! Manifest-level report aggregation

use crate::constraint::Constraint;
use crate::drift::DriftStatus;
use crate::evaluator::VersionRange;
use crate::requirement::AdvisoryAnnotation;
use crate::{EngineError, ErrorKind};
use serde::Serialize;
use std::collections::HashMap;

/// Evaluation of one requirement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// `None` when no candidate version was supplied for the package
    pub satisfied: Option<bool>,
    pub drift: DriftStatus,
    /// The requirement names no constraints
    pub unconstrained: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_range: Option<VersionRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory_range: Option<VersionRange>,
}

/// Serializable form of an [`EngineError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EngineError> for ReportError {
    fn from(error: &EngineError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<EngineError> for ReportError {
    fn from(error: EngineError) -> Self {
        Self::from(&error)
    }
}

/// Result or error for one line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Evaluated(Evaluation),
    Failed(ReportError),
}

/// One report entry per non-skipped manifest line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// 1-based line number in the manifest
    pub line: usize,
    /// The line as written, trimmed
    pub text: String,
    /// Package name, when the line got far enough to have one
    pub package: Option<String>,
    pub constraints: Vec<Constraint>,
    pub annotation: Option<AdvisoryAnnotation>,
    pub warnings: Vec<String>,
    pub outcome: EntryOutcome,
}

impl ReportEntry {
    pub fn evaluation(&self) -> Option<&Evaluation> {
        match &self.outcome {
            EntryOutcome::Evaluated(evaluation) => Some(evaluation),
            EntryOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ReportError> {
        match &self.outcome {
            EntryOutcome::Failed(error) => Some(error),
            EntryOutcome::Evaluated(_) => None,
        }
    }

    pub fn drift(&self) -> Option<DriftStatus> {
        self.evaluation().map(|e| e.drift)
    }

    pub fn satisfied(&self) -> Option<bool> {
        self.evaluation().and_then(|e| e.satisfied)
    }

    pub fn is_failed(&self) -> bool {
        self.error().is_some()
    }
}

/// Aggregate counts across a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub aligned: usize,
    pub drifted: usize,
    pub no_annotation: usize,
    pub not_comparable: usize,
    pub unconstrained: usize,
    pub satisfied: usize,
    pub unsatisfied: usize,
    /// Entries whose line failed to parse or evaluate
    pub malformed: usize,
    pub warnings: usize,
}

impl ReportSummary {
    fn record(&mut self, entry: &ReportEntry) {
        self.total += 1;
        self.warnings += entry.warnings.len();

        let Some(evaluation) = entry.evaluation() else {
            self.malformed += 1;
            return;
        };

        match evaluation.drift {
            DriftStatus::Aligned => self.aligned += 1,
            DriftStatus::Drifted => self.drifted += 1,
            DriftStatus::NoAnnotation => self.no_annotation += 1,
            DriftStatus::NotComparable => self.not_comparable += 1,
        }
        if evaluation.unconstrained {
            self.unconstrained += 1;
        }
        match evaluation.satisfied {
            Some(true) => self.satisfied += 1,
            Some(false) => self.unsatisfied += 1,
            None => {}
        }
    }
}

/// Complete report for one manifest pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestReport {
    pub entries: Vec<ReportEntry>,
    pub summary: ReportSummary,
}

impl ManifestReport {
    /// True when any entry drifted or failed to parse
    pub fn needs_review(&self) -> bool {
        self.summary.drifted > 0 || self.summary.malformed > 0
    }

    /// Entries with the given drift status
    pub fn with_drift(&self, status: DriftStatus) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.drift() == Some(status))
    }
}

/// Collects entries in line order and computes the summary
#[derive(Debug, Default)]
pub struct ReportBuilder {
    entries: Vec<ReportEntry>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Finish the report
    ///
    /// Entries are ordered by line number. A package listed more than once
    /// gets a warning on every repeat.
    pub fn build(mut self) -> ManifestReport {
        self.entries.sort_by_key(|entry| entry.line);

        let mut first_seen: HashMap<String, usize> = HashMap::new();
        for entry in &mut self.entries {
            let Some(package) = &entry.package else {
                continue;
            };
            match first_seen.get(&package.to_ascii_lowercase()) {
                Some(first) => entry.warnings.push(format!(
                    "duplicate entry for '{}' (first listed on line {})",
                    package, first
                )),
                None => {
                    first_seen.insert(package.to_ascii_lowercase(), entry.line);
                }
            }
        }

        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            summary.record(entry);
        }

        ManifestReport {
            entries: self.entries,
            summary,
        }
    }
}

impl FromIterator<ReportEntry> for ManifestReport {
    fn from_iter<I: IntoIterator<Item = ReportEntry>>(iter: I) -> Self {
        let mut builder = ReportBuilder::new();
        for entry in iter {
            builder.push(entry);
        }
        builder.build()
    }
}

impl std::fmt::Display for ManifestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            match &entry.outcome {
                EntryOutcome::Evaluated(evaluation) => {
                    let satisfied = match evaluation.satisfied {
                        Some(true) => "yes",
                        Some(false) => "no",
                        None => "-",
                    };
                    write!(
                        f,
                        "{:>4}  {:<40} satisfied: {:<3}  drift: {}",
                        entry.line, entry.text, satisfied, evaluation.drift
                    )?;
                    if evaluation.unconstrained {
                        f.write_str("  (unconstrained)")?;
                    }
                    writeln!(f)?;
                    if evaluation.drift == DriftStatus::Drifted {
                        if let (Some(effective), Some(advisory)) =
                            (&evaluation.effective_range, &evaluation.advisory_range)
                        {
                            writeln!(f, "        effective {} not within {}", effective, advisory)?;
                        }
                    }
                }
                EntryOutcome::Failed(error) => {
                    writeln!(f, "{:>4}  {}", entry.line, entry.text)?;
                    writeln!(f, "        error[{}]: {}", error.kind, error.message)?;
                }
            }
            for warning in &entry.warnings {
                writeln!(f, "        warning: {}", warning)?;
            }
        }

        let s = &self.summary;
        write!(
            f,
            "{} entries: {} aligned, {} drifted, {} no-annotation, {} not-comparable, {} malformed, {} unconstrained",
            s.total,
            s.aligned,
            s.drifted,
            s.no_annotation,
            s.not_comparable,
            s.malformed,
            s.unconstrained
        )?;
        if s.satisfied + s.unsatisfied > 0 {
            write!(f, "; {} satisfied, {} unsatisfied", s.satisfied, s.unsatisfied)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluated(line: usize, package: &str, drift: DriftStatus) -> ReportEntry {
        ReportEntry {
            line,
            text: package.to_string(),
            package: Some(package.to_string()),
            constraints: Vec::new(),
            annotation: None,
            warnings: Vec::new(),
            outcome: EntryOutcome::Evaluated(Evaluation {
                satisfied: None,
                drift,
                unconstrained: true,
                effective_range: None,
                advisory_range: None,
            }),
        }
    }

    fn failed(line: usize) -> ReportEntry {
        ReportEntry {
            line,
            text: ">=1.0".to_string(),
            package: None,
            constraints: Vec::new(),
            annotation: None,
            warnings: Vec::new(),
            outcome: EntryOutcome::Failed(
                EngineError::MalformedRequirement("package name cannot be empty".to_string())
                    .into(),
            ),
        }
    }

    #[test]
    fn test_builder_orders_by_line() {
        let mut builder = ReportBuilder::new();
        builder.push(evaluated(5, "b", DriftStatus::Aligned));
        builder.push(failed(2));
        builder.push(evaluated(1, "a", DriftStatus::Drifted));

        let report = builder.build();
        let lines: Vec<usize> = report.entries.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 5]);
    }

    #[test]
    fn test_summary_counts() {
        let report: ManifestReport = vec![
            evaluated(1, "a", DriftStatus::Aligned),
            evaluated(2, "b", DriftStatus::Drifted),
            evaluated(3, "c", DriftStatus::NoAnnotation),
            evaluated(4, "d", DriftStatus::NotComparable),
            failed(5),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            report.summary,
            ReportSummary {
                total: 5,
                aligned: 1,
                drifted: 1,
                no_annotation: 1,
                not_comparable: 1,
                unconstrained: 4,
                satisfied: 0,
                unsatisfied: 0,
                malformed: 1,
                warnings: 0,
            }
        );
        assert!(report.needs_review());
        assert_eq!(report.with_drift(DriftStatus::Drifted).count(), 1);
    }

    #[test]
    fn test_duplicate_packages_warned() {
        let report: ManifestReport = vec![
            evaluated(1, "Sphinx", DriftStatus::NoAnnotation),
            evaluated(3, "sphinx", DriftStatus::NoAnnotation),
        ]
        .into_iter()
        .collect();

        assert!(report.entries[0].warnings.is_empty());
        assert_eq!(
            report.entries[1].warnings,
            vec!["duplicate entry for 'sphinx' (first listed on line 1)".to_string()]
        );
        assert_eq!(report.summary.warnings, 1);
        assert!(!report.needs_review());
    }

    #[test]
    fn test_failed_entry_exposes_error_kind() {
        let entry = failed(1);
        let error = entry.error().unwrap();
        assert_eq!(error.kind, ErrorKind::MalformedRequirement);
        assert_eq!(error.kind.to_string(), "malformed-requirement");
    }
}
