//! Manifest pass: parse, evaluate and cross-check every line

use crate::drift::inspect_drift;
use crate::evaluator::satisfies;
use crate::report::{EntryOutcome, Evaluation, ManifestReport, ReportEntry};
use crate::requirement::{parse_line, ParsedLine, ParsedRequirement, Requirement};
use crate::version::VersionNumber;
use crate::Result;
use rayon::prelude::*;
use std::collections::HashMap;

/// Candidate versions keyed by case-insensitive package name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    versions: HashMap<String, VersionNumber>,
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate for a package, replacing any earlier one
    pub fn insert(&mut self, package: &str, version: VersionNumber) {
        self.versions.insert(package.to_ascii_lowercase(), version);
    }

    /// Parse and set the candidate for a package
    pub fn insert_str(&mut self, package: &str, version: &str) -> Result<()> {
        let version = VersionNumber::parse(version)?;
        self.insert(package, version);
        Ok(())
    }

    pub fn get(&self, package: &str) -> Option<&VersionNumber> {
        self.versions.get(&package.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Tuning knobs for a manifest pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Manifests with at least this many lines are evaluated in parallel
    pub parallel_threshold: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
        }
    }
}

/// Requirement manifest checker
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Check a whole manifest given as text
    pub fn check_manifest(
        &self,
        manifest: &str,
        candidates: Option<&Candidates>,
    ) -> ManifestReport {
        self.check_lines(manifest.lines(), candidates)
    }

    /// Check a manifest given as individual lines
    ///
    /// Every non-blank, non-comment line yields exactly one entry. Entries
    /// are ordered by line number whatever order they finish in.
    pub fn check_lines<'a, I>(&self, lines: I, candidates: Option<&Candidates>) -> ManifestReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let numbered: Vec<(usize, &str)> = lines
            .into_iter()
            .enumerate()
            .map(|(index, text)| (index + 1, text))
            .collect();

        let entries: Vec<Option<ReportEntry>> =
            if numbered.len() >= self.options.parallel_threshold {
                log::debug!("checking {} lines in parallel", numbered.len());
                numbered
                    .par_iter()
                    .map(|(line, text)| self.check_line(*line, text, candidates))
                    .collect()
            } else {
                numbered
                    .iter()
                    .map(|(line, text)| self.check_line(*line, text, candidates))
                    .collect()
            };

        let report: ManifestReport = entries.into_iter().flatten().collect();
        log::debug!(
            "checked {} entries: {} drifted, {} malformed",
            report.summary.total,
            report.summary.drifted,
            report.summary.malformed
        );
        report
    }

    /// Check one line; `None` for blank and comment lines
    pub fn check_line(
        &self,
        line: usize,
        text: &str,
        candidates: Option<&Candidates>,
    ) -> Option<ReportEntry> {
        let text = text.trim();
        let parsed = match parse_line(text) {
            Ok(ParsedLine::Skip) => return None,
            Ok(ParsedLine::Requirement(parsed)) => parsed,
            Err(e) => {
                log::debug!("line {}: {}", line, e);
                return Some(ReportEntry {
                    line,
                    text: text.to_string(),
                    package: None,
                    constraints: Vec::new(),
                    annotation: None,
                    warnings: Vec::new(),
                    outcome: EntryOutcome::Failed(e.into()),
                });
            }
        };

        let ParsedRequirement {
            requirement,
            mut warnings,
        } = parsed;
        let candidate = candidates.and_then(|c| c.get(&requirement.name));

        let outcome = match self.evaluate(&requirement, candidate) {
            Ok(evaluation) => {
                if let Some(range) = &evaluation.effective_range {
                    if range.is_empty() {
                        warnings.push(format!(
                            "constraints admit no version (effective range {})",
                            range
                        ));
                    }
                }
                log::trace!("line {}: {} is {}", line, requirement.name, evaluation.drift);
                EntryOutcome::Evaluated(evaluation)
            }
            Err(e) => {
                log::debug!("line {}: {}", line, e);
                EntryOutcome::Failed(e.into())
            }
        };

        Some(ReportEntry {
            line,
            text: text.to_string(),
            package: Some(requirement.name),
            constraints: requirement.constraints,
            annotation: requirement.annotation,
            warnings,
            outcome,
        })
    }

    /// Evaluate one requirement against an optional candidate
    pub fn evaluate(
        &self,
        requirement: &Requirement,
        candidate: Option<&VersionNumber>,
    ) -> Result<Evaluation> {
        let check = inspect_drift(requirement)?;
        let satisfied = candidate
            .map(|version| satisfies(requirement, version))
            .transpose()?;

        Ok(Evaluation {
            satisfied,
            drift: check.status,
            unconstrained: requirement.is_unconstrained(),
            effective_range: check.effective,
            advisory_range: check.advisory,
        })
    }
}
