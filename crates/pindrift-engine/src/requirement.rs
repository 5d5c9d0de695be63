//! Requirement line parsing
//!
//! Grammar of one manifest line:
//!
//! ```text
//! <name> <op><version>[, <op><version>...] [# <tag>.filter: >=<low>, <<high>]
//! ```
//!
//! Blank lines and pure comments are skipped. The annotation tag is an open
//! vocabulary; any identifier followed by `.filter:` is accepted.

use crate::constraint::{Constraint, ConstraintOperator};
use crate::version::VersionNumber;
use crate::{EngineError, Result};
use serde::Serialize;

const FILTER_MARKER: &str = ".filter:";
const OPERATOR_CHARS: &[char] = &['=', '<', '>', '!', '~'];

/// Tracked range a requirement is supposed to stay within: `[low, high)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvisoryAnnotation {
    /// Tracking policy that produced the range
    pub source: String,
    /// Inclusive lower bound
    pub low: VersionNumber,
    /// Exclusive upper bound
    pub high: VersionNumber,
}

impl AdvisoryAnnotation {
    /// Parse the text of a trailing comment (without the leading `#`)
    ///
    /// Returns `Ok(None)` when the comment carries no `.filter:` marker.
    pub fn parse(comment: &str) -> Result<Option<Self>> {
        let comment = comment.trim();
        let Some(marker) = comment.find(FILTER_MARKER) else {
            return Ok(None);
        };

        let before = &comment[..marker];
        let source = if before.ends_with(char::is_whitespace) {
            ""
        } else {
            before.split_whitespace().next_back().unwrap_or("")
        };
        if !is_identifier(source) {
            return Err(EngineError::MalformedAnnotation(format!(
                "invalid annotation tag '{}'",
                source
            )));
        }

        let terms = comment[marker + FILTER_MARKER.len()..]
            .split(',')
            .map(|term| {
                Constraint::parse(term).map_err(|e| {
                    EngineError::MalformedAnnotation(format!(
                        "bad term '{}': {}",
                        term.trim(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (low, high) = match terms.as_slice() {
            [a, b] => match (a.operator, b.operator) {
                (ConstraintOperator::Ge, ConstraintOperator::Lt) => (&a.version, &b.version),
                (ConstraintOperator::Lt, ConstraintOperator::Ge) => (&b.version, &a.version),
                _ => return Err(bounds_shape_error(&terms)),
            },
            _ => return Err(bounds_shape_error(&terms)),
        };

        if low >= high {
            return Err(EngineError::MalformedAnnotation(format!(
                "empty range [{}, {})",
                low, high
            )));
        }

        Ok(Some(Self {
            source: source.to_string(),
            low: low.clone(),
            high: high.clone(),
        }))
    }
}

fn bounds_shape_error(terms: &[Constraint]) -> EngineError {
    let written = terms
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    EngineError::MalformedAnnotation(format!(
        "expected one '>=' and one '<' term, found '{}'",
        written
    ))
}

impl std::fmt::Display for AdvisoryAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} >={}, <{}",
            self.source, FILTER_MARKER, self.low, self.high
        )
    }
}

/// One package's declared constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Package name as written
    pub name: String,
    /// All must hold
    pub constraints: Vec<Constraint>,
    pub annotation: Option<AdvisoryAnnotation>,
}

impl Requirement {
    /// Parse a line that must contain a requirement
    ///
    /// Annotation problems are dropped silently here; use [`parse_line`] to
    /// see them as warnings.
    pub fn parse(text: &str) -> Result<Self> {
        match parse_line(text)? {
            ParsedLine::Requirement(parsed) => Ok(parsed.requirement),
            ParsedLine::Skip => Err(EngineError::MalformedRequirement(
                "line holds no requirement".to_string(),
            )),
        }
    }

    /// Case-insensitive package key
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        let terms = self
            .constraints
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        f.write_str(&terms.join(", "))?;
        if let Some(annotation) = &self.annotation {
            write!(f, "  # {}", annotation)?;
        }
        Ok(())
    }
}

/// A requirement together with non-fatal parse warnings
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequirement {
    pub requirement: Requirement,
    pub warnings: Vec<String>,
}

/// Outcome of parsing one line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Blank or comment-only
    Skip,
    Requirement(ParsedRequirement),
}

/// Parse one manifest line
pub fn parse_line(text: &str) -> Result<ParsedLine> {
    let line = text.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ParsedLine::Skip);
    }

    let (body, comment) = match line.split_once('#') {
        Some((body, comment)) => (body.trim(), Some(comment)),
        None => (line, None),
    };

    let name_end = body
        .find(|c: char| c.is_whitespace() || OPERATOR_CHARS.contains(&c))
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_end);
    validate_name(name)?;

    let rest = rest.trim();
    let constraints = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',')
            .map(Constraint::parse)
            .collect::<Result<Vec<_>>>()?
    };

    let mut warnings = Vec::new();
    let annotation = match comment.map(AdvisoryAnnotation::parse).transpose() {
        Ok(annotation) => annotation.flatten(),
        Err(e) => {
            log::warn!("{}: annotation ignored: {}", name, e);
            warnings.push(e.to_string());
            None
        }
    };

    log::trace!(
        "parsed {} with {} constraint(s), annotation: {}",
        name,
        constraints.len(),
        annotation.is_some()
    );

    Ok(ParsedLine::Requirement(ParsedRequirement {
        requirement: Requirement {
            name: name.to_string(),
            constraints,
            annotation,
        },
        warnings,
    }))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::MalformedRequirement(
            "package name cannot be empty".to_string(),
        ));
    }
    if !is_identifier(name) {
        return Err(EngineError::MalformedRequirement(format!(
            "invalid package name '{}'",
            name
        )));
    }
    Ok(())
}

/// Letters, digits, `-`, `_` and `.`, starting and ending alphanumeric
fn is_identifier(s: &str) -> bool {
    let (Some(first), Some(last)) = (s.chars().next(), s.chars().last()) else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
