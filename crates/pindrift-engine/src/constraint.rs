//! Comparison constraints (`>=1.3`, `~=1.5.1`, ...)

use crate::version::VersionNumber;
use crate::{EngineError, Result};
use serde::Serialize;

/// Characters that may make up an operator token
const OPERATOR_CHARS: &[char] = &['=', '<', '>', '!', '~'];

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstraintOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    /// Compatible release: same major.minor, at least the stated version
    #[serde(rename = "~=")]
    Compatible,
}

impl ConstraintOperator {
    /// Parse an operator token
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(ConstraintOperator::Eq),
            "!=" => Some(ConstraintOperator::Ne),
            ">=" => Some(ConstraintOperator::Ge),
            ">" => Some(ConstraintOperator::Gt),
            "<=" => Some(ConstraintOperator::Le),
            "<" => Some(ConstraintOperator::Lt),
            "~=" => Some(ConstraintOperator::Compatible),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ConstraintOperator::Eq => "==",
            ConstraintOperator::Ne => "!=",
            ConstraintOperator::Ge => ">=",
            ConstraintOperator::Gt => ">",
            ConstraintOperator::Le => "<=",
            ConstraintOperator::Lt => "<",
            ConstraintOperator::Compatible => "~=",
        }
    }
}

impl std::fmt::Display for ConstraintOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One operator paired with one version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Constraint {
    pub operator: ConstraintOperator,
    pub version: VersionNumber,
}

impl Constraint {
    pub fn new(operator: ConstraintOperator, version: VersionNumber) -> Self {
        Self { operator, version }
    }

    /// Parse a single `<op><version>` term
    ///
    /// Unknown operators and bad versions are reported as
    /// [`EngineError::MalformedRequirement`]; a pre-release version keeps its
    /// own [`EngineError::UnsupportedPreRelease`] classification.
    pub fn parse(term: &str) -> Result<Self> {
        let term = term.trim();
        if term.is_empty() {
            return Err(EngineError::MalformedRequirement(
                "empty constraint term".to_string(),
            ));
        }

        let op_end = term
            .find(|c: char| !OPERATOR_CHARS.contains(&c))
            .unwrap_or(term.len());
        let (symbol, version_text) = term.split_at(op_end);

        if symbol.is_empty() {
            return Err(EngineError::MalformedRequirement(format!(
                "missing operator before '{}'",
                term
            )));
        }

        let operator = ConstraintOperator::from_symbol(symbol).ok_or_else(|| {
            EngineError::MalformedRequirement(format!("unrecognized operator '{}'", symbol))
        })?;

        let version = VersionNumber::parse(version_text).map_err(|e| match e {
            EngineError::UnsupportedPreRelease { .. } => e,
            other => EngineError::MalformedRequirement(format!(
                "invalid version in '{}': {}",
                term, other
            )),
        })?;

        Ok(Self { operator, version })
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}
