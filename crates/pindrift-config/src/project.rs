//! Project Configuration (pindrift.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Project configuration from pindrift.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Engine tuning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineSection>,

    /// Report rendering and review policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSection>,

    /// Candidate versions to test, by package name
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub candidates: BTreeMap<String, String>,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Manifests with at least this many lines are checked in parallel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_threshold: Option<usize>,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Output format (default: text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    /// Exit non-zero when any entry drifted (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_on_drift: Option<bool>,

    /// Exit non-zero when any line is malformed (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_on_malformed: Option<bool>,
}

/// Report output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "report.format".to_string(),
                reason: format!("unknown format '{}' (expected text or json)", other),
            }),
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    ///
    /// Candidate versions stay strings here; the engine parses them.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, version) in &self.candidates {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "candidates".to_string(),
                    reason: "package name cannot be empty".to_string(),
                });
            }
            if version.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("candidates.{}", name),
                    reason: "version cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn parallel_threshold(&self) -> Option<usize> {
        self.engine.as_ref().and_then(|e| e.parallel_threshold)
    }

    pub fn format(&self) -> Option<ReportFormat> {
        self.report.as_ref().and_then(|r| r.format)
    }

    pub fn fail_on_drift(&self) -> Option<bool> {
        self.report.as_ref().and_then(|r| r.fail_on_drift)
    }

    pub fn fail_on_malformed(&self) -> Option<bool> {
        self.report.as_ref().and_then(|r| r.fail_on_malformed)
    }
}
