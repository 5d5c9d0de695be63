//! Configuration Loader
//!
//! Finds `pindrift.toml`, applies environment overrides and exposes the
//! effective settings with their defaults filled in.

use crate::project::{ProjectConfig, ReportFormat};
use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// File name searched for by [`ConfigLoader::load_from_directory`]
pub const CONFIG_FILE_NAME: &str = "pindrift.toml";

const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Built-in defaults
/// 2. Project config (pindrift.toml)
/// 3. Environment variables (PINDRIFT_*)
/// 4. CLI flags (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader;

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Project configuration after environment overrides
    pub project: ProjectConfig,

    /// Directory holding the pindrift.toml that was loaded
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find pindrift.toml. A missing file is
    /// not an error: defaults plus environment overrides are returned.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_config(start_dir)?;
        let project = self.apply_env_overrides(project)?;

        Ok(Config {
            project,
            project_root,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let project = self.apply_env_overrides(project)?;

        Ok(Config {
            project,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Recognised variables:
    /// - `PINDRIFT_PARALLEL_THRESHOLD` (non-negative integer)
    /// - `PINDRIFT_FORMAT` (`text` or `json`)
    /// - `PINDRIFT_FAIL_ON_DRIFT` (`true`/`1`/`yes` or anything else for false)
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(threshold) = env::var("PINDRIFT_PARALLEL_THRESHOLD") {
            let threshold =
                threshold
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "PINDRIFT_PARALLEL_THRESHOLD".to_string(),
                        reason: format!("'{}' is not a non-negative integer", threshold),
                    })?;
            config
                .engine
                .get_or_insert_with(Default::default)
                .parallel_threshold = Some(threshold);
        }

        if let Ok(format) = env::var("PINDRIFT_FORMAT") {
            config.report.get_or_insert_with(Default::default).format = Some(format.parse()?);
        }

        if let Ok(fail) = env::var("PINDRIFT_FAIL_ON_DRIFT") {
            let fail = matches!(fail.to_lowercase().as_str(), "true" | "1" | "yes");
            config
                .report
                .get_or_insert_with(Default::default)
                .fail_on_drift = Some(fail);
        }

        Ok(config)
    }
}

impl Config {
    pub fn parallel_threshold(&self) -> usize {
        self.project
            .parallel_threshold()
            .unwrap_or(DEFAULT_PARALLEL_THRESHOLD)
    }

    pub fn format(&self) -> ReportFormat {
        self.project.format().unwrap_or_default()
    }

    pub fn fail_on_drift(&self) -> bool {
        self.project.fail_on_drift().unwrap_or(true)
    }

    pub fn fail_on_malformed(&self) -> bool {
        self.project.fail_on_malformed().unwrap_or(true)
    }

    /// Candidate versions as written in the config
    pub fn candidates(&self) -> &BTreeMap<String, String> {
        &self.project.candidates
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a pindrift.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
