//! Check command - evaluate a requirements manifest and report drift

use anyhow::{bail, Context, Result};
use pindrift_config::{Config, ConfigLoader, ReportFormat, CONFIG_FILE_NAME};
use pindrift_engine::{Candidates, Engine, EngineOptions, ManifestReport};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub manifest: PathBuf,
    /// Raw `name=version` pairs from the command line
    pub candidates: Vec<String>,
    pub json: bool,
    pub config: Option<PathBuf>,
    pub no_fail: bool,
}

/// Check a manifest file and print its report
///
/// Fails when the report needs review and the configured policy says so.
pub fn run(options: &CheckOptions) -> Result<()> {
    let config = load_config(options)?;
    let path = options.manifest.display();

    let source = fs::read_to_string(&options.manifest)
        .with_context(|| format!("Failed to read manifest: {}", path))?;

    let candidates = build_candidates(config.candidates(), &options.candidates)?;
    log::debug!("{} candidate version(s) supplied", candidates.len());

    let engine = Engine::with_options(EngineOptions {
        parallel_threshold: config.parallel_threshold(),
    });
    let report = engine.check_manifest(
        &source,
        (!candidates.is_empty()).then_some(&candidates),
    );

    if options.json || config.format() == ReportFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    if !options.no_fail && fails_policy(&report, &config) {
        bail!(
            "{}: needs review ({} drifted, {} malformed)",
            path,
            report.summary.drifted,
            report.summary.malformed
        );
    }

    Ok(())
}

fn load_config(options: &CheckOptions) -> Result<Config> {
    let loader = ConfigLoader::new();
    if let Some(path) = &options.config {
        return loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }

    let start = match options.manifest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => env::current_dir()?,
    };
    let config = loader
        .load_from_directory(&start)
        .context("Failed to load pindrift.toml")?;
    if !config.is_project() {
        log::debug!(
            "no {} found above {}, using defaults",
            CONFIG_FILE_NAME,
            start.display()
        );
    } else if let Some(root) = config.project_root() {
        log::debug!("using configuration from {}", root.display());
    }
    Ok(config)
}

fn fails_policy(report: &ManifestReport, config: &Config) -> bool {
    (config.fail_on_drift() && report.summary.drifted > 0)
        || (config.fail_on_malformed() && report.summary.malformed > 0)
}

/// Split a `name=version` argument
pub fn parse_candidate(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, version)) if !name.trim().is_empty() && !version.trim().is_empty() => {
            Ok((name.trim().to_string(), version.trim().to_string()))
        }
        _ => bail!("Invalid candidate '{}': expected NAME=VERSION", arg),
    }
}

/// Merge configured candidates with command-line ones (command line wins)
pub fn build_candidates(
    configured: &BTreeMap<String, String>,
    cli: &[String],
) -> Result<Candidates> {
    let mut candidates = Candidates::new();

    for (name, version) in configured {
        candidates
            .insert_str(name, version)
            .with_context(|| format!("Invalid candidate for '{}' in config", name))?;
    }

    for arg in cli {
        let (name, version) = parse_candidate(arg)?;
        candidates
            .insert_str(&name, &version)
            .with_context(|| format!("Invalid candidate '{}'", arg))?;
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidate() {
        assert_eq!(
            parse_candidate("sphinx=1.5.5").unwrap(),
            ("sphinx".to_string(), "1.5.5".to_string())
        );
        assert_eq!(
            parse_candidate(" numpy = 1.20 ").unwrap(),
            ("numpy".to_string(), "1.20".to_string())
        );
        assert!(parse_candidate("sphinx").is_err());
        assert!(parse_candidate("=1.0").is_err());
        assert!(parse_candidate("sphinx=").is_err());
    }

    #[test]
    fn test_cli_candidates_override_config() {
        let mut configured = BTreeMap::new();
        configured.insert("Sphinx".to_string(), "1.4".to_string());
        configured.insert("numpy".to_string(), "1.20".to_string());

        let candidates =
            build_candidates(&configured, &["sphinx=1.5.5".to_string()]).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates.get("sphinx").unwrap().to_string(), "1.5.5");
    }

    #[test]
    fn test_bad_candidate_version() {
        let err = build_candidates(&BTreeMap::new(), &["sphinx=1.5rc1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("sphinx=1.5rc1"));
    }
}
