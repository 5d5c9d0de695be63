//! Satisfies command - test one requirement line against one version

use anyhow::{bail, Context, Result};
use pindrift_engine::{parse_line, Engine, ParsedLine, VersionNumber};

pub fn run(line: &str, version: &str, json: bool) -> Result<()> {
    let parsed = match parse_line(line)? {
        ParsedLine::Requirement(parsed) => parsed,
        ParsedLine::Skip => bail!("'{}' holds no requirement", line),
    };
    for warning in &parsed.warnings {
        eprintln!("warning: {}", warning);
    }

    let candidate = VersionNumber::parse(version)
        .with_context(|| format!("Invalid candidate version '{}'", version))?;
    let requirement = &parsed.requirement;
    let evaluation = Engine::new().evaluate(requirement, Some(&candidate))?;
    let satisfied = evaluation.satisfied.unwrap_or(false);

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        println!(
            "{} {}: {} (drift: {})",
            requirement.name,
            candidate,
            if satisfied { "satisfied" } else { "not satisfied" },
            evaluation.drift
        );
    }

    if !satisfied {
        bail!("{} does not satisfy {}", candidate, requirement);
    }
    Ok(())
}
