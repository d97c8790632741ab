use std::path::Path;

use {
    anyhow::Result,
    onair_config::{OnairConfig, Severity, ValidationResult, validate},
    tracing::{error, warn},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check(explicit: Option<&Path>) -> Result<()> {
    let (config, path) = onair_config::discover_and_load(explicit)?;
    eprintln!("Checking {}\n", path.display());

    let result = validate(&config);
    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };
        eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Load the config and refuse to continue if it has errors.
pub fn load_validated(explicit: Option<&Path>) -> Result<OnairConfig> {
    let (config, path) = onair_config::discover_and_load(explicit)?;
    let result = validate(&config);
    log_diagnostics(&result);
    if result.has_errors() {
        anyhow::bail!(
            "{} has {} error(s); run `onair check` for details",
            path.display(),
            result.count(Severity::Error)
        );
    }
    Ok(config)
}

fn log_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
        }
    }
}
