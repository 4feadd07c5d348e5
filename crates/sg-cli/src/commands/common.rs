//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use sg_core::{Config, CONFIG_FILE_NAMES};
use std::fmt;
use std::io::Read;

use crate::cli::{GlobalArgs, SqlArgs};

/// Error type representing a non-zero process exit code.
///
/// Commands return `Err(ExitCode(N).into())` when a check fails so that
/// `main` can exit with that status without printing an error.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only, never shown to the user.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Exit status for a check that ran and failed.
pub(crate) fn check_failed() -> anyhow::Error {
    ExitCode(1).into()
}

/// Read the query text from `--sql`, a file, or stdin (`-` or no file).
pub(crate) fn read_sql(args: &SqlArgs) -> Result<String> {
    if let Some(sql) = &args.sql {
        return Ok(sql.clone());
    }
    match &args.file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read SQL file: {}", path.display())),
        _ => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .context("Failed to read SQL from stdin")?;
            Ok(sql)
        }
    }
}

/// Load the config named by `--config`, else the project's config file.
///
/// A project without a config file runs with defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    if let Some(path) = &global.config {
        if global.verbose {
            eprintln!("[verbose] Loading config from {}", path.display());
        }
        return Config::load(path).context("Failed to load config");
    }

    let has_config = CONFIG_FILE_NAMES
        .iter()
        .any(|name| global.project_dir.join(name).exists());
    if !has_config {
        if global.verbose {
            eprintln!(
                "[verbose] No config in {}, using defaults",
                global.project_dir.display()
            );
        }
        return Ok(Config::default());
    }

    Config::load_from_dir(&global.project_dir).context("Failed to load config")
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
