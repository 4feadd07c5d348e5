//! Check command implementation

use anyhow::{Context, Result};
use sg_core::{AccessChecker, DatasetCatalog};

use crate::cli::{GlobalArgs, OutputFormat, SqlArgs};
use crate::commands::common::{check_failed, load_config, print_json, read_sql};

/// Execute the check command
pub(crate) fn execute(args: &SqlArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let catalog =
        DatasetCatalog::load(&global.project_dir, &config).context("Failed to load datasets")?;
    if global.verbose {
        eprintln!("[verbose] Loaded {} dataset(s)", catalog.len());
    }

    let sql = read_sql(args)?;
    let report = AccessChecker::new(&catalog, &config).check(&sql, args.dialect.as_deref());

    match args.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("{}", if report.allowed { "ALLOWED" } else { "DENIED" });
            for table in &report.tables {
                println!("  table: {}", table.full_name);
            }
            for violation in &report.violations {
                println!("  violation: {}", violation);
            }
        }
    }

    if !report.allowed {
        return Err(check_failed());
    }
    Ok(())
}
