//! Tables command implementation

use anyhow::{Context, Result};
use sg_sql::extract_physical_tables;

use crate::cli::{GlobalArgs, OutputFormat, SqlArgs};
use crate::commands::common::{load_config, print_json, read_sql};

/// Execute the tables command
pub(crate) fn execute(args: &SqlArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let sql = read_sql(args)?;
    let dialect = config.dialect_for(args.dialect.as_deref());

    let tables = extract_physical_tables(&sql, dialect).context("Failed to extract tables")?;
    if global.verbose {
        eprintln!("[verbose] Found {} physical table(s)", tables.len());
    }

    match args.output {
        OutputFormat::Json => print_json(&tables)?,
        OutputFormat::Text => {
            for table in &tables {
                match &table.alias {
                    Some(alias) => println!("{} (as {})", table.full_name, alias),
                    None => println!("{}", table.full_name),
                }
            }
        }
    }
    Ok(())
}
