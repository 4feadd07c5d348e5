//! Columns command implementation

use anyhow::{Context, Result};
use sg_sql::{extract_column_references_with_policy, ColumnParsePolicy};

use crate::cli::{ColumnsArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{load_config, print_json, read_sql};

/// Execute the columns command
pub(crate) fn execute(args: &ColumnsArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let sql = read_sql(&args.input)?;
    let dialect = config.dialect_for(args.input.dialect.as_deref());
    let policy = if args.fail_closed {
        ColumnParsePolicy::FailClosed
    } else {
        config.column_parse_policy
    };

    if global.verbose {
        eprintln!("[verbose] Extracting columns ({:?})", policy);
    }
    let columns = extract_column_references_with_policy(&sql, dialect, policy)
        .context("Failed to extract column references")?;

    match args.input.output {
        OutputFormat::Json => print_json(&columns)?,
        OutputFormat::Text => {
            for (table, names) in &columns {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                println!("{}: {}", table, names.join(", "));
            }
        }
    }
    Ok(())
}
