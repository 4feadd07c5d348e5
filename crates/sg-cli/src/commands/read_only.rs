//! Read-only command implementation

use anyhow::Result;
use sg_sql::check_query_is_read_only;

use crate::cli::{GlobalArgs, OutputFormat, SqlArgs};
use crate::commands::common::{check_failed, load_config, print_json, read_sql};

/// Execute the read-only command
pub(crate) fn execute(args: &SqlArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let sql = read_sql(args)?;
    let check = check_query_is_read_only(&sql, config.dialect_for(args.dialect.as_deref()));

    match args.output {
        OutputFormat::Json => print_json(&check)?,
        OutputFormat::Text if check.is_read_only => println!(
            "read-only ({})",
            check.query_type.as_deref().unwrap_or("select")
        ),
        OutputFormat::Text => println!(
            "not read-only: {}",
            check.error.as_deref().unwrap_or("unknown statement")
        ),
    }

    if !check.is_read_only {
        return Err(check_failed());
    }
    Ok(())
}
