//! Wildcards command implementation

use anyhow::Result;
use sg_sql::validate_wildcard_usage;

use crate::cli::{GlobalArgs, OutputFormat, SqlArgs};
use crate::commands::common::{check_failed, load_config, print_json, read_sql};

/// Execute the wildcards command
pub(crate) fn execute(args: &SqlArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let sql = read_sql(args)?;
    let result = validate_wildcard_usage(&sql, config.dialect_for(args.dialect.as_deref()));

    match args.output {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => match &result.error {
            None => println!("ok"),
            Some(error) => println!("{}", error),
        },
    }

    if !result.is_valid {
        return Err(check_failed());
    }
    Ok(())
}
