//! Match command implementation

use anyhow::Result;
use serde::Serialize;
use sg_sql::{parse_table_reference, tables_match, ParsedTable};

use crate::cli::{GlobalArgs, MatchArgs, OutputFormat};
use crate::commands::common::{check_failed, print_json};

#[derive(Debug, Serialize)]
struct MatchResult {
    matches: bool,
    query_table: ParsedTable,
    permission_table: ParsedTable,
}

/// Execute the match command
pub(crate) fn execute(args: &MatchArgs, global: &GlobalArgs) -> Result<()> {
    let query_table = parse_table_reference(&args.query_table);
    let permission_table = parse_table_reference(&args.permission_table);
    if global.verbose {
        eprintln!(
            "[verbose] Comparing '{}' against '{}'",
            query_table, permission_table
        );
    }

    let result = MatchResult {
        matches: tables_match(&query_table, &permission_table),
        query_table,
        permission_table,
    };

    match args.output {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text if result.matches => println!("match"),
        OutputFormat::Text => println!("no match"),
    }

    if !result.matches {
        return Err(check_failed());
    }
    Ok(())
}
