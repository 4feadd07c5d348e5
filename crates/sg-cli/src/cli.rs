//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sqlgate - decide whether a SQL query may run against permission-restricted data
#[derive(Parser, Debug)]
#[command(name = "sqlgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Override config file path
    #[arg(short, long, global = true, env = "SQLGATE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the physical tables a query reads
    Tables(SqlArgs),

    /// List the columns a query references, per table
    Columns(ColumnsArgs),

    /// Check that a query only reads data
    ReadOnly(SqlArgs),

    /// Check that a query does not select * from a physical table
    Wildcards(SqlArgs),

    /// Check whether a query-side table reference matches a permission-side one
    Match(MatchArgs),

    /// Show the datasets defined in YAML files or in the project
    Datasets(DatasetsArgs),

    /// Run every check and compare the query against the project's datasets
    Check(SqlArgs),
}

/// Where the SQL comes from and how to parse it
#[derive(Args, Debug, Clone)]
pub struct SqlArgs {
    /// SQL file to read, or `-` for stdin
    #[arg(conflicts_with = "sql")]
    pub file: Option<PathBuf>,

    /// SQL text given inline
    #[arg(short, long)]
    pub sql: Option<String>,

    /// Override SQL dialect
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the columns command
#[derive(Args, Debug)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: SqlArgs,

    /// Fail when the SQL does not parse instead of printing no columns
    #[arg(long)]
    pub fail_closed: bool,
}

/// Arguments for the match command
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Table reference as written in a query
    pub query_table: String,

    /// Table reference from a permission or dataset
    pub permission_table: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the datasets command
#[derive(Args, Debug)]
pub struct DatasetsArgs {
    /// Dataset YAML files to read (default: the project's dataset directories)
    pub files: Vec<PathBuf>,

    /// Only list tables, requiring a schema or database on each
    #[arg(long, requires = "files")]
    pub tables_only: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats shared by every command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
