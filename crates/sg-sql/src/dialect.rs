//! SQL dialect resolution
//!
//! Data sources declare their SQL syntax family as free text ("postgres",
//! "mssql", "redshift", ...). This module maps those names onto the grammars
//! the parser understands, defaulting to PostgreSQL when the name is absent
//! or unknown so that every query can still be parsed.

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    BigQueryDialect, Dialect, DuckDbDialect, GenericDialect, HiveDialect, MsSqlDialect,
    MySqlDialect, PostgreSqlDialect, SQLiteDialect, SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};

use crate::error::{ParseFailureKind, SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let from_tokenizer = matches!(e, ParserError::TokenizerError(_));
            let message = e.to_string();
            let (line, column) = parse_location_from_error(&message);
            let kind = ParseFailureKind::classify(&message, from_tokenizer);
            SqlError::Syntax {
                dialect: self.name().to_string(),
                hint: kind.hint(self.name()),
                kind,
                message,
                line,
                column,
            }
        })
    }
}

/// Parse line and column from sqlparser error message.
///
/// sqlparser's `ParserError` is a simple string wrapper with no structured
/// location data, so we extract "Line: N, Column: M" from the error message text.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (0, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let Ok(column) = msg[col_start..col_end].trim().parse::<usize>() else {
        return (0, 0);
    };
    (line, column)
}

/// A grammar the parser can interpret SQL with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// PostgreSQL, also used for Redshift and Athena, and the fallback for unknown names
    #[default]
    PostgreSql,
    MySql,
    MariaDb,
    Sqlite,
    BigQuery,
    Snowflake,
    /// SQL Server / Azure SQL
    TransactSql,
    FlinkSql,
    Hive,
    Db2,
    DuckDb,
}

/// Case-insensitive data-source syntax names and the grammar each one parses with.
const DIALECT_ALIASES: &[(&str, Grammar)] = &[
    ("postgresql", Grammar::PostgreSql),
    ("postgres", Grammar::PostgreSql),
    ("redshift", Grammar::PostgreSql),
    ("athena", Grammar::PostgreSql),
    ("mysql", Grammar::MySql),
    ("noql", Grammar::MySql),
    ("mariadb", Grammar::MariaDb),
    ("sqlite", Grammar::Sqlite),
    ("bigquery", Grammar::BigQuery),
    ("snowflake", Grammar::Snowflake),
    ("transactsql", Grammar::TransactSql),
    ("mssql", Grammar::TransactSql),
    ("sqlserver", Grammar::TransactSql),
    ("flinksql", Grammar::FlinkSql),
    ("hive", Grammar::Hive),
    ("db2", Grammar::Db2),
    ("duckdb", Grammar::DuckDb),
];

impl Grammar {
    /// Look up a data-source syntax name, returning `None` when it is unknown.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        DIALECT_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(wanted))
            .map(|(_, grammar)| *grammar)
    }

    /// Resolve an optional syntax hint, falling back to PostgreSQL.
    pub fn resolve(hint: Option<&str>) -> Self {
        let Some(name) = hint.filter(|h| !h.trim().is_empty()) else {
            return Grammar::default();
        };
        match Self::from_name(name) {
            Some(grammar) => grammar,
            None => {
                log::warn!(
                    "Unknown SQL dialect '{}', parsing with {}",
                    name,
                    Grammar::default().name()
                );
                Grammar::default()
            }
        }
    }

    /// All grammars, in declaration order.
    pub fn all() -> &'static [Grammar] {
        &[
            Grammar::PostgreSql,
            Grammar::MySql,
            Grammar::MariaDb,
            Grammar::Sqlite,
            Grammar::BigQuery,
            Grammar::Snowflake,
            Grammar::TransactSql,
            Grammar::FlinkSql,
            Grammar::Hive,
            Grammar::Db2,
            Grammar::DuckDb,
        ]
    }
}

impl SqlDialect for Grammar {
    fn parser_dialect(&self) -> &dyn Dialect {
        match self {
            Grammar::PostgreSql => &PostgreSqlDialect {},
            Grammar::MySql | Grammar::MariaDb => &MySqlDialect {},
            Grammar::Sqlite => &SQLiteDialect {},
            Grammar::BigQuery => &BigQueryDialect {},
            Grammar::Snowflake => &SnowflakeDialect {},
            Grammar::TransactSql => &MsSqlDialect {},
            Grammar::Hive => &HiveDialect {},
            Grammar::FlinkSql | Grammar::Db2 => &GenericDialect {},
            Grammar::DuckDb => &DuckDbDialect {},
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Grammar::PostgreSql => "postgresql",
            Grammar::MySql => "mysql",
            Grammar::MariaDb => "mariadb",
            Grammar::Sqlite => "sqlite",
            Grammar::BigQuery => "bigquery",
            Grammar::Snowflake => "snowflake",
            Grammar::TransactSql => "transactsql",
            Grammar::FlinkSql => "flinksql",
            Grammar::Hive => "hive",
            Grammar::Db2 => "db2",
            Grammar::DuckDb => "duckdb",
        }
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
