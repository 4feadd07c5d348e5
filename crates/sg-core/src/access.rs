//! Access decisions for a query against the dataset catalog
//!
//! A query is allowed only when it parses, is read-only, does not expand `*`
//! over a physical table (unless the config tolerates it), touches only
//! tables the catalog knows and reads only columns those datasets list.

use crate::catalog::DatasetCatalog;
use crate::config::Config;
use serde::{Deserialize, Serialize};
use sg_sql::{normalize_table_identifier, parse_table_reference, ParsedTable, QueryAnalysis};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// One reason a query was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    ParseFailure { message: String },
    NotReadOnly { query_type: String, message: String },
    WildcardOnPhysicalTable { tables: Vec<String> },
    TableNotPermitted { table: String },
    ColumnNotPermitted { table: String, column: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ParseFailure { message } => write!(f, "parse failure: {}", message),
            Violation::NotReadOnly { message, .. } => f.write_str(message),
            Violation::WildcardOnPhysicalTable { tables } => {
                write!(f, "SELECT * on physical table(s): {}", tables.join(", "))
            }
            Violation::TableNotPermitted { table } => {
                write!(f, "table '{}' is not covered by any dataset", table)
            }
            Violation::ColumnNotPermitted { table, column } => {
                write!(f, "column '{}' is not permitted on table '{}'", column, table)
            }
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub allowed: bool,
    /// Physical tables the query reads
    pub tables: Vec<ParsedTable>,
    pub violations: Vec<Violation>,
}

impl AccessReport {
    fn new(tables: Vec<ParsedTable>, violations: Vec<Violation>) -> Self {
        Self {
            allowed: violations.is_empty(),
            tables,
            violations,
        }
    }
}

/// Checks queries against a loaded catalog.
pub struct AccessChecker<'a> {
    catalog: &'a DatasetCatalog,
    config: &'a Config,
}

impl<'a> AccessChecker<'a> {
    pub fn new(catalog: &'a DatasetCatalog, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    /// Parse and check `sql`. A dialect given here wins over the configured one.
    pub fn check(&self, sql: &str, dialect: Option<&str>) -> AccessReport {
        match QueryAnalysis::analyze(sql, self.config.dialect_for(dialect)) {
            Ok(analysis) => self.evaluate(&analysis),
            Err(err) => {
                log::debug!("Access denied, SQL did not parse: {}", err);
                AccessReport::new(
                    Vec::new(),
                    vec![Violation::ParseFailure {
                        message: err.to_string(),
                    }],
                )
            }
        }
    }

    /// Decide on an analysis that has already been produced.
    pub fn evaluate(&self, analysis: &QueryAnalysis) -> AccessReport {
        let mut violations = Vec::new();

        if !analysis.read_only.is_read_only {
            violations.push(Violation::NotReadOnly {
                query_type: analysis.read_only.query_type.clone().unwrap_or_default(),
                message: analysis.read_only.error.clone().unwrap_or_default(),
            });
        }

        if !analysis.wildcards.is_valid && !self.config.allow_wildcards {
            violations.push(Violation::WildcardOnPhysicalTable {
                tables: analysis.wildcards.blocked_tables.clone(),
            });
        }

        let mut denied = HashSet::new();
        for table in &analysis.tables {
            if self.catalog.find(table).is_none() {
                denied.insert(normalize_table_identifier(table));
                violations.push(Violation::TableNotPermitted {
                    table: table.full_name.clone(),
                });
            }
        }

        if self.config.enforce_columns {
            for (key, columns) in &analysis.columns {
                let table = parse_table_reference(key);
                if denied.contains(&normalize_table_identifier(&table)) {
                    continue;
                }
                let allowed: BTreeSet<&str> = self
                    .catalog
                    .find_all(&table)
                    .flat_map(|ds| ds.allowed_columns.iter().map(String::as_str))
                    .collect();
                violations.extend(
                    columns
                        .iter()
                        .filter(|column| !allowed.contains(column.as_str()))
                        .map(|column| Violation::ColumnNotPermitted {
                            table: key.clone(),
                            column: column.clone(),
                        }),
                );
            }
        }

        let report = AccessReport::new(analysis.tables.clone(), violations);
        log::debug!(
            "Access {} with {} violation(s)",
            if report.allowed { "allowed" } else { "denied" },
            report.violations.len()
        );
        report
    }
}

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;
