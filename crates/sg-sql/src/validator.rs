//! Read-only query validation

use serde::{Deserialize, Serialize};
use sqlparser::ast::{Query, SetExpr, Statement};

use crate::parser::SqlParser;

/// Outcome of a read-only check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOnlyCheck {
    pub is_read_only: bool,
    /// Lower-cased statement type (`select`, `insert`, `create`, ...);
    /// absent when the SQL did not parse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadOnlyCheck {
    fn read_only() -> Self {
        Self {
            is_read_only: true,
            query_type: Some("select".to_string()),
            error: None,
        }
    }

    fn rejected(statement_type: &str) -> Self {
        Self {
            is_read_only: false,
            query_type: Some(statement_type.to_lowercase()),
            error: Some(format!(
                "Query type '{}' is not allowed. Only SELECT statements are permitted for read-only access.",
                statement_type
            )),
        }
    }

    /// A parse failure is never read-only.
    pub fn parse_failure(message: impl std::fmt::Display) -> Self {
        Self {
            is_read_only: false,
            query_type: None,
            error: Some(format!(
                "Failed to parse SQL for query type check: {}",
                message
            )),
        }
    }
}

/// Parse `sql` and check that every statement only reads data.
pub fn check_query_is_read_only(sql: &str, dialect: Option<&str>) -> ReadOnlyCheck {
    match SqlParser::from_dialect_hint(dialect).parse(sql) {
        Ok(statements) => check_statements_read_only(&statements),
        Err(err) => ReadOnlyCheck::parse_failure(err),
    }
}

/// Check already-parsed statements.
///
/// Only queries pass. A query whose body or CTEs modify data
/// (`WITH ... INSERT`, `SELECT ... INTO`) is rejected like the
/// corresponding DML statement.
pub fn check_statements_read_only(statements: &[Statement]) -> ReadOnlyCheck {
    for stmt in statements {
        let verdict = match stmt {
            Statement::Query(query) => query_read_only(query),
            other => Err(leading_keyword(other)),
        };
        if let Err(statement_type) = verdict {
            log::debug!("Rejected {} statement as not read-only", statement_type);
            return ReadOnlyCheck::rejected(&statement_type);
        }
    }
    ReadOnlyCheck::read_only()
}

/// `Err` carries the upper-case type of the offending statement.
fn query_read_only(query: &Query) -> Result<(), String> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            query_read_only(&cte.query)?;
        }
    }
    set_expr_read_only(&query.body)
}

fn set_expr_read_only(body: &SetExpr) -> Result<(), String> {
    match body {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return Err("SELECT INTO".to_string());
            }
            Ok(())
        }
        SetExpr::Query(query) => query_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_read_only(left)?;
            set_expr_read_only(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => Ok(()),
        // INSERT / UPDATE / DELETE / MERGE bodies
        other => Err(leading_keyword(other)),
    }
}

fn leading_keyword(node: &impl std::fmt::Display) -> String {
    node.to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
