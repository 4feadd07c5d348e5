//! Wildcard (`SELECT *`) validation
//!
//! `*` and `alias.*` are rejected when they expand over a physical table.
//! Wildcards over CTEs and derived tables are allowed since their columns are
//! already spelled out where they are defined.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    ObjectName, Query, SelectItem, SelectItemQualifiedWildcardKind, SetExpr, Statement,
    TableFactor,
};

use crate::cte::CteNames;
use crate::parser::SqlParser;
use crate::scope::{for_each_factor, Relation, Scope};
use crate::table::ParsedTable;

/// Outcome of a wildcard check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WildcardValidation {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Physical tables a wildcard expanded over, as written in the query
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_tables: Vec<String>,
}

impl WildcardValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    fn blocked(blocked_tables: Vec<String>) -> Self {
        let table_list = match blocked_tables.as_slice() {
            [single] => format!("table: {}", single),
            many => format!("tables: {}", many.join(", ")),
        };
        Self {
            is_valid: false,
            error: Some(format!(
                "SELECT * is not allowed on physical {}. Please explicitly specify the column names \
                 you need instead of using wildcards. For example, use 'SELECT column1, column2 FROM table' \
                 instead of 'SELECT * FROM table'.",
                table_list
            )),
            blocked_tables,
        }
    }

    /// A parse failure is never valid.
    pub fn parse_failure(message: impl std::fmt::Display) -> Self {
        Self {
            is_valid: false,
            error: Some(format!(
                "Failed to validate wildcard usage in SQL query: {}. Please ensure your SQL syntax \
                 is correct and specify explicit column names instead of using SELECT *.",
                message
            )),
            blocked_tables: Vec::new(),
        }
    }
}

/// Parse `sql` and reject wildcards over physical tables.
pub fn validate_wildcard_usage(sql: &str, dialect: Option<&str>) -> WildcardValidation {
    match SqlParser::from_dialect_hint(dialect).parse(sql) {
        Ok(statements) => {
            let ctes = CteNames::collect(&statements);
            check_statements_wildcards(&statements, &ctes)
        }
        Err(err) => WildcardValidation::parse_failure(err),
    }
}

/// Check already-parsed statements.
///
/// Every SELECT reachable through CTE bodies, set operations, nested
/// queries and FROM-clause subqueries is checked. Subqueries inside
/// expressions (`EXISTS (SELECT * ...)`) are not.
pub fn check_statements_wildcards(statements: &[Statement], ctes: &CteNames) -> WildcardValidation {
    let mut checker = WildcardChecker {
        ctes,
        blocked: Vec::new(),
    };
    for stmt in statements {
        if let Statement::Query(query) = stmt {
            checker.check_query(query, None);
        }
    }

    if checker.blocked.is_empty() {
        WildcardValidation::valid()
    } else {
        log::debug!("Wildcards blocked on {:?}", checker.blocked);
        WildcardValidation::blocked(checker.blocked)
    }
}

struct WildcardChecker<'a> {
    ctes: &'a CteNames,
    blocked: Vec<String>,
}

impl WildcardChecker<'_> {
    fn check_query(&mut self, query: &Query, parent: Option<&Scope<'_>>) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.check_query(&cte.query, parent);
            }
        }
        self.check_set_expr(&query.body, parent);
    }

    fn check_set_expr(&mut self, body: &SetExpr, parent: Option<&Scope<'_>>) {
        match body {
            SetExpr::Select(select) => {
                let mut scope = Scope::new(parent);
                scope.register_from(&select.from, self.ctes);

                for item in &select.projection {
                    match item {
                        SelectItem::Wildcard(_) => {
                            let tables: Vec<String> = scope
                                .physical_tables()
                                .iter()
                                .map(|table| table.full_name.clone())
                                .collect();
                            for table in tables {
                                self.block(table);
                            }
                        }
                        SelectItem::QualifiedWildcard(
                            SelectItemQualifiedWildcardKind::ObjectName(name),
                            _,
                        ) => self.check_qualified(name, &scope),
                        _ => {}
                    }
                }

                for table_with_joins in &select.from {
                    for_each_factor(table_with_joins, &mut |factor| {
                        if let TableFactor::Derived { subquery, .. } = factor {
                            self.check_query(subquery, Some(&scope));
                        }
                    });
                }
            }
            SetExpr::Query(query) => self.check_query(query, parent),
            SetExpr::SetOperation { left, right, .. } => {
                self.check_set_expr(left, parent);
                self.check_set_expr(right, parent);
            }
            _ => {}
        }
    }

    fn check_qualified(&mut self, name: &ObjectName, scope: &Scope<'_>) {
        let qualifier = ParsedTable::from_object_name(name).full_name;
        match scope.resolve(&qualifier) {
            Some(Relation::Physical(table)) => {
                let table = table.full_name.clone();
                self.block(table);
            }
            Some(Relation::Local) => {}
            None if self.ctes.contains(&qualifier) => {}
            None => self.block(qualifier),
        }
    }

    fn block(&mut self, table: String) {
        if !self
            .blocked
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&table))
        {
            self.blocked.push(table);
        }
    }
}

#[cfg(test)]
#[path = "wildcard_test.rs"]
mod tests;
