//! Single-parse analysis of a query

use serde::Serialize;

use crate::columns::{collect_column_references, ColumnReferences};
use crate::cte::CteNames;
use crate::dialect::Grammar;
use crate::error::SqlResult;
use crate::extractor::extract_tables;
use crate::parser::SqlParser;
use crate::table::ParsedTable;
use crate::validator::{check_statements_read_only, ReadOnlyCheck};
use crate::wildcard::{check_statements_wildcards, WildcardValidation};

/// Everything an access decision needs to know about one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnalysis {
    /// Grammar the SQL was parsed with
    pub dialect: Grammar,
    pub read_only: ReadOnlyCheck,
    pub wildcards: WildcardValidation,
    pub tables: Vec<ParsedTable>,
    pub columns: ColumnReferences,
    /// Query-local names, sorted
    pub ctes: Vec<String>,
}

impl QueryAnalysis {
    /// Parse `sql` once and run every extractor and validator over the result.
    ///
    /// Fails only when the SQL does not parse.
    pub fn analyze(sql: &str, dialect: Option<&str>) -> SqlResult<Self> {
        let parser = SqlParser::from_dialect_hint(dialect);
        let statements = parser.parse(sql)?;
        let ctes = CteNames::collect(&statements);

        let analysis = Self {
            dialect: parser.grammar(),
            read_only: check_statements_read_only(&statements),
            wildcards: check_statements_wildcards(&statements, &ctes),
            tables: extract_tables(&statements, &ctes),
            columns: collect_column_references(&statements, &ctes),
            ctes: ctes.sorted().into_iter().map(str::to_string).collect(),
        };
        log::debug!(
            "Analyzed query with {}: {} table(s), read-only={}, wildcards valid={}",
            analysis.dialect,
            analysis.tables.len(),
            analysis.read_only.is_read_only,
            analysis.wildcards.is_valid
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlError;

    #[test]
    fn test_analyze_combines_results() {
        let analysis = QueryAnalysis::analyze(
            "WITH recent AS (SELECT id, user_id FROM orders) \
             SELECT u.name, r.id FROM users u JOIN recent r ON r.user_id = u.id",
            Some("postgres"),
        )
        .unwrap();

        assert_eq!(analysis.dialect, Grammar::PostgreSql);
        assert!(analysis.read_only.is_read_only);
        assert!(analysis.wildcards.is_valid);
        let tables: Vec<&str> = analysis.tables.iter().map(|t| t.full_name.as_str()).collect();
        assert_eq!(tables, vec!["orders", "users"]);
        assert_eq!(analysis.ctes, vec!["recent"]);
        assert_eq!(analysis.columns.len(), 2);
        assert!(analysis.columns["users"].contains("name"));
        assert!(analysis.columns["orders"].contains("user_id"));
    }

    #[test]
    fn test_analyze_reports_violations_without_failing() {
        let analysis = QueryAnalysis::analyze("DELETE FROM users WHERE id = 1", None).unwrap();
        assert!(!analysis.read_only.is_read_only);

        let analysis = QueryAnalysis::analyze("SELECT * FROM users", None).unwrap();
        assert_eq!(analysis.wildcards.blocked_tables, vec!["users"]);
    }

    #[test]
    fn test_analyze_fails_on_parse_error() {
        let result = QueryAnalysis::analyze("SELECT * FROM", None);
        assert!(matches!(result, Err(SqlError::Syntax { .. })));
    }
}
