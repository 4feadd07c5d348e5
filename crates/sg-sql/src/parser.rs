//! SQL parser wrapper

use crate::dialect::{Grammar, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sqlparser::ast::Statement;

/// SQL parser that wraps sqlparser-rs with dialect resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParser {
    grammar: Grammar,
}

impl SqlParser {
    /// Create a parser for a specific grammar
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    /// Create a parser from an optional data-source syntax hint.
    ///
    /// Unknown or missing hints fall back to PostgreSQL.
    pub fn from_dialect_hint(hint: Option<&str>) -> Self {
        Self::new(Grammar::resolve(hint))
    }

    /// Create a parser from a dialect name, rejecting names that are not recognised
    pub fn resolve_strict(name: &str) -> SqlResult<Self> {
        Grammar::from_name(name)
            .map(Self::new)
            .ok_or_else(|| SqlError::UnknownDialect(name.to_string()))
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        let statements = self.grammar.parse(sql)?;
        if statements.is_empty() {
            // e.g. a lone ";"
            return Err(SqlError::EmptySql);
        }
        log::debug!(
            "Parsed {} statement(s) with {} grammar",
            statements.len(),
            self.grammar
        );
        Ok(statements)
    }

    /// The grammar this parser uses
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.grammar.name()
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
