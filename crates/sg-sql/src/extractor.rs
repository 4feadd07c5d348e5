//! Physical table extraction from SQL AST

use sqlparser::ast::{ObjectName, Statement, TableFactor, Visit, Visitor};
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use crate::cte::CteNames;
use crate::error::SqlResult;
use crate::parser::SqlParser;
use crate::table::ParsedTable;

/// Parse `sql` and return the physical tables it references.
///
/// Fails with a typed syntax error when the SQL does not parse; a failed
/// parse is never reported as "no tables".
pub fn extract_physical_tables(sql: &str, dialect: Option<&str>) -> SqlResult<Vec<ParsedTable>> {
    let statements = SqlParser::from_dialect_hint(dialect).parse(sql)?;
    let ctes = CteNames::collect(&statements);
    Ok(extract_tables(&statements, &ctes))
}

/// Extract physical tables from already-parsed statements.
///
/// Walks every relation the parser recognises (FROM items, joins,
/// subqueries, DML targets) in declaration order. Unqualified references
/// to a CTE are dropped. The result is de-duplicated case-insensitively on
/// the `database.schema.table` identity; the first alias seen is kept.
pub fn extract_tables(statements: &[Statement], ctes: &CteNames) -> Vec<ParsedTable> {
    let mut collector = RelationCollector::default();
    for stmt in statements {
        let _ = stmt.visit(&mut collector);
    }

    let mut seen = HashSet::new();
    let mut tables = Vec::new();
    for name in &collector.relations {
        let table = ParsedTable::from_object_name(name);
        if is_cte_reference(&table, ctes) {
            continue;
        }
        let key = table.identity_key();
        if !seen.insert(key.clone()) {
            continue;
        }
        let alias = collector.aliases.get(&key).cloned();
        tables.push(table.with_alias(alias));
    }

    log::debug!("Extracted {} physical table(s)", tables.len());
    tables
}

/// A bare name that matches a CTE refers to the CTE, never to a table.
pub(crate) fn is_cte_reference(table: &ParsedTable, ctes: &CteNames) -> bool {
    table.schema.is_none() && table.database.is_none() && ctes.contains(&table.table)
}

#[derive(Default)]
struct RelationCollector {
    relations: Vec<ObjectName>,
    aliases: HashMap<String, String>,
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        self.relations.push(relation.clone());
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        if let TableFactor::Table {
            name,
            alias: Some(alias),
            ..
        } = table_factor
        {
            let key = ParsedTable::from_object_name(name).identity_key();
            self.aliases
                .entry(key)
                .or_insert_with(|| alias.name.value.clone());
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
