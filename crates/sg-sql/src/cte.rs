//! Query-local name tracking
//!
//! Collects every name introduced by a `WITH` clause anywhere in a statement
//! tree (top level, inside CTE bodies, inside subqueries and derived tables)
//! so extractors never mistake them for physical tables.

use sqlparser::ast::{Query, Statement, Visit, Visitor};
use std::collections::HashSet;
use std::ops::ControlFlow;

/// Lower-cased CTE names for one parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CteNames(HashSet<String>);

impl CteNames {
    /// Collect CTE names from all statements of a batch.
    pub fn collect(statements: &[Statement]) -> Self {
        let mut collector = CteCollector::default();
        for stmt in statements {
            let _ = stmt.visit(&mut collector);
        }
        Self(collector.names)
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Names in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Default)]
struct CteCollector {
    names: HashSet<String>,
}

impl Visitor for CteCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.names.insert(cte.alias.name.value.to_lowercase());
            }
        }
        ControlFlow::Continue(())
    }
}
