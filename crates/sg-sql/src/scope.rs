//! Alias scopes for nested SELECTs
//!
//! Each SELECT gets its own [`Scope`] that overlays its parent's: lookups fall
//! through to enclosing scopes, additions stay local, and a child never
//! mutates its parent.

use sqlparser::ast::{Expr, JoinOperator, SelectItem, TableFactor, TableWithJoins, Visit, Visitor};
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use crate::cte::CteNames;
use crate::extractor::is_cte_reference;
use crate::table::{normalize_table_identifier, ParsedTable};

/// What a FROM-clause name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Relation {
    /// A real table or view
    Physical(ParsedTable),
    /// A CTE, derived table, nested join or table function
    Local,
}

impl Relation {
    /// Lower-cased identity of a physical table, `None` for local relations.
    pub(crate) fn physical_key(&self) -> Option<String> {
        match self {
            Relation::Physical(table) => Some(normalize_table_identifier(table)),
            Relation::Local => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    /// Lower-cased alias, bare name or qualified name -> relation
    relations: HashMap<String, Relation>,
    /// Physical tables of this scope's FROM clause, in declaration order
    physical: Vec<ParsedTable>,
    /// Whether this scope has a FROM clause of its own
    has_from: bool,
    /// Lower-cased `expr AS alias` names of this scope's projection
    column_aliases: HashSet<String>,
}

impl<'p> Scope<'p> {
    pub(crate) fn new(parent: Option<&'p Scope<'p>>) -> Self {
        Self {
            parent,
            ..Default::default()
        }
    }

    /// Register every FROM item and join of `from`.
    pub(crate) fn register_from(&mut self, from: &[TableWithJoins], ctes: &CteNames) {
        self.has_from |= !from.is_empty();
        for table_with_joins in from {
            self.register_table_with_joins(table_with_joins, ctes);
        }
    }

    fn register_table_with_joins(&mut self, table_with_joins: &TableWithJoins, ctes: &CteNames) {
        self.register_factor(&table_with_joins.relation, ctes);
        for join in &table_with_joins.joins {
            self.register_factor(&join.relation, ctes);
        }
    }

    fn register_factor(&mut self, factor: &TableFactor, ctes: &CteNames) {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let table = ParsedTable::from_object_name(name);
                let relation = if is_cte_reference(&table, ctes) {
                    Relation::Local
                } else {
                    self.physical.push(table.clone());
                    Relation::Physical(table.clone())
                };
                if let Some(alias) = alias {
                    self.relations
                        .insert(alias.name.value.to_lowercase(), relation.clone());
                }
                self.relations
                    .entry(table.table.to_lowercase())
                    .or_insert_with(|| relation.clone());
                self.relations
                    .entry(table.full_name.to_lowercase())
                    .or_insert(relation);
            }
            TableFactor::Derived { alias, .. } => {
                if let Some(alias) = alias {
                    self.relations
                        .insert(alias.name.value.to_lowercase(), Relation::Local);
                }
            }
            TableFactor::NestedJoin {
                table_with_joins,
                alias,
                ..
            } => {
                self.register_table_with_joins(table_with_joins, ctes);
                if let Some(alias) = alias {
                    self.relations
                        .insert(alias.name.value.to_lowercase(), Relation::Local);
                }
            }
            _ => {}
        }
    }

    /// Record the projection's column aliases.
    pub(crate) fn register_projection(&mut self, projection: &[SelectItem]) {
        for item in projection {
            if let SelectItem::ExprWithAlias { alias, .. } = item {
                self.column_aliases.insert(alias.value.to_lowercase());
            }
        }
    }

    /// Resolve a table qualifier through this scope and its ancestors.
    pub(crate) fn resolve(&self, qualifier: &str) -> Option<&Relation> {
        let key = qualifier.to_lowercase();
        self.relations
            .get(&key)
            .or_else(|| self.parent.and_then(|parent| parent.resolve(&key)))
    }

    /// Table unqualified columns are attributed to: the first physical table
    /// of this scope's FROM clause, whatever CTEs or derived tables precede it.
    ///
    /// A scope without a FROM clause (a correlated scalar subquery, say)
    /// defers to its parent. A FROM clause holding only query-local
    /// relations has no default table.
    pub(crate) fn default_table(&self) -> Option<&ParsedTable> {
        match self.physical.first() {
            Some(table) => Some(table),
            None if self.has_from => None,
            None => self.parent.and_then(|parent| parent.default_table()),
        }
    }

    pub(crate) fn physical_tables(&self) -> &[ParsedTable] {
        &self.physical
    }

    /// Whether `name` is an output alias of this scope (not of ancestors).
    pub(crate) fn is_column_alias(&self, name: &str) -> bool {
        self.column_aliases.contains(&name.to_lowercase())
    }
}

/// Call `f` on every table factor of a FROM item, descending into nested joins.
pub(crate) fn for_each_factor<'a>(
    table_with_joins: &'a TableWithJoins,
    f: &mut impl FnMut(&'a TableFactor),
) {
    let factors = std::iter::once(&table_with_joins.relation)
        .chain(table_with_joins.joins.iter().map(|join| &join.relation));
    for factor in factors {
        f(factor);
        if let TableFactor::NestedJoin {
            table_with_joins, ..
        } = factor
        {
            for_each_factor(table_with_joins, f);
        }
    }
}

/// `ON` / match conditions of every join in a FROM item, nested joins included.
pub(crate) fn join_conditions(table_with_joins: &TableWithJoins) -> Vec<Expr> {
    let mut conditions = Vec::new();
    for join in &table_with_joins.joins {
        conditions.extend(direct_children(&join.join_operator).exprs);
    }
    for_each_factor(table_with_joins, &mut |factor| {
        if let TableFactor::NestedJoin {
            table_with_joins, ..
        } = factor
        {
            for join in &table_with_joins.joins {
                conditions.extend(direct_children(&join.join_operator).exprs);
            }
        }
    });
    conditions
}

/// Outermost expressions and queries reachable from an AST node.
#[derive(Debug, Default)]
pub(crate) struct Children {
    pub(crate) exprs: Vec<Expr>,
    pub(crate) queries: Vec<sqlparser::ast::Query>,
}

/// Collect the outermost expressions and queries directly below `node`.
pub(crate) fn direct_children(node: &JoinOperator) -> Children {
    collect_children(node, 0)
}

/// Collect the immediate sub-expressions and subqueries of `expr`.
///
/// Covers expression kinds without a dedicated walk arm, using the derived
/// `Visit` implementation to find what they contain.
pub(crate) fn expr_children(expr: &Expr) -> Children {
    collect_children(expr, 1)
}

fn collect_children(node: &impl Visit, level: usize) -> Children {
    let mut collector = ChildCollector {
        level,
        ..Default::default()
    };
    let _ = node.visit(&mut collector);
    collector.children
}

#[derive(Default)]
struct ChildCollector {
    level: usize,
    expr_depth: usize,
    query_depth: usize,
    children: Children,
}

impl Visitor for ChildCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &sqlparser::ast::Query) -> ControlFlow<Self::Break> {
        if self.query_depth == 0 && self.expr_depth == self.level {
            self.children.queries.push(query.clone());
        }
        self.query_depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &sqlparser::ast::Query) -> ControlFlow<Self::Break> {
        self.query_depth -= 1;
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if self.query_depth == 0 && self.expr_depth == self.level {
            self.children.exprs.push(expr.clone());
        }
        self.expr_depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, _expr: &Expr) -> ControlFlow<Self::Break> {
        self.expr_depth -= 1;
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SqlParser;
    use sqlparser::ast::{SetExpr, Statement};

    fn first_select(sql: &str) -> sqlparser::ast::Select {
        let stmts = SqlParser::default().parse(sql).unwrap();
        match &stmts[0] {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::Select(select) => select.as_ref().clone(),
                other => panic!("expected SELECT, got {other}"),
            },
            other => panic!("expected query, got {other}"),
        }
    }

    #[test]
    fn test_scope_resolves_aliases_and_names() {
        let select = first_select("SELECT 1 FROM public.users u JOIN orders ON u.id = orders.uid");
        let mut scope = Scope::new(None);
        scope.register_from(&select.from, &CteNames::default());

        let users = scope.resolve("U").and_then(Relation::physical_key);
        assert_eq!(users.as_deref(), Some("public.users"));
        let users = scope.resolve("public.users").and_then(Relation::physical_key);
        assert_eq!(users.as_deref(), Some("public.users"));
        let orders = scope.resolve("orders").and_then(Relation::physical_key);
        assert_eq!(orders.as_deref(), Some("orders"));
        assert!(scope.resolve("missing").is_none());
        assert_eq!(scope.physical_tables().len(), 2);
    }

    #[test]
    fn test_child_scope_reads_parent() {
        let outer = first_select("SELECT 1 FROM users u");
        let mut parent = Scope::new(None);
        parent.register_from(&outer.from, &CteNames::default());

        let child = Scope::new(Some(&parent));
        assert!(child.resolve("u").is_some());
        assert_eq!(
            child.default_table().map(|t| t.full_name.as_str()),
            Some("users")
        );
    }

    #[test]
    fn test_derived_and_cte_relations_are_local() {
        let stmts = SqlParser::default()
            .parse("WITH c AS (SELECT 1) SELECT 1 FROM c JOIN (SELECT 2) d ON true")
            .unwrap();
        let ctes = CteNames::collect(&stmts);
        let Statement::Query(query) = &stmts[0] else {
            panic!("expected query");
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            panic!("expected select");
        };
        let mut scope = Scope::new(None);
        scope.register_from(&select.from, &ctes);

        assert_eq!(scope.resolve("c"), Some(&Relation::Local));
        assert_eq!(scope.resolve("d"), Some(&Relation::Local));
        assert_eq!(scope.default_table(), None);
        assert!(scope.physical_tables().is_empty());
    }

    #[test]
    fn test_join_conditions_include_nested_joins() {
        let select = first_select(
            "SELECT 1 FROM a JOIN (b JOIN c ON b.x = c.x) ON a.y = b.y LEFT JOIN d ON d.z = a.z",
        );
        let conditions = join_conditions(&select.from[0]);
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn test_expr_children_skip_root_and_subquery_contents() {
        let select = first_select("SELECT COALESCE(a, (SELECT max(b) FROM t), c + 1) FROM x");
        let SelectItem::UnnamedExpr(expr) = &select.projection[0] else {
            panic!("expected expression");
        };
        let children = expr_children(expr);
        assert_eq!(children.exprs.len(), 3);
        assert_eq!(children.queries.len(), 0);
    }

    #[test]
    fn test_default_table_skips_leading_local_relations() {
        let stmts = SqlParser::default()
            .parse("WITH c AS (SELECT 1) SELECT 1 FROM c, (SELECT 2) d, sales.users u")
            .unwrap();
        let ctes = CteNames::collect(&stmts);
        let Statement::Query(query) = &stmts[0] else {
            panic!("expected query");
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            panic!("expected select");
        };
        let mut scope = Scope::new(None);
        scope.register_from(&select.from, &ctes);
        assert_eq!(
            scope.default_table().map(|t| t.full_name.as_str()),
            Some("sales.users")
        );

        let child = Scope::new(Some(&scope));
        assert_eq!(
            child.default_table().map(|t| t.full_name.as_str()),
            Some("sales.users")
        );
    }
}
