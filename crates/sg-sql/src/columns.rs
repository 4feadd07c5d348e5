//! Column reference extraction
//!
//! Walks every place a query can mention a column (projection, WHERE, joins,
//! GROUP BY, HAVING, QUALIFY, ORDER BY, window specs, function arguments,
//! CASE branches, subqueries and CTE bodies) and attributes each reference to
//! the physical table it reads from. References to CTEs, derived tables and
//! output aliases are not physical columns and are left out.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    Distinct, Expr, FunctionArg, FunctionArgExpr, FunctionArgumentClause, FunctionArguments,
    GroupByExpr, HavingBound, JoinConstraint, JoinOperator, NamedWindowExpr, ObjectName,
    ObjectNamePart, OrderByKind, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins, WindowSpec, WindowType,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::cte::CteNames;
use crate::error::{SqlError, SqlResult};
use crate::parser::SqlParser;
use crate::scope::{expr_children, for_each_factor, join_conditions, Scope};
use crate::table::{normalize_table_identifier, ParsedTable};

/// Lower-cased table key -> lower-cased column names.
///
/// Keys are the resolved, dot-joined table identity (`users`,
/// `public.users`); qualifiers that resolve to nothing in scope are kept
/// as written.
pub type ColumnReferences = BTreeMap<String, BTreeSet<String>>;

/// What column extraction does when the SQL cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnParsePolicy {
    /// Log and return an empty map
    #[default]
    FailOpen,
    /// Return [`SqlError::ColumnExtraction`]
    FailClosed,
}

/// Parse `sql` and collect its column references, returning an empty map
/// when it does not parse.
///
/// An empty result is ambiguous: callers making access decisions should use
/// [`extract_column_references_with_policy`] with
/// [`ColumnParsePolicy::FailClosed`] or check parsing separately.
pub fn extract_column_references(sql: &str, dialect: Option<&str>) -> ColumnReferences {
    extract_column_references_with_policy(sql, dialect, ColumnParsePolicy::FailOpen)
        .unwrap_or_default()
}

/// Parse `sql` and collect its column references under an explicit parse
/// failure policy.
pub fn extract_column_references_with_policy(
    sql: &str,
    dialect: Option<&str>,
    policy: ColumnParsePolicy,
) -> SqlResult<ColumnReferences> {
    match SqlParser::from_dialect_hint(dialect).parse(sql) {
        Ok(statements) => {
            let ctes = CteNames::collect(&statements);
            Ok(collect_column_references(&statements, &ctes))
        }
        Err(err) => match policy {
            ColumnParsePolicy::FailOpen => {
                log::warn!("Column extraction skipped, SQL did not parse: {}", err);
                Ok(ColumnReferences::new())
            }
            ColumnParsePolicy::FailClosed => Err(SqlError::ColumnExtraction(err.to_string())),
        },
    }
}

/// Collect column references from already-parsed statements.
pub fn collect_column_references(statements: &[Statement], ctes: &CteNames) -> ColumnReferences {
    let mut collector = ColumnCollector {
        ctes,
        refs: ColumnReferences::new(),
    };
    for stmt in statements {
        if let Statement::Query(query) = stmt {
            collector.walk_query(query, None);
        }
    }
    log::debug!(
        "Collected columns for {} table(s)",
        collector.refs.len()
    );
    collector.refs
}

/// Where an expression sits, which decides whether output aliases are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    /// Projection, WHERE, join conditions: evaluated over input rows
    Input,
    /// GROUP BY, HAVING, QUALIFY, ORDER BY: may name output aliases
    Output,
}

struct ColumnCollector<'a> {
    ctes: &'a CteNames,
    refs: ColumnReferences,
}

impl ColumnCollector<'_> {
    fn walk_query(&mut self, query: &Query, parent: Option<&Scope<'_>>) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.walk_query(&cte.query, parent);
            }
        }

        let body_scope = self.walk_set_expr(&query.body, parent);

        if let Some(order_by) = &query.order_by {
            if let OrderByKind::Expressions(exprs) = &order_by.kind {
                let fallback;
                let scope = match &body_scope {
                    Some(scope) => scope,
                    None => {
                        fallback = Scope::new(parent);
                        &fallback
                    }
                };
                for order_expr in exprs {
                    self.walk_expr(&order_expr.expr, scope, Clause::Output);
                }
            }
        }
    }

    /// Walk a query body, returning the scope of its leftmost SELECT.
    fn walk_set_expr<'p>(
        &mut self,
        body: &SetExpr,
        parent: Option<&'p Scope<'p>>,
    ) -> Option<Scope<'p>> {
        match body {
            SetExpr::Select(select) => Some(self.walk_select(select, parent)),
            SetExpr::Query(query) => {
                self.walk_query(query, parent);
                None
            }
            SetExpr::SetOperation { left, right, .. } => {
                let left_scope = self.walk_set_expr(left, parent);
                self.walk_set_expr(right, parent);
                left_scope
            }
            SetExpr::Values(values) => {
                let scope = Scope::new(parent);
                for row in &values.rows {
                    for expr in row {
                        self.walk_expr(expr, &scope, Clause::Input);
                    }
                }
                None
            }
            _ => None,
        }
    }

    fn walk_select<'p>(&mut self, select: &Select, parent: Option<&'p Scope<'p>>) -> Scope<'p> {
        let mut scope = Scope::new(parent);
        scope.register_from(&select.from, self.ctes);
        scope.register_projection(&select.projection);

        for table_with_joins in &select.from {
            for_each_factor(table_with_joins, &mut |factor| {
                if let sqlparser::ast::TableFactor::Derived { subquery, .. } = factor {
                    self.walk_query(subquery, Some(&scope));
                }
            });
            for condition in join_conditions(table_with_joins) {
                self.walk_expr(&condition, &scope, Clause::Input);
            }
            self.walk_using(table_with_joins, &scope);
        }

        if let Some(Distinct::On(exprs)) = &select.distinct {
            for expr in exprs {
                self.walk_expr(expr, &scope, Clause::Output);
            }
        }

        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    self.walk_expr(expr, &scope, Clause::Input);
                }
                // wildcard columns are not enumerated
                _ => {}
            }
        }

        if let Some(selection) = &select.selection {
            self.walk_expr(selection, &scope, Clause::Input);
        }

        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            for expr in exprs {
                self.walk_expr(expr, &scope, Clause::Output);
            }
        }

        for expr in select.having.iter().chain(select.qualify.iter()) {
            self.walk_expr(expr, &scope, Clause::Output);
        }

        for window in &select.named_window {
            if let NamedWindowExpr::WindowSpec(spec) = &window.1 {
                self.walk_window_spec(spec, &scope);
            }
        }

        scope
    }

    fn walk_expr(&mut self, expr: &Expr, scope: &Scope<'_>, clause: Clause) {
        match expr {
            Expr::Identifier(ident) => self.record_unqualified(&ident.value, scope, clause),
            Expr::CompoundIdentifier(parts) => match parts.split_last() {
                Some((column, [])) => self.record_unqualified(&column.value, scope, clause),
                Some((column, qualifier)) => {
                    let qualifier = qualifier
                        .iter()
                        .map(|ident| ident.value.as_str())
                        .collect::<Vec<_>>()
                        .join(".");
                    self.record_qualified(&qualifier, &column.value, scope);
                }
                None => {}
            },
            Expr::Function(func) => {
                match &func.args {
                    FunctionArguments::List(arg_list) => {
                        for arg in &arg_list.args {
                            let arg_expr = match arg {
                                FunctionArg::Unnamed(e)
                                | FunctionArg::Named { arg: e, .. }
                                | FunctionArg::ExprNamed { arg: e, .. } => e,
                            };
                            if let FunctionArgExpr::Expr(e) = arg_expr {
                                self.walk_expr(e, scope, clause);
                            }
                        }
                        for arg_clause in &arg_list.clauses {
                            match arg_clause {
                                FunctionArgumentClause::OrderBy(order_exprs) => {
                                    for order_expr in order_exprs {
                                        self.walk_expr(&order_expr.expr, scope, clause);
                                    }
                                }
                                FunctionArgumentClause::Limit(e)
                                | FunctionArgumentClause::Having(HavingBound(_, e)) => {
                                    self.walk_expr(e, scope, clause);
                                }
                                _ => {}
                            }
                        }
                    }
                    FunctionArguments::Subquery(query) => self.walk_query(query, Some(scope)),
                    FunctionArguments::None => {}
                }
                if let Some(filter) = &func.filter {
                    self.walk_expr(filter, scope, clause);
                }
                for order_expr in &func.within_group {
                    self.walk_expr(&order_expr.expr, scope, clause);
                }
                if let Some(WindowType::WindowSpec(spec)) = &func.over {
                    self.walk_window_spec(spec, scope);
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                self.walk_expr(left, scope, clause);
                self.walk_expr(right, scope, clause);
            }
            Expr::UnaryOp { expr: inner, .. }
            | Expr::Nested(inner)
            | Expr::Cast { expr: inner, .. }
            | Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::IsTrue(inner)
            | Expr::IsNotTrue(inner)
            | Expr::IsFalse(inner)
            | Expr::IsNotFalse(inner) => self.walk_expr(inner, scope, clause),
            Expr::Case {
                operand,
                conditions,
                else_result,
                ..
            } => {
                if let Some(operand) = operand {
                    self.walk_expr(operand, scope, clause);
                }
                for case_when in conditions {
                    self.walk_expr(&case_when.condition, scope, clause);
                    self.walk_expr(&case_when.result, scope, clause);
                }
                if let Some(else_result) = else_result {
                    self.walk_expr(else_result, scope, clause);
                }
            }
            Expr::Subquery(query) | Expr::Exists { subquery: query, .. } => {
                self.walk_query(query, Some(scope));
            }
            Expr::InList { expr, list, .. } => {
                self.walk_expr(expr, scope, clause);
                for item in list {
                    self.walk_expr(item, scope, clause);
                }
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.walk_expr(expr, scope, clause);
                self.walk_expr(low, scope, clause);
                self.walk_expr(high, scope, clause);
            }
            Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
                self.walk_expr(expr, scope, clause);
                self.walk_expr(pattern, scope, clause);
            }
            Expr::Tuple(exprs) => {
                for e in exprs {
                    self.walk_expr(e, scope, clause);
                }
            }
            Expr::Value(_) | Expr::TypedString { .. } => {}
            other => {
                let children = expr_children(other);
                for child in &children.exprs {
                    self.walk_expr(child, scope, clause);
                }
                for query in &children.queries {
                    self.walk_query(query, Some(scope));
                }
            }
        }
    }

    fn walk_window_spec(&mut self, spec: &WindowSpec, scope: &Scope<'_>) {
        for expr in &spec.partition_by {
            self.walk_expr(expr, scope, Clause::Output);
        }
        for order_expr in &spec.order_by {
            self.walk_expr(&order_expr.expr, scope, Clause::Output);
        }
    }

    fn record_unqualified(&mut self, column: &str, scope: &Scope<'_>, clause: Clause) {
        if clause == Clause::Output && scope.is_column_alias(column) {
            return;
        }
        if let Some(table) = scope.default_table() {
            self.insert(normalize_table_identifier(table), column);
        }
    }

    /// `JOIN ... USING (col)` reads `col` from both sides of the join.
    fn walk_using(&mut self, table_with_joins: &TableWithJoins, scope: &Scope<'_>) {
        let mut left = &table_with_joins.relation;
        for join in &table_with_joins.joins {
            if let Some(JoinConstraint::Using(names)) = join_constraint(&join.join_operator) {
                for column in names.iter().filter_map(using_column) {
                    self.record_factor_column(left, column, scope);
                    self.record_factor_column(&join.relation, column, scope);
                }
            }
            left = &join.relation;
        }

        let factors = std::iter::once(&table_with_joins.relation)
            .chain(table_with_joins.joins.iter().map(|join| &join.relation));
        for factor in factors {
            if let TableFactor::NestedJoin {
                table_with_joins, ..
            } = factor
            {
                self.walk_using(table_with_joins, scope);
            }
        }
    }

    fn record_factor_column(&mut self, factor: &TableFactor, column: &str, scope: &Scope<'_>) {
        if let TableFactor::Table { name, alias, .. } = factor {
            let qualifier = match alias {
                Some(alias) => alias.name.value.clone(),
                None => ParsedTable::from_object_name(name).full_name,
            };
            if let Some(table) = scope.resolve(&qualifier).and_then(|r| r.physical_key()) {
                self.insert(table, column);
            }
        }
    }

    fn record_qualified(&mut self, qualifier: &str, column: &str, scope: &Scope<'_>) {
        match scope.resolve(qualifier) {
            Some(relation) => {
                if let Some(table) = relation.physical_key() {
                    self.insert(table, column);
                }
            }
            None if self.ctes.contains(qualifier) => {}
            None => self.insert(qualifier.to_lowercase(), column),
        }
    }

    fn insert(&mut self, table: String, column: &str) {
        self.refs
            .entry(table)
            .or_default()
            .insert(column.to_lowercase());
    }
}

fn join_constraint(operator: &JoinOperator) -> Option<&JoinConstraint> {
    match operator {
        JoinOperator::Join(constraint)
        | JoinOperator::Inner(constraint)
        | JoinOperator::Left(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::Right(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint) => Some(constraint),
        _ => None,
    }
}

fn using_column(name: &ObjectName) -> Option<&str> {
    match name.0.last()? {
        ObjectNamePart::Identifier(ident) => Some(ident.value.as_str()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "columns_test.rs"]
mod tests;
