use super::*;

fn refs(sql: &str) -> ColumnReferences {
    extract_column_references(sql, None)
}

fn cols(map: &ColumnReferences, table: &str) -> Vec<String> {
    map.get(table)
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_simple_select_with_where() {
    let map = refs("SELECT id FROM users WHERE status = 'active'");
    assert_eq!(map.len(), 1);
    assert_eq!(cols(&map, "users"), vec!["id", "status"]);
}

#[test]
fn test_wildcard_is_not_enumerated() {
    assert!(refs("SELECT * FROM users").is_empty());
}

#[test]
fn test_join_aliases_resolve_to_tables() {
    let map = refs(
        "SELECT u.name, o.total FROM users u JOIN orders o ON u.id = o.user_id",
    );
    assert_eq!(cols(&map, "users"), vec!["id", "name"]);
    assert_eq!(cols(&map, "orders"), vec!["total", "user_id"]);
    assert!(!map.contains_key("u"));
    assert!(!map.contains_key("o"));
}

#[test]
fn test_cte_columns_are_excluded() {
    let map = refs(
        r#"
        WITH recent AS (
            SELECT id, created_at FROM orders WHERE created_at > '2024-01-01'
        )
        SELECT r.id, id FROM recent r
        "#,
    );
    assert_eq!(map.len(), 1);
    assert_eq!(cols(&map, "orders"), vec!["created_at", "id"]);
}

#[test]
fn test_output_alias_in_order_by_is_not_a_column() {
    let map = refs("SELECT amount * 2 AS doubled FROM payments ORDER BY doubled");
    assert_eq!(cols(&map, "payments"), vec!["amount"]);
}

#[test]
fn test_self_named_alias_keeps_column() {
    let map = refs("SELECT id AS id FROM users ORDER BY id");
    assert_eq!(cols(&map, "users"), vec!["id"]);
}

#[test]
fn test_group_by_having_and_order_by() {
    let map = refs(
        "SELECT dept, SUM(salary) AS total FROM employees \
         GROUP BY dept HAVING SUM(salary) > 10 ORDER BY total",
    );
    assert_eq!(cols(&map, "employees"), vec!["dept", "salary"]);
}

#[test]
fn test_correlated_scalar_subquery() {
    let map = refs(
        "SELECT u.name, (SELECT count(*) FROM orders o WHERE o.user_id = u.id) AS cnt FROM users u",
    );
    assert_eq!(cols(&map, "users"), vec!["id", "name"]);
    assert_eq!(cols(&map, "orders"), vec!["user_id"]);
}

#[test]
fn test_in_and_exists_subqueries() {
    let map = refs(
        "SELECT name FROM users WHERE id IN (SELECT user_id FROM orders WHERE total > 100) \
         AND EXISTS (SELECT 1 FROM bans b WHERE b.user_id = users.id)",
    );
    assert_eq!(cols(&map, "users"), vec!["id", "name"]);
    assert_eq!(cols(&map, "orders"), vec!["total", "user_id"]);
    assert_eq!(cols(&map, "bans"), vec!["user_id"]);
}

#[test]
fn test_window_function_specs() {
    let map = refs(
        "SELECT id, ROW_NUMBER() OVER (PARTITION BY dept ORDER BY salary DESC) AS rn FROM employees",
    );
    assert_eq!(cols(&map, "employees"), vec!["dept", "id", "salary"]);
}

#[test]
fn test_case_expression() {
    let map = refs(
        "SELECT CASE WHEN status = 'paid' THEN amount ELSE 0 END AS paid FROM payments",
    );
    assert_eq!(cols(&map, "payments"), vec!["amount", "status"]);
}

#[test]
fn test_union_branches() {
    let map = refs("SELECT id FROM a UNION SELECT code FROM b");
    assert_eq!(cols(&map, "a"), vec!["id"]);
    assert_eq!(cols(&map, "b"), vec!["code"]);
}

#[test]
fn test_derived_table_alias_is_local() {
    let map = refs(
        "SELECT s.total FROM (SELECT user_id, SUM(amount) AS total FROM payments GROUP BY user_id) s",
    );
    assert_eq!(map.len(), 1);
    assert_eq!(cols(&map, "payments"), vec!["amount", "user_id"]);
}

#[test]
fn test_schema_qualified_column() {
    let map = refs("SELECT public.users.id, u.email FROM public.users u");
    assert_eq!(cols(&map, "public.users"), vec!["email", "id"]);
}

#[test]
fn test_unqualified_columns_go_to_first_table() {
    let map = refs("SELECT name, total FROM users, orders");
    assert_eq!(cols(&map, "users"), vec!["name", "total"]);
    assert!(!map.contains_key("orders"));
}

#[test]
fn test_names_are_lowercased() {
    let map = refs("SELECT U.Name FROM Users U WHERE U.Active");
    assert_eq!(cols(&map, "users"), vec!["active", "name"]);
}

#[test]
fn test_unresolved_qualifier_is_kept() {
    let map = refs("SELECT x.id FROM users");
    assert_eq!(cols(&map, "x"), vec!["id"]);
}

#[test]
fn test_function_arguments_and_other_expressions() {
    let map = refs(
        "SELECT COALESCE(nickname, UPPER(name)), SUBSTRING(email FROM 1 FOR 3) \
         FROM users WHERE created_at BETWEEN '2024-01-01' AND '2024-12-31' AND kind IN ('a', 'b')",
    );
    assert_eq!(
        cols(&map, "users"),
        vec!["created_at", "email", "kind", "name", "nickname"]
    );
}

#[test]
fn test_parse_failure_fails_open_by_default() {
    assert!(refs("SELECT id FROM users WHERE").is_empty());
}

#[test]
fn test_parse_failure_can_fail_closed() {
    let result = extract_column_references_with_policy(
        "SELECT id FROM users WHERE",
        None,
        ColumnParsePolicy::FailClosed,
    );
    assert!(matches!(result, Err(SqlError::ColumnExtraction(_))));

    let ok = extract_column_references_with_policy(
        "SELECT id FROM users",
        None,
        ColumnParsePolicy::FailClosed,
    )
    .unwrap();
    assert_eq!(cols(&ok, "users"), vec!["id"]);
}

#[test]
fn test_policy_serde_names() {
    let policy: ColumnParsePolicy = serde_json::from_str("\"fail_closed\"").unwrap();
    assert_eq!(policy, ColumnParsePolicy::FailClosed);
    assert_eq!(ColumnParsePolicy::default(), ColumnParsePolicy::FailOpen);
}

#[test]
fn test_extraction_is_idempotent() {
    let sql = "SELECT a.x, b.y FROM a JOIN b ON a.id = b.id WHERE a.z > 1";
    assert_eq!(refs(sql), refs(sql));
}

#[test]
fn test_unqualified_columns_skip_leading_cte() {
    let map = refs("WITH c AS (SELECT 1 AS x) SELECT ssn FROM c JOIN users ON true");
    assert_eq!(cols(&map, "users"), vec!["ssn"]);
}

#[test]
fn test_unqualified_columns_skip_leading_derived_table() {
    let map = refs("SELECT secret FROM (SELECT 1 AS x) d, sales.orders");
    assert_eq!(cols(&map, "sales.orders"), vec!["secret"]);
}

#[test]
fn test_from_with_only_local_relations_records_nothing() {
    let map = refs("WITH c AS (SELECT id FROM users) SELECT id, extra FROM c");
    assert_eq!(map.len(), 1);
    assert_eq!(cols(&map, "users"), vec!["id"]);
}

#[test]
fn test_aggregate_order_by_clause() {
    let map = refs("SELECT ARRAY_AGG(name ORDER BY salary) FROM users");
    assert_eq!(cols(&map, "users"), vec!["name", "salary"]);
}

#[test]
fn test_distinct_on_expressions() {
    let map = refs("SELECT DISTINCT ON (salary) name FROM users ORDER BY salary");
    assert_eq!(cols(&map, "users"), vec!["name", "salary"]);
}

#[test]
fn test_join_using_reads_both_sides() {
    let map = refs("SELECT u.name FROM users u JOIN accounts USING (account_id)");
    assert_eq!(cols(&map, "users"), vec!["account_id", "name"]);
    assert_eq!(cols(&map, "accounts"), vec!["account_id"]);
}
