use super::*;

#[test]
fn test_parse_bare_table() {
    let t = parse_table_reference("users");
    assert_eq!(t.table, "users");
    assert_eq!(t.schema, None);
    assert_eq!(t.database, None);
    assert_eq!(t.full_name, "users");
}

#[test]
fn test_parse_qualified_tables() {
    let t = parse_table_reference("public.users");
    assert_eq!(t.schema.as_deref(), Some("public"));
    assert_eq!(t.table, "users");
    assert_eq!(t.full_name, "public.users");

    let t = parse_table_reference("analytics.public.users");
    assert_eq!(t.database.as_deref(), Some("analytics"));
    assert_eq!(t.schema.as_deref(), Some("public"));
    assert_eq!(t.table, "users");
    assert_eq!(t.full_name, "analytics.public.users");
}

#[test]
fn test_parse_strips_quotes() {
    let t = parse_table_reference(r#""Analytics"."Public"."Users""#);
    assert_eq!(t.full_name, "Analytics.Public.Users");

    let t = parse_table_reference("`my-project`.dataset.events");
    assert_eq!(t.database.as_deref(), Some("my-project"));

    let t = parse_table_reference("[dbo].[orders]");
    assert_eq!(t.schema.as_deref(), Some("dbo"));
    assert_eq!(t.table, "orders");
}

#[test]
fn test_parse_type_prefixed_reference() {
    let t = parse_table_reference("select::warehouse::orders");
    assert_eq!(t.schema.as_deref(), Some("warehouse"));
    assert_eq!(t.table, "orders");
    assert_eq!(t.full_name, "warehouse.orders");

    let t = parse_table_reference("warehouse::orders");
    assert_eq!(t.full_name, "warehouse.orders");
}

#[test]
fn test_parse_drops_null_segments() {
    let t = parse_table_reference("null.public.users");
    assert_eq!(t.database, None);
    assert_eq!(t.full_name, "public.users");

    let t = parse_table_reference(".users");
    assert_eq!(t.full_name, "users");
}

#[test]
fn test_parse_too_many_segments_keeps_text() {
    let t = parse_table_reference("a.b.c.d");
    assert_eq!(t.table, "a.b.c.d");
    assert_eq!(t.schema, None);
}

#[test]
fn test_normalize_identifier() {
    let t = parse_table_reference("Analytics.Public.Users");
    assert_eq!(normalize_table_identifier(&t), "analytics.public.users");
    assert_eq!(
        normalize_table_identifier(&ParsedTable::bare("Orders")),
        "orders"
    );
}

#[test]
fn test_identity_key_ignores_case_and_alias() {
    let a = parse_table_reference("Public.Users").with_alias(Some("u".to_string()));
    let b = parse_table_reference("public.users");
    assert_eq!(a.identity_key(), b.identity_key());
    assert_ne!(a.identity_key(), ParsedTable::bare("users").identity_key());
}

#[test]
fn test_tables_match_bare_names() {
    let q = parse_table_reference("USERS");
    let p = parse_table_reference("users");
    assert!(tables_match(&q, &p));
    assert!(!tables_match(&q, &parse_table_reference("orders")));
}

#[test]
fn test_tables_match_permission_schema_required() {
    let perm = parse_table_reference("public.users");
    assert!(tables_match(&parse_table_reference("public.users"), &perm));
    assert!(!tables_match(&parse_table_reference("users"), &perm));
    assert!(!tables_match(&parse_table_reference("private.users"), &perm));
}

#[test]
fn test_tables_match_query_may_be_more_specific() {
    let perm = parse_table_reference("users");
    assert!(tables_match(&parse_table_reference("public.users"), &perm));
    assert!(tables_match(&parse_table_reference("db.public.users"), &perm));
}

#[test]
fn test_tables_match_database_compared_when_both_present() {
    let perm = parse_table_reference("prod.public.users");
    assert!(tables_match(&parse_table_reference("PROD.public.users"), &perm));
    assert!(!tables_match(&parse_table_reference("dev.public.users"), &perm));
    // the query omitting the database still matches
    assert!(tables_match(&parse_table_reference("public.users"), &perm));
}
