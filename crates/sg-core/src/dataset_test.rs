use super::*;

const FLAT: &str = r#"
name: orders
schema: sales
database: warehouse
description: Customer orders
dimensions:
  - name: id
    type: number
  - name: Status
measures:
  - name: count
  - name: total_amount
"#;

const MODELS: &str = r#"
models:
  - name: customers
    schema: crm
    dimensions:
      - name: id
      - name: email
  - name: events
    database: analytics
    measures:
      - name: event_count
  - name: unqualified
    dimensions:
      - name: x
"#;

#[test]
fn test_flat_dataset_columns() {
    let datasets = extract_datasets_from_yml(FLAT);
    assert_eq!(datasets.len(), 1);
    let ds = &datasets[0];
    assert_eq!(ds.table.full_name, "warehouse.sales.orders");
    let cols: Vec<&str> = ds.allowed_columns.iter().map(String::as_str).collect();
    assert_eq!(cols, vec!["count", "id", "status", "total_amount"]);
    assert!(ds.permits_column("STATUS"));
    assert!(!ds.permits_column("secret"));
}

#[test]
fn test_dimensions_and_measures_union() {
    let doc = "name: t\ndimensions:\n  - name: id\nmeasures:\n  - name: count\n";
    let datasets = extract_datasets_from_yml(doc);
    assert_eq!(datasets.len(), 1);
    let expected: BTreeSet<String> = ["id", "count"].iter().map(|s| s.to_string()).collect();
    assert_eq!(datasets[0].allowed_columns, expected);
}

#[test]
fn test_flat_table() {
    let tables = extract_tables_from_yml(FLAT);
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].database.as_deref(), Some("warehouse"));
    assert_eq!(tables[0].schema.as_deref(), Some("sales"));
    assert_eq!(tables[0].table, "orders");
}

#[test]
fn test_tables_require_a_qualifier() {
    assert!(extract_tables_from_yml("name: orders\n").is_empty());
    let datasets = extract_datasets_from_yml("name: orders\n");
    assert_eq!(datasets.len(), 1);
    assert!(datasets[0].allowed_columns.is_empty());
}

#[test]
fn test_models_list_tables() {
    let tables = extract_tables_from_yml(MODELS);
    let names: Vec<&str> = tables.iter().map(|t| t.full_name.as_str()).collect();
    assert_eq!(names, vec!["crm.customers", "analytics.events"]);
}

#[test]
fn test_models_list_datasets() {
    let datasets = extract_datasets_from_yml(MODELS);
    let names: Vec<&str> = datasets.iter().map(|d| d.table.full_name.as_str()).collect();
    assert_eq!(names, vec!["crm.customers", "analytics.events", "unqualified"]);
    assert!(datasets[1].permits_column("event_count"));
}

#[test]
fn test_flat_table_skipped_when_models_present() {
    let doc = "name: top\nschema: s\nmodels:\n  - name: inner\n    schema: s\n";
    let tables = extract_tables_from_yml(doc);
    let names: Vec<&str> = tables.iter().map(|t| t.full_name.as_str()).collect();
    assert_eq!(names, vec!["s.inner"]);

    let datasets = extract_datasets_from_yml(doc);
    assert_eq!(datasets.len(), 2);
}

#[test]
fn test_duplicates_removed_case_insensitively() {
    let doc = r#"
models:
  - name: Orders
    schema: Sales
  - name: orders
    schema: sales
"#;
    assert_eq!(extract_tables_from_yml(doc).len(), 1);
    let datasets = extract_datasets_from_yml(doc);
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].table.full_name, "Sales.Orders");
}

#[test]
fn test_database_without_schema() {
    let tables = extract_tables_from_yml("name: t\ndatabase: db\n");
    assert_eq!(tables[0].full_name, "db.t");
    assert_eq!(tables[0].schema, None);
}

#[test]
fn test_malformed_documents_yield_nothing() {
    for doc in ["", "   ", "name: [unclosed", "- just\n- a list\n", "plain text"] {
        assert!(extract_tables_from_yml(doc).is_empty(), "{:?}", doc);
        assert!(extract_datasets_from_yml(doc).is_empty(), "{:?}", doc);
    }
}

#[test]
fn test_odd_field_types_are_tolerated() {
    let doc = r#"
name: metrics
schema: ""
dimensions: not-a-list
measures:
  - name: 42
  - label: no name
  - name: ok
"#;
    let datasets = extract_datasets_from_yml(doc);
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].table.full_name, "metrics");
    let cols: Vec<&str> = datasets[0].allowed_columns.iter().map(String::as_str).collect();
    assert_eq!(cols, vec!["ok"]);
}

#[test]
fn test_dataset_serializes_flat() {
    let datasets = extract_datasets_from_yml(FLAT);
    let json = serde_json::to_value(&datasets[0]).unwrap();
    assert_eq!(json["full_name"], "warehouse.sales.orders");
    assert!(json["allowed_columns"].is_array());
}
