//! sg-sql - SQL access-control analysis for sqlgate
//!
//! This crate parses SQL in the dialect a data source declares and answers the
//! questions an authorization layer asks before running it: which physical
//! tables and columns it touches, whether it only reads, and whether it
//! selects `*` from a real table.

pub mod analysis;
pub mod columns;
pub mod cte;
pub mod dialect;
pub mod error;
pub mod extractor;
pub mod parser;
mod scope;
pub mod table;
pub mod validator;
pub mod wildcard;

pub use analysis::QueryAnalysis;
pub use columns::{
    collect_column_references, extract_column_references, extract_column_references_with_policy,
    ColumnParsePolicy, ColumnReferences,
};
pub use cte::CteNames;
pub use dialect::{Grammar, SqlDialect};
pub use error::{ParseFailureKind, SqlError, SqlResult};
pub use extractor::{extract_physical_tables, extract_tables};
pub use parser::SqlParser;
pub use table::{normalize_table_identifier, parse_table_reference, tables_match, ParsedTable};
pub use validator::{check_query_is_read_only, check_statements_read_only, ReadOnlyCheck};
pub use wildcard::{check_statements_wildcards, validate_wildcard_usage, WildcardValidation};
