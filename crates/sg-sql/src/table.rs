//! Physical table identities and permission matching
//!
//! A [`ParsedTable`] is the normalized `{database?, schema?, table}` form of a
//! table reference, whether it came from a query or from a dataset
//! definition. [`tables_match`] compares the two sides.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{ObjectName, ObjectNamePart};

/// Statement-type prefixes some table-list formats put in front of a reference
/// (`select::db::table`).
const TYPE_PREFIXES: &[&str] = &[
    "select", "insert", "update", "delete", "create", "drop", "alter",
];

/// A table reference split into its qualification levels.
///
/// `full_name` is always the dot-joined concatenation of whichever of
/// `database`, `schema` and `table` are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedTable {
    /// Database / catalog / project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Schema / dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Bare table name, never empty for a successfully parsed reference
    pub table: String,
    /// Dot-joined qualified name
    pub full_name: String,
    /// Alias given to the table in the query, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ParsedTable {
    /// Build from optional qualifiers and a bare table name.
    pub fn new(
        database: Option<impl Into<String>>,
        schema: Option<impl Into<String>>,
        table: impl Into<String>,
    ) -> Self {
        let database: Option<String> = database.map(Into::into).filter(|d| !d.is_empty());
        let schema: Option<String> = schema.map(Into::into).filter(|s| !s.is_empty());
        let table: String = table.into();
        let full_name = [database.as_deref(), schema.as_deref(), Some(table.as_str())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(".");
        Self {
            database,
            schema,
            table,
            full_name,
            alias: None,
        }
    }

    /// A bare, unqualified table.
    pub fn bare(table: impl Into<String>) -> Self {
        Self::new(None::<String>, None::<String>, table)
    }

    /// Attach a query alias.
    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    /// Build from already-unquoted name segments.
    ///
    /// One segment is a bare table, two are `schema.table`, three are
    /// `database.schema.table`. Anything else keeps the dot-joined text as the
    /// table name so that extraction never fails on unusual identifiers.
    pub fn from_parts(parts: &[String]) -> Self {
        let joined = parts.join(".");
        let segments: Vec<&str> = parts
            .iter()
            .map(|p| p.as_str())
            .filter(|p| !p.is_empty() && *p != "null")
            .collect();
        match segments.as_slice() {
            [table] => Self::bare(*table),
            [schema, table] => Self::new(None::<String>, Some(*schema), *table),
            [database, schema, table] => Self::new(Some(*database), Some(*schema), *table),
            _ => Self::fallback(joined),
        }
    }

    /// Build from a parsed object name such as `db.schema.table`.
    pub fn from_object_name(name: &ObjectName) -> Self {
        let parts: Vec<String> = name
            .0
            .iter()
            .map(|part| match part {
                ObjectNamePart::Identifier(ident) => ident.value.clone(),
                other => other.to_string(),
            })
            .collect();
        Self::from_parts(&parts)
    }

    fn fallback(raw: String) -> Self {
        Self {
            database: None,
            schema: None,
            table: raw.clone(),
            full_name: raw,
            alias: None,
        }
    }

    /// Case-insensitive `database.schema.table` key with missing parts left empty.
    pub fn identity_key(&self) -> String {
        format!(
            "{}.{}.{}",
            self.database.as_deref().unwrap_or("").to_lowercase(),
            self.schema.as_deref().unwrap_or("").to_lowercase(),
            self.table.to_lowercase()
        )
    }
}

impl std::fmt::Display for ParsedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Parse a textual table reference into its components.
///
/// Handles `table`, `schema.table`, `database.schema.table`, quoted forms
/// (`"db"."schema"."t"`, `` `p`.d.t ``, `[dbo].[t]`) and the
/// `type::database::table` layout some table-list producers emit. Never fails:
/// unrecognised shapes become a table named after the cleaned input.
pub fn parse_table_reference(reference: &str) -> ParsedTable {
    let mut clean: String = reference
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string();

    if clean.contains("::") {
        let mut parts: Vec<&str> = clean.split("::").collect();
        if parts.len() >= 2 && TYPE_PREFIXES.contains(&parts[0]) {
            parts.remove(0);
        }
        clean = parts.join(".");
    }

    let parts: Vec<String> = clean.split('.').map(str::to_string).collect();
    let segments = parts
        .iter()
        .filter(|p| !p.is_empty() && p.as_str() != "null")
        .count();
    if segments == 0 || segments > 3 {
        return ParsedTable::fallback(clean);
    }
    ParsedTable::from_parts(&parts)
}

/// Lower-cased dot-join of whichever identity parts are present.
pub fn normalize_table_identifier(table: &ParsedTable) -> String {
    [
        table.database.as_deref(),
        table.schema.as_deref(),
        Some(table.table.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::to_lowercase)
    .collect::<Vec<_>>()
    .join(".")
}

/// Check whether a table referenced by a query is covered by a permission entry.
///
/// Case-insensitive. The bare table names must be equal. A schema on the
/// permission side must be present and equal on the query side. A database
/// on the permission side must be equal when the query names one. Extra
/// qualifiers on the query side never block a match.
pub fn tables_match(query_table: &ParsedTable, permission_table: &ParsedTable) -> bool {
    if !query_table.table.eq_ignore_ascii_case(&permission_table.table) {
        return false;
    }

    match (&permission_table.schema, &query_table.schema) {
        (Some(wanted), Some(given)) if !wanted.eq_ignore_ascii_case(given) => return false,
        (Some(_), None) => return false,
        _ => {}
    }

    if let (Some(wanted), Some(given)) = (&permission_table.database, &query_table.database) {
        if !wanted.eq_ignore_ascii_case(given) {
            return false;
        }
    }

    true
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
