//! Dataset definitions
//!
//! A dataset document names a physical table and declares the columns
//! (dimensions and measures) a caller may read from it. Documents come in a
//! flat single-object form or as a `models:` list. Parsing is lenient: text
//! that is not a dataset definition yields nothing instead of an error, so
//! any YAML file can be probed.

use serde::{Deserialize, Serialize};
use sg_sql::{normalize_table_identifier, ParsedTable};
use std::collections::{BTreeSet, HashSet};

use crate::serde_helpers::{lenient_names, lenient_records, lenient_string};

/// A physical table plus the columns its dataset definition allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDataset {
    #[serde(flatten)]
    pub table: ParsedTable,
    /// Lower-cased column names from dimensions and measures
    pub allowed_columns: BTreeSet<String>,
}

impl ParsedDataset {
    /// Case-insensitive allow-list lookup. An empty allow-list permits nothing.
    pub fn permits_column(&self, column: &str) -> bool {
        self.allowed_columns.contains(&column.to_lowercase())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatasetRecord {
    #[serde(deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    schema: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    database: Option<String>,
    #[serde(deserialize_with = "lenient_names")]
    dimensions: Vec<String>,
    #[serde(deserialize_with = "lenient_names")]
    measures: Vec<String>,
    #[serde(deserialize_with = "lenient_records")]
    models: Option<Vec<DatasetRecord>>,
}

impl DatasetRecord {
    fn table(&self) -> Option<ParsedTable> {
        let name = self.name.as_deref()?;
        Some(ParsedTable::new(
            self.database.as_deref(),
            self.schema.as_deref(),
            name,
        ))
    }

    /// Tables need a name and at least one qualifier.
    fn qualified_table(&self) -> Option<ParsedTable> {
        if self.schema.is_none() && self.database.is_none() {
            return None;
        }
        self.table()
    }

    fn dataset(&self) -> Option<ParsedDataset> {
        let table = self.table()?;
        let allowed_columns = self
            .dimensions
            .iter()
            .chain(&self.measures)
            .cloned()
            .collect();
        Some(ParsedDataset {
            table,
            allowed_columns,
        })
    }

    fn model_records(&self) -> &[DatasetRecord] {
        self.models.as_deref().unwrap_or_default()
    }
}

fn parse_document(doc: &str, purpose: &str) -> Option<DatasetRecord> {
    if doc.trim().is_empty() {
        return None;
    }
    let parsed = serde_yaml::from_str::<serde_yaml::Value>(doc).and_then(|value| match value {
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value::<DatasetRecord>(value).map(Some),
        _ => Ok(None),
    });
    match parsed {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            log::warn!("YAML content for {} is not a mapping", purpose);
            None
        }
        Err(e) => {
            log::warn!("Failed to parse YAML content for {}: {}", purpose, e);
            None
        }
    }
}

/// Keep the first item per normalized table identity.
fn dedup_by_identity<T>(items: impl IntoIterator<Item = T>, table: impl Fn(&T) -> &ParsedTable) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(normalize_table_identifier(table(item))))
        .collect()
}

/// Extract the physical tables a dataset document describes.
///
/// A record counts only if it has a `name` and a `schema` or `database`. The
/// flat form is read only when the document has no `models` key.
pub fn extract_tables_from_yml(doc: &str) -> Vec<ParsedTable> {
    let Some(record) = parse_document(doc, "table extraction") else {
        return Vec::new();
    };

    let flat = match record.models {
        None => record.qualified_table(),
        Some(_) => None,
    };
    let models = record
        .model_records()
        .iter()
        .filter_map(DatasetRecord::qualified_table);

    dedup_by_identity(flat.into_iter().chain(models), |t| t)
}

/// Extract datasets, with their allowed columns, from a dataset document.
///
/// Both the flat record and every `models` entry that has a `name`
/// contribute.
pub fn extract_datasets_from_yml(doc: &str) -> Vec<ParsedDataset> {
    let Some(record) = parse_document(doc, "dataset extraction") else {
        return Vec::new();
    };

    let flat = record.dataset();
    let models = record.model_records().iter().filter_map(DatasetRecord::dataset);

    dedup_by_identity(flat.into_iter().chain(models), |d| &d.table)
}

#[cfg(test)]
#[path = "dataset_test.rs"]
mod tests;
