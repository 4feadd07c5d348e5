//! Dataset catalog loaded from dataset directories

use crate::config::Config;
use crate::dataset::{extract_datasets_from_yml, ParsedDataset};
use crate::error::{CoreError, CoreResult};
use sg_sql::{normalize_table_identifier, tables_match, ParsedTable};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Every dataset a project declares, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    datasets: Vec<ParsedDataset>,
}

impl DatasetCatalog {
    /// Build a catalog, keeping the first dataset per table identity
    pub fn new(datasets: impl IntoIterator<Item = ParsedDataset>) -> Self {
        let mut seen = HashSet::new();
        let datasets = datasets
            .into_iter()
            .filter(|ds| {
                let first = seen.insert(normalize_table_identifier(&ds.table));
                if !first {
                    log::warn!(
                        "Duplicate dataset for table {} ignored, keeping the first definition",
                        ds.table.full_name
                    );
                }
                first
            })
            .collect();
        Self { datasets }
    }

    /// Build a catalog from in-memory dataset documents
    pub fn from_documents<'a>(docs: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(docs.into_iter().flat_map(extract_datasets_from_yml))
    }

    /// Load every `*.yml`/`*.yaml` file under `dir`, recursively.
    ///
    /// Files are read in path order. Unreadable files and documents that are
    /// not dataset definitions are skipped.
    pub fn load_dir(dir: &Path) -> CoreResult<Self> {
        Self::load_dirs(std::slice::from_ref(&dir.to_path_buf()))
    }

    /// Load the dataset directories named in the config, relative to `root`
    pub fn load(root: &Path, config: &Config) -> CoreResult<Self> {
        Self::load_dirs(&config.dataset_paths_absolute(root))
    }

    fn load_dirs(dirs: &[PathBuf]) -> CoreResult<Self> {
        let mut files = Vec::new();
        for dir in dirs {
            if !dir.is_dir() {
                return Err(CoreError::DatasetDirNotFound {
                    path: dir.display().to_string(),
                });
            }
            discover_yaml_files(dir, &mut files)?;
        }
        files.sort();

        let mut datasets = Vec::new();
        for path in &files {
            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Cannot read {}: {}", path.display(), e);
                    continue;
                }
            };
            let found = extract_datasets_from_yml(&content);
            log::debug!("{}: {} dataset(s)", path.display(), found.len());
            datasets.extend(found);
        }

        let catalog = Self::new(datasets);
        log::debug!(
            "Loaded {} dataset(s) from {} file(s)",
            catalog.len(),
            files.len()
        );
        Ok(catalog)
    }

    pub fn datasets(&self) -> &[ParsedDataset] {
        &self.datasets
    }

    /// First dataset whose table the query table matches
    pub fn find(&self, table: &ParsedTable) -> Option<&ParsedDataset> {
        self.datasets
            .iter()
            .find(|ds| tables_match(table, &ds.table))
    }

    /// All datasets the query table matches. Several can match when they differ
    /// only in qualifiers the query leaves out.
    pub fn find_all<'a>(
        &'a self,
        table: &'a ParsedTable,
    ) -> impl Iterator<Item = &'a ParsedDataset> + 'a {
        self.datasets
            .iter()
            .filter(move |ds| tables_match(table, &ds.table))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

fn discover_yaml_files(dir: &Path, files: &mut Vec<PathBuf>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            discover_yaml_files(&path, files)?;
        } else if path
            .extension()
            .is_some_and(|e| e == "yml" || e == "yaml")
        {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
