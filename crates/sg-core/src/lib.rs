//! sg-core - Core library for sqlgate
//!
//! This crate loads the engine configuration and the dataset definitions a
//! project declares, and turns a query analysis from `sg-sql` into an
//! access decision.

pub mod access;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub(crate) mod serde_helpers;

pub use access::{AccessChecker, AccessReport, Violation};
pub use catalog::DatasetCatalog;
pub use config::{Config, CONFIG_FILE_NAMES};
pub use dataset::{extract_datasets_from_yml, extract_tables_from_yml, ParsedDataset};
pub use error::{CoreError, CoreResult};
