//! CLI command implementations

pub(crate) mod check;
pub(crate) mod columns;
pub(crate) mod common;
pub(crate) mod datasets;
pub(crate) mod matching;
pub(crate) mod read_only;
pub(crate) mod tables;
pub(crate) mod wildcards;
