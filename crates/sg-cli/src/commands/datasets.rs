//! Datasets command implementation

use anyhow::{Context, Result};
use sg_core::{extract_tables_from_yml, DatasetCatalog, ParsedDataset};
use sg_sql::ParsedTable;

use crate::cli::{DatasetsArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{load_config, print_json};

/// Execute the datasets command
pub(crate) fn execute(args: &DatasetsArgs, global: &GlobalArgs) -> Result<()> {
    if args.files.is_empty() {
        let config = load_config(global)?;
        let catalog = DatasetCatalog::load(&global.project_dir, &config)
            .context("Failed to load datasets")?;
        if global.verbose {
            eprintln!(
                "[verbose] Loaded {} dataset(s) from {}",
                catalog.len(),
                global.project_dir.display()
            );
        }
        return print_datasets(catalog.datasets(), args.output);
    }

    let mut documents = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
        documents.push(content);
    }

    if args.tables_only {
        let tables: Vec<ParsedTable> = documents
            .iter()
            .flat_map(|doc| extract_tables_from_yml(doc))
            .collect();
        return print_tables(&tables, args.output);
    }

    let catalog = DatasetCatalog::from_documents(documents.iter().map(String::as_str));
    print_datasets(catalog.datasets(), args.output)
}

fn print_datasets(datasets: &[ParsedDataset], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(datasets)?,
        OutputFormat::Text => {
            for ds in datasets {
                if ds.allowed_columns.is_empty() {
                    println!("{}: (no columns)", ds.table.full_name);
                } else {
                    let columns: Vec<&str> =
                        ds.allowed_columns.iter().map(String::as_str).collect();
                    println!("{}: {}", ds.table.full_name, columns.join(", "));
                }
            }
        }
    }
    Ok(())
}

fn print_tables(tables: &[ParsedTable], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(tables)?,
        OutputFormat::Text => {
            for table in tables {
                println!("{}", table.full_name);
            }
        }
    }
    Ok(())
}
