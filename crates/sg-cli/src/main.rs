//! sqlgate CLI - inspect SQL and check it against dataset permissions

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{check, columns, datasets, matching, read_only, tables, wildcards};

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Tables(args) => tables::execute(args, &cli.global),
        cli::Commands::Columns(args) => columns::execute(args, &cli.global),
        cli::Commands::ReadOnly(args) => read_only::execute(args, &cli.global),
        cli::Commands::Wildcards(args) => wildcards::execute(args, &cli.global),
        cli::Commands::Match(args) => matching::execute(args, &cli.global),
        cli::Commands::Datasets(args) => datasets::execute(args, &cli.global),
        cli::Commands::Check(args) => check::execute(args, &cli.global),
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::ExitCode::from(code.0),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::FAILURE
            }
        },
    }
}
