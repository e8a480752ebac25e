//! The suitetree Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, ExpansionArgs, SuiteTreeArgs};
use crate::config::ListConfig;
use crate::errors::{print_error, Result};
use crate::fs_loader::DirectoryLoader;
use crate::query::parser::parse_query;
use crate::tree::{load_tree_for_query, LoadOptions, TestTree};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = SuiteTreeArgs::parse();

    if let Err(e) = execute(args) {
        print_error(e);
        process::exit(1);
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute(args: SuiteTreeArgs) -> Result<()> {
    let options = load_options(&args.expansion)?;
    let loader = DirectoryLoader::new(&args.root);
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;

    // Dispatch to the appropriate subcommand handler.
    match args.command {
        Command::List { query } => {
            let tree = runtime.block_on(load(&loader, &query, &options))?;
            output::print_queries(tree.iterate_collapsed_queries())?;
        }
        Command::Tree { query, dissolve } => {
            let mut tree = runtime.block_on(load(&loader, &query, &options))?;
            if dissolve {
                tree.dissolve_level_boundaries();
            }
            output::print_tree(&tree)?;
        }
        Command::Leaves { query } => {
            let tree = runtime.block_on(load(&loader, &query, &options))?;
            output::print_leaves(&tree)?;
        }
    }
    Ok(())
}

fn load_options(expansion: &ExpansionArgs) -> Result<LoadOptions> {
    let mut config = match &expansion.config {
        Some(path) => ListConfig::from_path(path)?,
        None => ListConfig::default(),
    };
    config.extend(&expansion.expand, &expansion.fully_expand);
    config.into_load_options()
}

async fn load(loader: &DirectoryLoader, query: &str, options: &LoadOptions) -> Result<TestTree> {
    let query = parse_query(query)?;
    load_tree_for_query(loader, &query, options).await
}
