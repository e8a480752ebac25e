//! Defines the command-line arguments and subcommands for the suitetree CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "suitetree",
    version,
    about = "Query, list, and inspect hierarchical test suites."
)]
pub struct SuiteTreeArgs {
    /// Directory holding one subdirectory per suite.
    #[arg(long, global = true, default_value = "suites")]
    pub root: PathBuf,

    #[command(flatten)]
    pub expansion: ExpansionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Expand lists, from a config file and/or repeated flags.
#[derive(Debug, Args)]
pub struct ExpansionArgs {
    /// YAML or JSON file with `expand` and `fully_expand` query lists.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// A query that must appear expanded in the output (repeatable).
    #[arg(long = "expand", global = true, value_name = "QUERY")]
    pub expand: Vec<String>,

    /// Never collapse anything overlapping this query (repeatable).
    #[arg(long = "fully-expand", global = true, value_name = "QUERY")]
    pub fully_expand: Vec<String>,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the collapsed query list covering every matched case.
    List {
        /// The query to load, e.g. `webgpu:api,*`.
        query: String,
    },
    /// Print the whole tree, one node per line.
    Tree {
        /// The query to load.
        query: String,
        /// Merge single-child chains that cross a query level.
        #[arg(long)]
        dissolve: bool,
    },
    /// Print every matched case and run it.
    Leaves {
        /// The query to load.
        query: String,
    },
}
