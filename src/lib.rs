//! Hierarchical test suites addressed by queries.
//!
//! A suite is a tree of spec files, each holding tests, each holding cases
//! generated from parameter combinators. [`TestQuery`] names any subtree of
//! that hierarchy; [`load_tree_for_query`] builds the [`TestTree`] of every
//! case a query selects.

pub use crate::errors::{Result, SuiteTreeError};
pub use crate::query::compare::{compare_queries, Ordering};
pub use crate::query::parser::parse_query;
pub use crate::query::{QueryLevel, TestQuery};
pub use crate::tree::{load_tree_for_query, LoadOptions, TestTree};

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_loader;
pub mod loader;
pub mod params;
pub mod query;
pub mod tree;
