//! Listing configuration files.
//!
//! A config file carries the expand lists for a tree build as query strings:
//!
//! ```yaml
//! expand:
//!   - webgpu:api,operation:buffers,map:*
//! fully_expand:
//!   - webgpu:shader,*
//! ```
//!
//! Files ending in `.json` are read as JSON, anything else as YAML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::Result;
use crate::query::parser::parse_query;
use crate::query::TestQuery;
use crate::tree::LoadOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    /// Queries passed as `subqueries_to_expand`.
    pub expand: Vec<String>,
    /// Queries passed as `fully_expand_subtrees`.
    pub fully_expand: Vec<String>,
}

impl ListConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(serde_yaml::from_str(&text)?)
        }
    }

    /// Appends command-line entries after the file's own.
    pub fn extend(&mut self, expand: &[String], fully_expand: &[String]) {
        self.expand.extend_from_slice(expand);
        self.fully_expand.extend_from_slice(fully_expand);
    }

    /// Parses every entry; the first malformed query fails the whole config.
    pub fn into_load_options(self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            subqueries_to_expand: parse_all(&self.expand)?,
            fully_expand_subtrees: parse_all(&self.fully_expand)?,
        })
    }
}

fn parse_all(queries: &[String]) -> Result<Vec<TestQuery>> {
    queries.iter().map(|q| parse_query(q)).collect()
}
