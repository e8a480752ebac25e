//! Shared fixtures for integration tests: an in-memory loader and a small
//! suite used by most tree tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use suitetree::loader::{
    cases_for_test, CaseIter, CaseStatus, ListingEntry, RunCase, SpecFile, TestFileLoader,
};
use suitetree::params::{combine, enumerate, unit, ParamsBuilder};
use suitetree::query::TestQuery;
use suitetree::{parse_query, Result, SuiteTreeError};

#[derive(Clone)]
struct MemoryFile {
    description: String,
    tests: Vec<(Vec<String>, ParamsBuilder)>,
}

/// A loader over a fixed listing. Counts how many spec files were imported.
#[derive(Default)]
pub struct MemoryLoader {
    entries: Vec<ListingEntry>,
    files: HashMap<Vec<String>, MemoryFile>,
    imports: AtomicUsize,
}

fn parts(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(',').map(str::to_string).collect()
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` is comma-separated; empty means the suite itself.
    pub fn readme(mut self, path: &str, text: &str) -> Self {
        self.entries.push(ListingEntry::Readme {
            file_path: parts(path),
            readme: text.to_string(),
        });
        self
    }

    pub fn file(mut self, path: &str, description: &str, tests: Vec<(&str, ParamsBuilder)>) -> Self {
        let file_path = parts(path);
        self.entries.push(ListingEntry::Spec {
            file_path: file_path.clone(),
        });
        self.files.insert(
            file_path,
            MemoryFile {
                description: description.to_string(),
                tests: tests
                    .into_iter()
                    .map(|(test, params)| (parts(test), params))
                    .collect(),
            },
        );
        self
    }

    pub fn import_count(&self) -> usize {
        self.imports.load(AtomicOrdering::SeqCst)
    }
}

fn passing_runner() -> Arc<dyn RunCase> {
    Arc::new(|_: &TestQuery| CaseStatus::Pass)
}

#[async_trait]
impl TestFileLoader for MemoryLoader {
    async fn listing(&self, _suite: &str) -> Result<Vec<ListingEntry>> {
        Ok(self.entries.clone())
    }

    async fn import_spec_file(&self, suite: &str, file_path: &[String]) -> Result<SpecFile> {
        self.imports.fetch_add(1, AtomicOrdering::SeqCst);
        let file = self
            .files
            .get(file_path)
            .cloned()
            .ok_or_else(|| SuiteTreeError::loader(suite, format!("no file {file_path:?}")))?;
        let cases: CaseIter = Box::new(
            file.tests
                .into_iter()
                .flat_map(|(test, params)| cases_for_test(test, &params, passing_runner())),
        );
        Ok(SpecFile {
            description: file.description,
            cases,
        })
    }
}

/// Suite `s`:
///
/// ```text
/// README              "Suite s"
/// a,b   "File ab"     c   x in [1, 2]
///                     d,e (no params)
/// a,f   "File af"     g   x in [1] * y in ["p", "q"]
/// h     "TODO: write" (no cases)
/// ```
pub fn sample_suite() -> MemoryLoader {
    MemoryLoader::new()
        .readme("", "Suite s")
        .file(
            "a,b",
            "File ab",
            vec![("c", enumerate("x", [1, 2])), ("d,e", unit())],
        )
        .file(
            "a,f",
            "File af",
            vec![(
                "g",
                combine([enumerate("x", [1]), enumerate("y", ["p", "q"])]),
            )],
        )
        .file("h", "TODO: write", vec![])
}

pub fn q(text: &str) -> TestQuery {
    parse_query(text).unwrap()
}

pub fn strings<'a>(queries: impl Iterator<Item = &'a TestQuery>) -> Vec<String> {
    queries.map(ToString::to_string).collect()
}
