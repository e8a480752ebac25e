//! The contract between the tree builder and whatever discovers test files.
//!
//! A loader lists a suite's entries (README descriptions and spec files) and
//! imports one spec file at a time. Importing yields the file's description
//! and a lazy, single-pass sequence of cases. Each case carries its id (test
//! path + params) and the function that runs it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::params::ParamsBuilder;
use crate::query::params::TestParams;
use crate::query::TestQuery;

/// One entry of a suite listing, tagged with its file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    /// A description document for the directory at `file_path`
    /// (empty path = the suite itself).
    Readme {
        file_path: Vec<String>,
        readme: String,
    },
    /// A spec file. `file_path` is never empty.
    Spec { file_path: Vec<String> },
}

impl ListingEntry {
    pub fn file_path(&self) -> &[String] {
        match self {
            Self::Readme { file_path, .. } | Self::Spec { file_path } => file_path,
        }
    }
}

/// The outcome of running one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    Pass,
    Fail { reason: String },
    Skip { reason: String },
}

/// Runs one concrete case. Recording logs and results is up to the implementor.
pub trait RunCase: Send + Sync {
    fn run(&self, query: &TestQuery) -> CaseStatus;
}

impl<F> RunCase for F
where
    F: Fn(&TestQuery) -> CaseStatus + Send + Sync,
{
    fn run(&self, query: &TestQuery) -> CaseStatus {
        self(query)
    }
}

/// Identifies a case within its spec file.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseId {
    pub test_path: Vec<String>,
    /// Full parameter set, private params included.
    pub params: TestParams,
}

#[derive(Clone)]
pub struct Case {
    pub id: CaseId,
    pub run: Arc<dyn RunCase>,
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Lazy sequence of a spec file's cases. Consumed exactly once.
pub type CaseIter = Box<dyn Iterator<Item = Result<Case>> + Send>;

/// An imported spec file.
pub struct SpecFile {
    pub description: String,
    pub cases: CaseIter,
}

impl fmt::Debug for SpecFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecFile")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Source of suite listings and spec files.
#[async_trait]
pub trait TestFileLoader: Send + Sync {
    /// Lists every entry of `suite`, in the order they should be visited.
    async fn listing(&self, suite: &str) -> Result<Vec<ListingEntry>>;

    /// Imports the spec file at `file_path` within `suite`.
    async fn import_spec_file(&self, suite: &str, file_path: &[String]) -> Result<SpecFile>;
}

/// One case per parameter set of `params`, all bound to the same test and runner.
pub fn cases_for_test(
    test_path: Vec<String>,
    params: &ParamsBuilder,
    run: Arc<dyn RunCase>,
) -> CaseIter {
    Box::new(params.iter().map(move |p| {
        Ok(Case {
            id: CaseId {
                test_path: test_path.clone(),
                params: p?,
            },
            run: Arc::clone(&run),
        })
    }))
}
